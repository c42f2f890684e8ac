use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diet::repo::{Diet, DietDetail};
use crate::status::EntryStatus;

#[derive(Debug, Deserialize)]
pub struct DietDetailRequest {
    pub food_name: String,
    pub carbohydrate: f64,
    pub protein: f64,
    pub unsaturated_fat: f64,
    pub trans_fat: f64,
    pub saturated_fat: f64,
    pub kcal: f64,
    pub meal_time: String,
}

/// JSON `meta` part of the multipart register request.
#[derive(Debug, Deserialize)]
pub struct RegisterDietRequest {
    /// `YYYY-MM-DD`
    pub diet_date: String,
    pub details: Vec<DietDetailRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDietRequest {
    pub diet_date: String,
    pub details: Vec<DietDetailRequest>,
}

#[derive(Debug, Serialize)]
pub struct DietDetailResponse {
    pub id: Uuid,
    pub food_name: String,
    pub carbohydrate: f64,
    pub protein: f64,
    pub unsaturated_fat: f64,
    pub trans_fat: f64,
    pub saturated_fat: f64,
    pub kcal: f64,
    pub meal_time: String,
    pub status: EntryStatus,
}

impl From<DietDetail> for DietDetailResponse {
    fn from(d: DietDetail) -> Self {
        Self {
            id: d.id,
            food_name: d.food_name,
            carbohydrate: d.carbohydrate,
            protein: d.protein,
            unsaturated_fat: d.unsaturated_fat,
            trans_fat: d.trans_fat,
            saturated_fat: d.saturated_fat,
            kcal: d.kcal,
            meal_time: d.meal_time,
            status: d.status,
        }
    }
}

/// Composite grouping of one diet entry with its detail rows and image urls.
#[derive(Debug, Serialize)]
pub struct DietComposite {
    pub id: Uuid,
    pub diet_date: String,
    pub details: Vec<DietDetailResponse>,
    pub images: Vec<String>,
}

impl DietComposite {
    pub fn assemble(diet: Diet, details: Vec<DietDetail>, images: Vec<String>) -> Self {
        Self {
            id: diet.id,
            diet_date: diet.diet_date.to_string(),
            details: details.into_iter().map(DietDetailResponse::from).collect(),
            images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterDietResponse {
    pub id: Uuid,
    pub diet_date: String,
    pub detail_ids: Vec<Uuid>,
    pub image_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn detail(diet_id: Uuid, name: &str) -> DietDetail {
        DietDetail {
            id: Uuid::new_v4(),
            diet_id,
            food_name: name.into(),
            carbohydrate: 40.0,
            protein: 20.0,
            unsaturated_fat: 3.0,
            trans_fat: 0.0,
            saturated_fat: 1.5,
            kcal: 320.0,
            meal_time: "breakfast".into(),
            status: EntryStatus::Scheduled,
        }
    }

    #[test]
    fn assemble_groups_details_and_images_under_the_parent() {
        let diet = Diet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            diet_date: date!(2024 - 05 - 17),
        };
        let details = vec![detail(diet.id, "oatmeal"), detail(diet.id, "eggs")];
        let images = vec!["https://fake.local/a.jpg".to_string()];

        let composite = DietComposite::assemble(diet.clone(), details, images);
        assert_eq!(composite.id, diet.id);
        assert_eq!(composite.diet_date, "2024-05-17");
        assert_eq!(composite.details.len(), 2);
        assert_eq!(composite.details[0].food_name, "oatmeal");
        assert_eq!(composite.details[0].status, EntryStatus::Scheduled);
        assert_eq!(composite.images.len(), 1);
    }
}
