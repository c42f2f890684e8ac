use std::collections::BTreeMap;

use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use crate::diet::dto::{DietComposite, RegisterDietRequest, RegisterDietResponse, UpdateDietRequest};
use crate::diet::repo::{self, Diet, NewDietDetail};
use crate::error::{ensure_found, AppError};
use crate::images::services::{self as images, UploadItem};
use crate::images::repo as images_repo;
use crate::members::repo::Member;
use crate::ownership;
use crate::state::AppState;
use crate::window::{parse_date, Granularity, Window};

/// Register one diet entry for a date with its detail rows and image files.
pub async fn register(
    st: &AppState,
    user_id: Uuid,
    meta: RegisterDietRequest,
    files: Vec<UploadItem>,
) -> Result<RegisterDietResponse, AppError> {
    let diet_date = parse_date(&meta.diet_date)?;
    if meta.details.is_empty() && files.is_empty() {
        return Err(AppError::InvalidInput(
            "a diet entry needs at least one detail or image".into(),
        ));
    }

    let diet = repo::insert_diet(&st.db, user_id, diet_date).await?;

    let mut tx = st.db.begin().await?;
    let mut detail_ids = Vec::with_capacity(meta.details.len());
    for d in &meta.details {
        let id = repo::insert_detail_tx(
            &mut tx,
            diet.id,
            &NewDietDetail {
                food_name: &d.food_name,
                carbohydrate: d.carbohydrate,
                protein: d.protein,
                unsaturated_fat: d.unsaturated_fat,
                trans_fat: d.trans_fat,
                saturated_fat: d.saturated_fat,
                kcal: d.kcal,
                meal_time: &d.meal_time,
            },
        )
        .await?;
        detail_ids.push(id);
    }
    tx.commit().await?;

    let image_ids = images::upload_and_link_images(st, user_id, diet.id, files).await?;

    info!(user_id = %user_id, diet_id = %diet.id, details = detail_ids.len(),
          images = image_ids.len(), "diet registered");
    Ok(RegisterDietResponse {
        id: diet.id,
        diet_date: diet.diet_date.to_string(),
        detail_ids,
        image_ids,
    })
}

/// Window-scoped retrieval of composites. An empty result is `NotFound`.
pub async fn my_diets(
    st: &AppState,
    user_id: Uuid,
    date: Date,
    granularity: Granularity,
) -> Result<Vec<DietComposite>, AppError> {
    search(st, user_id, Window::compute(date, granularity)).await
}

async fn search(
    st: &AppState,
    user_id: Uuid,
    window: Window,
) -> Result<Vec<DietComposite>, AppError> {
    let diets = repo::find_by_owner_between(&st.db, user_id, window.start, window.end).await?;
    let diets = ensure_found(diets, "diet")?;

    let mut out = Vec::with_capacity(diets.len());
    for diet in diets {
        out.push(load_composite(st, diet).await?);
    }
    Ok(out)
}

async fn load_composite(st: &AppState, diet: Diet) -> Result<DietComposite, AppError> {
    let details = repo::details_for(&st.db, diet.id).await?;
    let images = images::presigned_urls(st, diet.id).await?;
    Ok(DietComposite::assemble(diet, details, images))
}

/// Composite for a single entry: detail rows and image urls grouped under the
/// parent.
pub async fn diet_detail(
    st: &AppState,
    user_id: Uuid,
    diet_id: Uuid,
) -> Result<DietComposite, AppError> {
    let diet = get_owned(st, user_id, diet_id).await?;
    load_composite(st, diet).await
}

async fn get_owned(st: &AppState, user_id: Uuid, diet_id: Uuid) -> Result<Diet, AppError> {
    let diet = repo::find_by_id(&st.db, diet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("diet not found".into()))?;
    ownership::authorize(&diet, user_id)?;
    Ok(diet)
}

/// Full replace: the existing detail rows are destroyed and recreated from
/// the request. Images are left untouched.
pub async fn update_diet(
    st: &AppState,
    user_id: Uuid,
    diet_id: Uuid,
    req: UpdateDietRequest,
) -> Result<DietComposite, AppError> {
    let diet = get_owned(st, user_id, diet_id).await?;
    let diet_date = parse_date(&req.diet_date)?;

    repo::update_diet_date(&st.db, diet.id, diet_date).await?;

    let mut tx = st.db.begin().await?;
    repo::delete_details_tx(&mut tx, diet.id).await?;
    for d in &req.details {
        repo::insert_detail_tx(
            &mut tx,
            diet.id,
            &NewDietDetail {
                food_name: &d.food_name,
                carbohydrate: d.carbohydrate,
                protein: d.protein,
                unsaturated_fat: d.unsaturated_fat,
                trans_fat: d.trans_fat,
                saturated_fat: d.saturated_fat,
                kcal: d.kcal,
                meal_time: &d.meal_time,
            },
        )
        .await?;
    }
    tx.commit().await?;

    let diet = repo::find_by_id(&st.db, diet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("diet not found".into()))?;
    load_composite(st, diet).await
}

/// Delete the entry with its details and images; stored objects are removed
/// best-effort after the rows are gone.
pub async fn delete_diet(st: &AppState, user_id: Uuid, diet_id: Uuid) -> Result<(), AppError> {
    let diet = get_owned(st, user_id, diet_id).await?;
    let keys = images_repo::keys_for_diet(&st.db, diet.id).await?;
    repo::delete_diet(&st.db, diet.id).await?;
    images::delete_objects_best_effort(st, &keys).await;
    info!(user_id = %user_id, diet_id = %diet_id, "diet deleted");
    Ok(())
}

/// Mark one detail row as eaten. Ownership is checked through the parent
/// diet; completing an `Incomplete` detail is an allowed manual override.
pub async fn mark_detail_complete(
    st: &AppState,
    user_id: Uuid,
    detail_id: Uuid,
) -> Result<DietComposite, AppError> {
    let detail = repo::find_detail(&st.db, detail_id)
        .await?
        .ok_or_else(|| AppError::NotFound("diet detail not found".into()))?;
    let diet = get_owned(st, user_id, detail.diet_id).await?;

    let next = detail.status.mark_complete();
    if next != detail.status {
        repo::set_detail_status(&st.db, detail.id, next).await?;
    }
    load_composite(st, diet).await
}

/// Today's diet composites of every PUBLIC member, keyed by nickname. Members
/// with no entries are skipped; a failure fetching one member's data is
/// logged and skipped rather than aborting the aggregation.
pub async fn all_public_today(
    st: &AppState,
    today: Date,
) -> Result<BTreeMap<String, Vec<DietComposite>>, AppError> {
    let members = Member::find_public(&st.db).await?;
    if members.is_empty() {
        return Err(AppError::NotFound("no public members".into()));
    }

    let window = Window::compute(today, Granularity::Day);
    let mut out = BTreeMap::new();
    for member in members {
        match search(st, member.id, window).await {
            Ok(composites) => {
                out.insert(member.nickname, composites);
            }
            Err(AppError::NotFound(_)) => continue,
            Err(e) => {
                warn!(member_id = %member.id, error = %e, "skipping member in public diet aggregate");
                continue;
            }
        }
    }
    Ok(out)
}
