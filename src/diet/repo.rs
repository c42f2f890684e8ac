use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use crate::ownership::Owned;
use crate::status::EntryStatus;

/// One diet entry per user per date, aggregating detail rows and images.
#[derive(Debug, Clone, FromRow)]
pub struct Diet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub diet_date: Date,
}

impl Owned for Diet {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DietDetail {
    pub id: Uuid,
    pub diet_id: Uuid,
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

pub struct NewDietDetail<'a> {
    pub food_name: &'a str,
    pub carbohydrate: f64,
    pub protein: f64,
    pub unsaturated_fat: f64,
    pub trans_fat: f64,
    pub saturated_fat: f64,
    pub kcal: f64,
    pub meal_time: &'a str,
}

const DETAIL_COLUMNS: &str = "id, diet_id, food_name, carbohydrate, protein, unsaturated_fat, \
                              trans_fat, saturated_fat, kcal, meal_time, status";

pub async fn insert_diet(db: &PgPool, user_id: Uuid, diet_date: Date) -> sqlx::Result<Diet> {
    let row = sqlx::query_as::<_, Diet>(
        r#"
        INSERT INTO diets (user_id, diet_date)
        VALUES ($1, $2)
        RETURNING id, user_id, diet_date
        "#,
    )
    .bind(user_id)
    .bind(diet_date)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn insert_detail_tx(
    tx: &mut Transaction<'_, Postgres>,
    diet_id: Uuid,
    new: &NewDietDetail<'_>,
) -> sqlx::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO diet_details
            (diet_id, food_name, carbohydrate, protein, unsaturated_fat,
             trans_fat, saturated_fat, kcal, meal_time, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'SCHEDULED')
        RETURNING id
        "#,
    )
    .bind(diet_id)
    .bind(new.food_name)
    .bind(new.carbohydrate)
    .bind(new.protein)
    .bind(new.unsaturated_fat)
    .bind(new.trans_fat)
    .bind(new.saturated_fat)
    .bind(new.kcal)
    .bind(new.meal_time)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Diet>> {
    let row = sqlx::query_as::<_, Diet>("SELECT id, user_id, diet_date FROM diets WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn find_by_owner_between(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> sqlx::Result<Vec<Diet>> {
    let rows = sqlx::query_as::<_, Diet>(
        r#"
        SELECT id, user_id, diet_date
        FROM diets
        WHERE user_id = $1 AND diet_date BETWEEN $2 AND $3
        ORDER BY diet_date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn details_for(db: &PgPool, diet_id: Uuid) -> sqlx::Result<Vec<DietDetail>> {
    let rows = sqlx::query_as::<_, DietDetail>(&format!(
        "SELECT {DETAIL_COLUMNS} FROM diet_details WHERE diet_id = $1 ORDER BY meal_time, food_name"
    ))
    .bind(diet_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_detail(db: &PgPool, id: Uuid) -> sqlx::Result<Option<DietDetail>> {
    let row = sqlx::query_as::<_, DietDetail>(&format!(
        "SELECT {DETAIL_COLUMNS} FROM diet_details WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn set_detail_status(db: &PgPool, id: Uuid, status: EntryStatus) -> sqlx::Result<()> {
    sqlx::query("UPDATE diet_details SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_diet_date(db: &PgPool, id: Uuid, diet_date: Date) -> sqlx::Result<()> {
    sqlx::query("UPDATE diets SET diet_date = $2 WHERE id = $1")
        .bind(id)
        .bind(diet_date)
        .execute(db)
        .await?;
    Ok(())
}

/// Update is a full replace of the detail rows.
pub async fn delete_details_tx(
    tx: &mut Transaction<'_, Postgres>,
    diet_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM diet_details WHERE diet_id = $1")
        .bind(diet_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Detail and image rows go with the parent via FK cascade.
pub async fn delete_diet(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM diets WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Sweep candidates: diets dated strictly before the given day.
pub async fn diets_before(db: &PgPool, day: Date) -> sqlx::Result<Vec<Uuid>> {
    let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM diets WHERE diet_date < $1")
        .bind(day)
        .fetch_all(db)
        .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

pub async fn scheduled_details(db: &PgPool, diet_id: Uuid) -> sqlx::Result<Vec<Uuid>> {
    let ids: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM diet_details WHERE diet_id = $1 AND status = 'SCHEDULED'",
    )
    .bind(diet_id)
    .fetch_all(db)
    .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Conditional demotion so a racing manual completion is never clobbered.
pub async fn demote_detail_if_scheduled(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE diet_details SET status = 'INCOMPLETE' WHERE id = $1 AND status = 'SCHEDULED'",
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
