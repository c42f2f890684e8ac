use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ownership::Owned;
use crate::status::EntryStatus;

#[derive(Debug, Clone, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sports: String,
    pub weight: i32,
    pub reps: i32,
    pub break_time: i32,
    pub exercise_at: OffsetDateTime,
    pub status: EntryStatus,
}

impl Owned for Exercise {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

const EXERCISE_COLUMNS: &str = "id, user_id, sports, weight, reps, break_time, exercise_at, status";

pub struct NewExercise<'a> {
    pub sports: &'a str,
    pub weight: i32,
    pub reps: i32,
    pub break_time: i32,
    pub exercise_at: OffsetDateTime,
}

pub async fn insert(db: &PgPool, user_id: Uuid, new: NewExercise<'_>) -> sqlx::Result<Exercise> {
    let row = sqlx::query_as::<_, Exercise>(&format!(
        r#"
        INSERT INTO exercises (user_id, sports, weight, reps, break_time, exercise_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'SCHEDULED')
        RETURNING {EXERCISE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(new.sports)
    .bind(new.weight)
    .bind(new.reps)
    .bind(new.break_time)
    .bind(new.exercise_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Exercise>> {
    let row = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_owner_between(
    db: &PgPool,
    user_id: Uuid,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> sqlx::Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, Exercise>(&format!(
        r#"
        SELECT {EXERCISE_COLUMNS}
        FROM exercises
        WHERE user_id = $1 AND exercise_at BETWEEN $2 AND $3
        ORDER BY exercise_at ASC
        "#
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Full field replace on update.
pub async fn update(db: &PgPool, id: Uuid, new: NewExercise<'_>) -> sqlx::Result<Exercise> {
    let row = sqlx::query_as::<_, Exercise>(&format!(
        r#"
        UPDATE exercises
        SET sports = $2, weight = $3, reps = $4, break_time = $5, exercise_at = $6
        WHERE id = $1
        RETURNING {EXERCISE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new.sports)
    .bind(new.weight)
    .bind(new.reps)
    .bind(new.break_time)
    .bind(new.exercise_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM exercises WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_status(db: &PgPool, id: Uuid, status: EntryStatus) -> sqlx::Result<()> {
    sqlx::query("UPDATE exercises SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}

/// Sweep candidates: strictly before `now` and still scheduled.
pub async fn overdue_scheduled(db: &PgPool, now: OffsetDateTime) -> sqlx::Result<Vec<Uuid>> {
    let ids: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM exercises WHERE exercise_at < $1 AND status = 'SCHEDULED'",
    )
    .bind(now)
    .fetch_all(db)
    .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Conditional demotion so a racing manual completion is never clobbered.
/// Returns whether a row was actually demoted.
pub async fn demote_if_scheduled(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE exercises SET status = 'INCOMPLETE' WHERE id = $1 AND status = 'SCHEDULED'",
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
