use std::collections::BTreeMap;

use sqlx::PgPool;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ensure_found, AppError};
use crate::exercise::dto::{ExerciseRequest, ExerciseResponse};
use crate::exercise::repo::{self, NewExercise};
use crate::members::repo::Member;
use crate::ownership;
use crate::window::{parse_date_time, Granularity, Window};

pub async fn register(
    db: &PgPool,
    user_id: Uuid,
    requests: &[ExerciseRequest],
) -> Result<Vec<ExerciseResponse>, AppError> {
    if requests.is_empty() {
        return Err(AppError::InvalidInput("no exercises to register".into()));
    }

    let mut created = Vec::with_capacity(requests.len());
    for req in requests {
        let exercise_at = parse_date_time(&req.exercise_at)?;
        let row = repo::insert(
            db,
            user_id,
            NewExercise {
                sports: &req.sports,
                weight: req.weight,
                reps: req.reps,
                break_time: req.break_time,
                exercise_at,
            },
        )
        .await?;
        created.push(row.into());
    }
    info!(user_id = %user_id, count = created.len(), "exercises registered");
    Ok(created)
}

/// Window-scoped retrieval. An empty result is `NotFound`, not an empty list.
pub async fn my_exercises(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    granularity: Granularity,
) -> Result<Vec<ExerciseResponse>, AppError> {
    search(db, user_id, Window::compute(date, granularity)).await
}

async fn search(
    db: &PgPool,
    user_id: Uuid,
    window: Window,
) -> Result<Vec<ExerciseResponse>, AppError> {
    let (start, end) = window.datetime_bounds();
    let rows = repo::find_by_owner_between(db, user_id, start, end).await?;
    let rows = ensure_found(rows, "exercise")?;
    Ok(rows.into_iter().map(ExerciseResponse::from).collect())
}

async fn get_owned(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<repo::Exercise, AppError> {
    let exercise = repo::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("exercise not found".into()))?;
    ownership::authorize(&exercise, user_id)?;
    Ok(exercise)
}

pub async fn update_exercise(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    req: &ExerciseRequest,
) -> Result<ExerciseResponse, AppError> {
    get_owned(db, user_id, id).await?;
    let exercise_at = parse_date_time(&req.exercise_at)?;
    let row = repo::update(
        db,
        id,
        NewExercise {
            sports: &req.sports,
            weight: req.weight,
            reps: req.reps,
            break_time: req.break_time,
            exercise_at,
        },
    )
    .await?;
    Ok(row.into())
}

pub async fn delete_exercise(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    get_owned(db, user_id, id).await?;
    repo::delete(db, id).await?;
    Ok(())
}

/// Explicit "mark success". Allowed from `Incomplete` as a manual override;
/// a second completion is a no-op.
pub async fn mark_complete(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<ExerciseResponse, AppError> {
    let mut exercise = get_owned(db, user_id, id).await?;
    let next = exercise.status.mark_complete();
    if next != exercise.status {
        repo::set_status(db, id, next).await?;
        exercise.status = next;
    }
    Ok(exercise.into())
}

/// Today's exercises of every PUBLIC member, keyed by nickname. Members with
/// no entries are skipped, and a failure fetching one member's data is logged
/// and skipped rather than aborting the whole aggregation.
pub async fn all_public_today(
    db: &PgPool,
    today: Date,
) -> Result<BTreeMap<String, Vec<ExerciseResponse>>, AppError> {
    let members = Member::find_public(db).await?;
    if members.is_empty() {
        return Err(AppError::NotFound("no public members".into()));
    }

    let window = Window::compute(today, Granularity::Day);
    let mut out = BTreeMap::new();
    for member in members {
        match search(db, member.id, window).await {
            Ok(rows) => {
                out.insert(member.nickname, rows);
            }
            Err(AppError::NotFound(_)) => continue,
            Err(e) => {
                warn!(member_id = %member.id, error = %e, "skipping member in public exercise aggregate");
                continue;
            }
        }
    }
    Ok(out)
}
