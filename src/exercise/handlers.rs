use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::collections::BTreeMap;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::ApiResult;
use crate::exercise::dto::{ExerciseRequest, ExerciseResponse};
use crate::exercise::services;
use crate::state::AppState;
use crate::window::{parse_date, WindowQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exercise", get(list).post(register))
        .route("/exercise/public/today", get(all_public_today))
        .route("/exercise/:id", put(update).delete(delete_one))
        .route("/exercise/:id/complete", post(complete))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<Vec<ExerciseRequest>>,
) -> ApiResult<(StatusCode, Json<Vec<ExerciseResponse>>)> {
    let created = services::register(&state.db, user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WindowQuery>,
) -> ApiResult<Json<Vec<ExerciseResponse>>> {
    let date = parse_date(&q.date)?;
    let rows = services::my_exercises(&state.db, user_id, date, q.granularity).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExerciseRequest>,
) -> ApiResult<Json<ExerciseResponse>> {
    let row = services::update_exercise(&state.db, user_id, id, &payload).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
async fn delete_one(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    services::delete_exercise(&state.db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn complete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExerciseResponse>> {
    let row = services::mark_complete(&state.db, user_id, id).await?;
    Ok(Json(row))
}

#[instrument(skip(state))]
async fn all_public_today(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, Vec<ExerciseResponse>>>> {
    let today = state.clock.today_utc();
    let map = services::all_public_today(&state.db, today).await?;
    Ok(Json(map))
}
