use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::extractors::AuthUser;
use crate::auth::jwt::JwtKeys;
use crate::error::{ApiResult, AppError};
use crate::members::dto::{
    AuthResponse, DisclosureResponse, LoginRequest, PublicMember, RefreshRequest, RegisterRequest,
};
use crate::members::{repo::Member, services};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members/me", get(me))
        .route("/members/me/disclosure", post(toggle_disclosure))
}

fn token_pair(state: &AppState, member: Member) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(member.id)?;
    let refresh_token = keys.sign_refresh(member.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        member: member.into(),
    })
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let member = services::register(&state.db, &payload).await?;
    Ok(Json(token_pair(&state, member)?))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let member = services::login(&state.db, &payload).await?;
    Ok(Json(token_pair(&state, member)?))
}

#[instrument(skip(state, payload))]
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::Unauthorized("invalid refresh token".into()))?;
    let member = services::member_info(&state.db, claims.sub).await?;
    Ok(Json(token_pair(&state, member)?))
}

#[instrument(skip(state))]
async fn me(
    State(state): State<AppState>,
    AuthUser(member_id): AuthUser,
) -> ApiResult<Json<PublicMember>> {
    let member = services::member_info(&state.db, member_id).await?;
    Ok(Json(member.into()))
}

#[instrument(skip(state))]
async fn toggle_disclosure(
    State(state): State<AppState>,
    AuthUser(member_id): AuthUser,
) -> ApiResult<Json<DisclosureResponse>> {
    let disclosure = services::toggle_disclosure(&state.db, member_id).await?;
    Ok(Json(DisclosureResponse { disclosure }))
}
