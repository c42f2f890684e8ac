use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::diet::dto::{DietComposite, RegisterDietRequest, RegisterDietResponse, UpdateDietRequest};
use crate::diet::services;
use crate::error::{ApiResult, AppError};
use crate::images::services::UploadItem;
use crate::state::AppState;
use crate::window::{parse_date, WindowQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/diet", get(list))
        .route("/diet/public/today", get(all_public_today))
        .route("/diet/:id", get(detail).put(update).delete(delete_one))
        .route("/diet/details/:id/complete", post(complete_detail))
        .merge(
            Router::new()
                .route("/diet", post(register))
                .layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
}

/// POST /diet (multipart)
/// Parts: `meta` (JSON: date + detail rows), `files` (zero or more images).
#[instrument(skip(state, mp))]
async fn register(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> ApiResult<(StatusCode, Json<RegisterDietResponse>)> {
    let (meta, files) = parse_register_parts(mp).await?;
    let created = services::register(&state, user_id, meta, files).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// A stream error mid-body is a client error, not end-of-input; bailing out
/// here keeps it from masquerading as a missing or partial part.
async fn parse_register_parts(
    mut mp: Multipart,
) -> Result<(RegisterDietRequest, Vec<UploadItem>), AppError> {
    let mut meta: Option<RegisterDietRequest> = None;
    let mut files: Vec<UploadItem> = Vec::new();

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("meta") => {
                let raw = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                meta = Some(
                    serde_json::from_slice(&raw)
                        .map_err(|e| AppError::InvalidInput(format!("bad meta: {e}")))?,
                );
            }
            Some("files") | Some("files[]") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                files.push(UploadItem {
                    body: data,
                    content_type,
                });
            }
            _ => continue,
        }
    }

    let meta = meta.ok_or_else(|| AppError::InvalidInput("meta part is required".into()))?;
    Ok((meta, files))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WindowQuery>,
) -> ApiResult<Json<Vec<DietComposite>>> {
    let date = parse_date(&q.date)?;
    let rows = services::my_diets(&state, user_id, date, q.granularity).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
async fn detail(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DietComposite>> {
    let composite = services::diet_detail(&state, user_id, id).await?;
    Ok(Json(composite))
}

#[instrument(skip(state, payload))]
async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDietRequest>,
) -> ApiResult<Json<DietComposite>> {
    let composite = services::update_diet(&state, user_id, id, payload).await?;
    Ok(Json(composite))
}

#[instrument(skip(state))]
async fn delete_one(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    services::delete_diet(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn complete_detail(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DietComposite>> {
    let composite = services::mark_detail_complete(&state, user_id, id).await?;
    Ok(Json(composite))
}

#[instrument(skip(state))]
async fn all_public_today(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, Vec<DietComposite>>>> {
    let today = state.clock.today_utc();
    let map = services::all_public_today(&state, today).await?;
    Ok(Json(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    async fn multipart_from(raw: &str) -> Multipart {
        let req = Request::builder()
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(raw.to_string()))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    #[tokio::test]
    async fn parses_meta_and_file_parts() {
        let raw = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"meta\"\r\n\r\n",
            "{\"diet_date\":\"2024-05-17\",\"details\":[]}\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"a.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n\r\n",
            "jpegbytes\r\n",
            "--XBOUNDARY--\r\n",
        );
        let (meta, files) = parse_register_parts(multipart_from(raw).await)
            .await
            .unwrap();
        assert_eq!(meta.diet_date, "2024-05-17");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content_type, "image/jpeg");
        assert_eq!(files[0].body.as_ref(), b"jpegbytes");
    }

    #[tokio::test]
    async fn missing_meta_part_is_rejected() {
        let raw = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"a.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n\r\n",
            "jpegbytes\r\n",
            "--XBOUNDARY--\r\n",
        );
        let err = parse_register_parts(multipart_from(raw).await)
            .await
            .unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert!(msg.contains("meta"), "{msg}"),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mid_stream_error_is_reported_not_swallowed() {
        // a later part with a garbled header block must fail the request, not
        // silently truncate it to the parts already read
        let raw = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"meta\"\r\n\r\n",
            "{\"diet_date\":\"2024-05-17\",\"details\":[]}\r\n",
            "--XBOUNDARY\r\n",
            "this header line has no colon\r\n\r\n",
            "orphaned bytes\r\n",
            "--XBOUNDARY--\r\n",
        );
        let err = parse_register_parts(multipart_from(raw).await)
            .await
            .unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert!(msg.contains("multipart"), "{msg}"),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }
}
