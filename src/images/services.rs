use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use super::repo;
use crate::error::AppError;
use crate::state::AppState;

const PRESIGN_TTL_SECS: u64 = 30 * 60;

#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Upload image files to object storage and link them to the diet entry.
/// Keys are deterministic and stored in the database, so later deletion never
/// has to derive them from urls.
pub async fn upload_and_link_images(
    st: &AppState,
    user_id: Uuid,
    diet_id: Uuid,
    images: Vec<UploadItem>,
) -> Result<Vec<Uuid>, AppError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    struct Obj {
        id: Uuid,
        key: String,
    }
    let mut objs = Vec::with_capacity(images.len());
    for img in images {
        let id = Uuid::new_v4();
        let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
        let key = format!("diet/{}/{}/{}.{}", user_id, diet_id, id, ext);
        st.storage
            .put_object(&key, img.body, &img.content_type)
            .await
            .with_context(|| format!("put_object {}", key))?;
        objs.push(Obj { id, key });
    }

    let mut tx = st.db.begin().await?;
    for o in &objs {
        repo::insert_image_tx(&mut tx, o.id, diet_id, &o.key).await?;
    }
    tx.commit().await?;

    Ok(objs.into_iter().map(|o| o.id).collect())
}

/// Presigned GET urls for a diet's images.
pub async fn presigned_urls(st: &AppState, diet_id: Uuid) -> Result<Vec<String>, AppError> {
    let keys = repo::keys_for_diet(&st.db, diet_id).await?;
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        out.push(st.storage.presign_get(&k, PRESIGN_TTL_SECS).await?);
    }
    Ok(out)
}

/// Best-effort removal of the stored objects; a failed delete is logged and
/// does not block removing the rows.
pub async fn delete_objects_best_effort(st: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(key = %key, error = %e, "failed to delete stored image");
        }
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
