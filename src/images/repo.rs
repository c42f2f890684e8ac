use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Insert a new image reference within a transaction.
pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Postgres>,
    image_id: Uuid,
    diet_id: Uuid,
    s3_key: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO diet_images (id, diet_id, s3_key)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(image_id)
    .bind(diet_id)
    .bind(s3_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// All image keys for a diet, oldest first.
pub async fn keys_for_diet(db: &PgPool, diet_id: Uuid) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT s3_key
          FROM diet_images
         WHERE diet_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(diet_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(k,)| k).collect())
}
