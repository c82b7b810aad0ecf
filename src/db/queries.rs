use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::detection::Detection;
use crate::models::prediction::PredictionResult;

/// Upsert a completed prediction.
///
/// Keyed by `prediction_id`, so a redelivered job overwrites its own row.
/// `completed_at` keeps the first completion time on conflict; every other
/// column is deterministic for a given job, making the write idempotent.
pub async fn upsert_prediction(
    pool: &PgPool,
    result: &PredictionResult,
) -> Result<(), sqlx::Error> {
    let detections = serde_json::to_value(&result.detections)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO predictions (prediction_id, source_key, annotated_key, chat_id, detections, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (prediction_id) DO UPDATE
        SET source_key = EXCLUDED.source_key,
            annotated_key = EXCLUDED.annotated_key,
            chat_id = EXCLUDED.chat_id,
            detections = EXCLUDED.detections
        "#,
    )
    .bind(result.job_id)
    .bind(&result.source_key)
    .bind(&result.annotated_key)
    .bind(result.chat_id)
    .bind(detections)
    .bind(result.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a prediction by id. `None` when no such job completed.
pub async fn get_prediction(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Option<PredictionResult>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT prediction_id, source_key, annotated_key, chat_id, detections, completed_at
        FROM predictions
        WHERE prediction_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(r) => {
            let detections: serde_json::Value = r.try_get("detections")?;
            let detections: Vec<Detection> = serde_json::from_value(detections)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

            Some(PredictionResult {
                job_id: r.try_get("prediction_id")?,
                source_key: r.try_get("source_key")?,
                annotated_key: r.try_get("annotated_key")?,
                chat_id: r.try_get("chat_id")?,
                detections,
                completed_at: r.try_get("completed_at")?,
            })
        }
        None => None,
    })
}
