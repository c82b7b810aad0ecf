use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::services::notifier::{self, NotifyError};

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    #[serde(rename = "predictionId")]
    pub prediction_id: Uuid,
}

/// POST /results?predictionId=... — completion callback and on-demand result
/// query. Renders the stored prediction summary and sends it to the
/// originating chat.
///
/// An unknown id is a distinct 404, never a generic server error.
pub async fn deliver_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<&'static str, (StatusCode, &'static str)> {
    match notifier::deliver_result(
        state.results.as_ref(),
        state.chat.as_ref(),
        query.prediction_id,
    )
    .await
    {
        Ok(()) => Ok("Ok"),
        Err(NotifyError::NotFound(id)) => {
            tracing::info!(prediction_id = %id, "Prediction not found");
            Err((StatusCode::NOT_FOUND, "Prediction not found"))
        }
        Err(e) => {
            tracing::error!(prediction_id = %query.prediction_id, error = %e, "Failed to deliver results");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to deliver results"))
        }
    }
}
