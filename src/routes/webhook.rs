use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::event::Update;

/// POST /webhook/{token} — inbound chat events.
///
/// The chat transport retries on non-2xx, so handler failures downstream of
/// ingestion are logged and answered with 500 to trigger a redelivery, while
/// handled events always get a plain "Ok".
pub async fn telegram_webhook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> Result<&'static str, StatusCode> {
    if token != state.webhook_token {
        return Err(StatusCode::NOT_FOUND);
    }

    let Some(event) = update.message else {
        // Not a message update; nothing to do.
        return Ok("Ok");
    };

    if let Err(e) = state.ingestion.handle(&event).await {
        tracing::error!(chat_id = event.chat.id, error = %e, "Failed to handle chat event");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok("Ok")
}

/// GET / — connectivity probe.
pub async fn index() -> &'static str {
    "Ok, you are connected"
}
