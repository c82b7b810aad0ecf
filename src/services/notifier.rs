use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::models::detection::Detection;
use crate::services::chat::{ChatError, ChatTransport};
use crate::services::results::{ResultStore, ResultStoreError};

const NOTHING_RECOGNIZED: &str = "I was not able to recognize any objects in your image.";

/// Render the human-readable summary for a detection sequence.
///
/// Labels are grouped with counts in first-seen order, so the output is
/// deterministic for a given sequence. An empty sequence gets a fixed
/// nothing-recognized text instead of an empty list.
pub fn render_summary(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return NOTHING_RECOGNIZED.to_string();
    }

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for detection in detections {
        match counts.iter_mut().find(|(label, _)| *label == detection.class_label) {
            Some((_, count)) => *count += 1,
            None => counts.push((&detection.class_label, 1)),
        }
    }

    let mut summary = String::from("I was able to recognize the following objects:\n");
    for (label, count) in counts {
        summary.push_str(&format!("{label} : {count}\n"));
    }
    summary
}

/// Read the stored prediction and deliver its summary to the originating
/// chat. A missing record is a distinct not-found outcome, never a generic
/// failure.
pub async fn deliver_result(
    results: &dyn ResultStore,
    chat: &dyn ChatTransport,
    job_id: Uuid,
) -> Result<(), NotifyError> {
    let result = results
        .get_item(job_id)
        .await?
        .ok_or(NotifyError::NotFound(job_id))?;

    let summary = render_summary(&result.detections);
    chat.send_message(result.chat_id, &summary).await?;
    Ok(())
}

/// Completion signal from the worker to the chat-facing process.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, job_id: Uuid, chat_id: i64) -> Result<(), NotifyError>;
}

/// Notifies completion by calling the results endpoint of the chat-facing
/// server, which renders and delivers the summary out-of-band.
pub struct HttpCallbackNotifier {
    http: Client,
    callback_url: String,
}

impl HttpCallbackNotifier {
    pub fn new(callback_url: &str) -> Self {
        Self {
            http: Client::new(),
            callback_url: callback_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionNotifier for HttpCallbackNotifier {
    async fn notify(&self, job_id: Uuid, chat_id: i64) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(format!("{}/results", self.callback_url))
            .query(&[
                ("predictionId", job_id.to_string()),
                ("chatId", chat_id.to_string()),
            ])
            .send()
            .await
            .map_err(NotifyError::Http)?;

        if !response.status().is_success() {
            return Err(NotifyError::CallbackStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Prediction {0} not found")]
    NotFound(Uuid),

    #[error("Result store error: {0}")]
    Results(#[from] ResultStoreError),

    #[error("Chat transport error: {0}")]
    Chat(#[from] ChatError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Results callback returned status {0}")]
    CallbackStatus(u16),
}
