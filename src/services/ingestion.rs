use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::event::ChatEvent;
use crate::services::chat::{ChatError, ChatTransport};
use crate::services::queue::{JobDescriptor, JobQueue, QueueError};
use crate::services::storage::{self, JobStore, StorageError};

const PROCESSING_ACK: &str = "Your image is being processed. Please wait ...";
const FETCH_FAILED_REPLY: &str =
    "Sorry, I could not download your image. Please try sending it again.";
const BAD_FORMAT_REPLY: &str = "Sorry, that does not look like an image format I can process.";

/// One behavior variant of the bot, selected per event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &ChatEvent) -> Result<(), IngestionError>;
}

/// Routes each inbound event to the matching handler: photo events become
/// detection jobs, everything else is echoed.
pub struct EventDispatcher {
    photo_jobs: PhotoJobHandler,
    echo: EchoHandler,
}

impl EventDispatcher {
    pub fn new(
        chat: Arc<dyn ChatTransport>,
        storage: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            photo_jobs: PhotoJobHandler {
                chat: chat.clone(),
                storage,
                queue,
            },
            echo: EchoHandler { chat },
        }
    }

    pub async fn handle(&self, event: &ChatEvent) -> Result<(), IngestionError> {
        if event.has_photo() {
            self.photo_jobs.handle(event).await
        } else {
            self.echo.handle(event).await
        }
    }
}

/// Replies with the original text. Events carrying neither photo nor text
/// are logged and dropped.
pub struct EchoHandler {
    chat: Arc<dyn ChatTransport>,
}

#[async_trait]
impl EventHandler for EchoHandler {
    async fn handle(&self, event: &ChatEvent) -> Result<(), IngestionError> {
        let Some(text) = event.text.as_deref() else {
            tracing::warn!(chat_id = event.chat.id, "Event has neither photo nor text, ignoring");
            return Ok(());
        };

        self.chat
            .send_message(event.chat.id, &format!("Your original message: {text}"))
            .await?;
        Ok(())
    }
}

/// Stages a photo in the job store, enqueues a job descriptor and sends the
/// processing acknowledgment.
pub struct PhotoJobHandler {
    chat: Arc<dyn ChatTransport>,
    storage: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
}

#[async_trait]
impl EventHandler for PhotoJobHandler {
    async fn handle(&self, event: &ChatEvent) -> Result<(), IngestionError> {
        let chat_id = event.chat.id;
        let Some(file_id) = event.photo_file_id() else {
            tracing::warn!(chat_id, "Photo event without a usable attachment, ignoring");
            return Ok(());
        };

        // Attachment retrieval failures are surfaced to the user directly
        // and never retried; no job exists yet at this point.
        let attachment = match self.chat.fetch_attachment(file_id).await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Failed to fetch attachment");
                self.chat.send_message(chat_id, FETCH_FAILED_REPLY).await?;
                return Ok(());
            }
        };

        let format = match image::guess_format(&attachment.bytes) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Attachment is not a decodable image");
                self.chat.send_message(chat_id, BAD_FORMAT_REPLY).await?;
                return Ok(());
            }
        };

        // Stage the blob before enqueuing so the descriptor never references
        // a missing object. An orphaned blob on enqueue failure is acceptable
        // garbage; nothing consumes it without a descriptor.
        let job_id = Uuid::new_v4();
        let s3_key = storage::source_key(job_id, &attachment.file_name);
        self.storage
            .put(&s3_key, &attachment.bytes, format.to_mime_type())
            .await?;

        let descriptor = JobDescriptor {
            job_id,
            s3_key,
            chat_id,
        };
        self.queue.enqueue(&descriptor).await?;

        metrics::counter!("prediction_jobs_total").increment(1);
        tracing::info!(job_id = %job_id, chat_id, s3_key = %descriptor.s3_key, "Job enqueued");

        self.chat.send_message(chat_id, PROCESSING_ACK).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Chat transport error: {0}")]
    Chat(#[from] ChatError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}
