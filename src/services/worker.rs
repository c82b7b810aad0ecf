use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::models::detection::Detection;
use crate::models::prediction::PredictionResult;
use crate::services::detector::{DetectorError, ObjectDetector};
use crate::services::notifier::{CompletionNotifier, NotifyError};
use crate::services::queue::{Delivery, JobDescriptor, JobQueue, QueueError};
use crate::services::results::{ResultStore, ResultStoreError};
use crate::services::storage::{self, JobStore, StorageError};

/// Bounded long-poll wait. Short enough to stay responsive to shutdown,
/// long enough to avoid busy-spinning on an empty queue.
const POLL_WAIT: Duration = Duration::from_secs(5);

/// What became of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Pipeline ran to completion; the delivery was acknowledged.
    Completed,
    /// Structurally invalid message; acknowledged and dropped, since
    /// redelivery cannot fix it.
    Discarded,
    /// A pipeline step failed; the delivery was left unacknowledged so the
    /// queue redelivers it later.
    Deferred,
}

/// The job-processing loop: polls the queue, runs the detection pipeline per
/// job, persists the result, notifies completion and acknowledges.
///
/// Processes one message at a time. All writes are keyed by the job id, so a
/// redelivered descriptor reproduces the same stored state.
pub struct Worker {
    storage: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    results: Arc<dyn ResultStore>,
    detector: Arc<dyn ObjectDetector>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl Worker {
    pub fn new(
        storage: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        results: Arc<dyn ResultStore>,
        detector: Arc<dyn ObjectDetector>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            storage,
            queue,
            results,
            detector,
            notifier,
        }
    }

    /// Run until `shutdown` flips to true. The flag is checked at the top of
    /// each iteration; a job already in flight runs to completion first.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        tracing::info!("Worker ready, starting job processing loop");

        loop {
            if *shutdown.borrow() {
                tracing::info!("Shutdown requested, stopping worker loop");
                break;
            }

            let delivery = match self.queue.poll(POLL_WAIT).await {
                Ok(Some(d)) => d,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Queue poll failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            self.process_delivery(&delivery).await;
        }
    }

    /// Process one delivery end to end and settle it against the queue.
    pub async fn process_delivery(&self, delivery: &Delivery) -> JobOutcome {
        let descriptor = match JobDescriptor::parse(&delivery.body) {
            Ok(d) => d,
            Err(e) => {
                // Redelivery cannot fix a malformed payload; drop it.
                tracing::warn!(error = %e, body = %delivery.body, "Discarding malformed job message");
                if let Err(e) = self.queue.acknowledge(delivery).await {
                    tracing::error!(error = %e, "Failed to acknowledge malformed message");
                }
                return JobOutcome::Discarded;
            }
        };

        tracing::info!(
            job_id = %descriptor.job_id,
            s3_key = %descriptor.s3_key,
            "Processing prediction job"
        );

        let start = std::time::Instant::now();
        match self.run_pipeline(&descriptor).await {
            Ok(result) => {
                metrics::histogram!("prediction_processing_seconds")
                    .record(start.elapsed().as_secs_f64());
                metrics::counter!("prediction_jobs_completed").increment(1);

                // The callback attempt must finish before the message is
                // acknowledged; its failure is not fatal, the result is
                // durable and can be queried on demand.
                if let Err(e) = self
                    .notifier
                    .notify(descriptor.job_id, descriptor.chat_id)
                    .await
                {
                    tracing::error!(job_id = %descriptor.job_id, error = %e, "Completion callback failed");
                } else {
                    tracing::info!(job_id = %descriptor.job_id, "Completion callback delivered");
                }

                if let Err(e) = self.queue.acknowledge(delivery).await {
                    tracing::error!(job_id = %descriptor.job_id, error = %e, "Failed to acknowledge message");
                    return JobOutcome::Deferred;
                }

                tracing::info!(
                    job_id = %descriptor.job_id,
                    detections = result.detections.len(),
                    "Job completed"
                );
                JobOutcome::Completed
            }
            Err(e) => {
                // Left unacknowledged: the queue's redelivery policy governs
                // the retry, and every write below is idempotent.
                metrics::counter!("prediction_jobs_failed").increment(1);
                tracing::error!(
                    job_id = %descriptor.job_id,
                    error = %e,
                    "Job processing failed, leaving message for redelivery"
                );
                JobOutcome::Deferred
            }
        }
    }

    /// download -> infer -> upload -> persist. Every write is keyed by the
    /// job id, so reprocessing the same descriptor overwrites in place.
    async fn run_pipeline(
        &self,
        descriptor: &JobDescriptor,
    ) -> Result<PredictionResult, WorkerError> {
        tracing::debug!(job_id = %descriptor.job_id, "Downloading source image");
        let image = self.storage.get(&descriptor.s3_key).await?;

        tracing::debug!(job_id = %descriptor.job_id, "Running inference");
        let inference = self.detector.detect(&image).await?;

        let annotated_key = storage::annotated_key(&descriptor.s3_key);
        tracing::debug!(job_id = %descriptor.job_id, annotated_key = %annotated_key, "Uploading annotated image");
        self.storage
            .put(&annotated_key, &inference.annotated_image, "image/jpeg")
            .await?;

        let detections = inference
            .detections
            .iter()
            .map(Detection::from_raw)
            .collect::<Result<Vec<_>, _>>()
            .map_err(WorkerError::Coordinate)?;

        // Zero detections is a valid outcome and is still persisted; the
        // callback renders a distinct nothing-recognized reply for it.
        let result = PredictionResult {
            job_id: descriptor.job_id,
            source_key: descriptor.s3_key.clone(),
            annotated_key,
            detections,
            chat_id: descriptor.chat_id,
            completed_at: Utc::now(),
        };

        tracing::debug!(job_id = %descriptor.job_id, "Persisting prediction result");
        self.results.put_item(&result).await?;

        Ok(result)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Inference error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Result store error: {0}")]
    Results(#[from] ResultStoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Invalid detection coordinate: {0}")]
    Coordinate(rust_decimal::Error),
}
