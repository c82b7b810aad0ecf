use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::detection::Detection;

/// The durable record of one completed prediction job.
///
/// Written exactly once per job by the worker (redeliveries overwrite with
/// identical content keyed by `job_id`), read later by the notification
/// callback and the on-demand result query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Primary key; exposed as `predictionId` at the HTTP boundary.
    pub job_id: Uuid,
    /// Job store key of the original image.
    pub source_key: String,
    /// Job store key of the annotated image produced by inference.
    pub annotated_key: String,
    /// Detections in the order the model reported them. May be empty:
    /// "nothing recognized" is a valid outcome, distinct from failure.
    pub detections: Vec<Detection>,
    /// Conversation to notify on completion.
    pub chat_id: i64,
    pub completed_at: DateTime<Utc>,
}
