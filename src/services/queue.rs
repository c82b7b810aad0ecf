use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const QUEUE_KEY: &str = "photobot:jobs";
const PROCESSING_KEY: &str = "photobot:processing";

/// Job payload serialized into the queue. Immutable once enqueued.
///
/// `job_id` is assigned at ingestion and doubles as the message identity and
/// the result store primary key, which is what makes reprocessing idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_id: Uuid,
    pub s3_key: String,
    pub chat_id: i64,
}

impl JobDescriptor {
    /// Parse a queue message body. Missing or mistyped fields yield a
    /// distinct malformed-descriptor error so the worker can discard the
    /// message instead of redelivering it forever.
    pub fn parse(body: &str) -> Result<Self, QueueError> {
        serde_json::from_str(body).map_err(QueueError::MalformedDescriptor)
    }
}

/// One received-but-unacknowledged message. The body is retained verbatim so
/// acknowledgment can remove exactly this delivery from the processing list.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub body: String,
}

/// At-least-once job queue. Messages polled but not acknowledged are held in
/// a delivery lease and eventually redelivered, so the same descriptor may be
/// seen more than once.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError>;

    /// Block for up to `max_wait` for the next message. Returns `None` on
    /// timeout. The returned delivery is invisible to other consumers until
    /// acknowledged or its lease lapses.
    async fn poll(&self, max_wait: Duration) -> Result<Option<Delivery>, QueueError>;

    /// Delete a delivery; the job is done (or deliberately discarded).
    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Connectivity check (for health endpoints).
    async fn health_check(&self) -> Result<(), QueueError>;

    /// Current number of pending jobs.
    async fn queue_depth(&self) -> Result<u64, QueueError>;
}

/// Redis-backed job queue.
///
/// `poll` moves the message from the pending list into a processing list in
/// one step (BRPOPLPUSH), which acts as the delivery lease: the message is
/// gone from the pending list but not lost if this process dies before
/// acknowledging. Returning expired leases to the pending list is an operator
/// concern outside this process.
pub struct RedisJobQueue {
    client: redis::Client,
}

impl RedisJobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(descriptor).map_err(QueueError::Serialize)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    async fn poll(&self, max_wait: Duration) -> Result<Option<Delivery>, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let result: Option<String> = conn
            .brpoplpush(QUEUE_KEY, PROCESSING_KEY, max_wait.as_secs_f64())
            .await
            .map_err(QueueError::Redis)?;

        Ok(result.map(|body| Delivery { body }))
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &delivery.body)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),

    #[error("Malformed job descriptor: {0}")]
    MalformedDescriptor(serde_json::Error),
}
