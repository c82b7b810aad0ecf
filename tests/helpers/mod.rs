//! In-memory fakes for the external collaborators, used to exercise the
//! ingestion service, worker loop and notification callback without live
//! infrastructure.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use photobot::models::detection::RawDetection;
use photobot::models::prediction::PredictionResult;
use photobot::services::chat::{AttachmentFile, ChatError, ChatTransport};
use photobot::services::detector::{DetectorError, Inference, ObjectDetector};
use photobot::services::notifier::{CompletionNotifier, NotifyError};
use photobot::services::queue::{Delivery, JobDescriptor, JobQueue, QueueError};
use photobot::services::results::{ResultStore, ResultStoreError};
use photobot::services::storage::{JobStore, StorageError};

/// Smallest byte prefix that the `image` crate sniffs as PNG.
pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// ── Job store ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryJobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_gets: AtomicBool,
}

impl MemoryJobStore {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn seed(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::Config("simulated download failure".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::Config(format!("no object at {key}")))
    }
}

// ── Job queue ────────────────────────────────────────────────────────

/// At-least-once queue with delivery-lease semantics: a polled message moves
/// to an in-flight list and stays invisible until acknowledged or explicitly
/// redelivered (the fake's stand-in for a lapsed visibility timeout).
#[derive(Default)]
pub struct MemoryJobQueue {
    pending: Mutex<VecDeque<String>>,
    in_flight: Mutex<Vec<String>>,
}

impl MemoryJobQueue {
    /// Push a raw (possibly malformed) message body.
    pub fn push_raw(&self, body: &str) {
        self.pending.lock().unwrap().push_back(body.to_string());
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    /// Move every in-flight message back to pending, as a lapsed delivery
    /// lease would.
    pub fn redeliver_all(&self) {
        let mut pending = self.pending.lock().unwrap();
        let mut in_flight = self.in_flight.lock().unwrap();
        for body in in_flight.drain(..) {
            pending.push_back(body);
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, descriptor: &JobDescriptor) -> Result<(), QueueError> {
        let payload = serde_json::to_string(descriptor).map_err(QueueError::Serialize)?;
        self.pending.lock().unwrap().push_back(payload);
        Ok(())
    }

    async fn poll(&self, _max_wait: Duration) -> Result<Option<Delivery>, QueueError> {
        let message = {
            let mut pending = self.pending.lock().unwrap();
            pending.pop_front()
        };

        match message {
            Some(body) => {
                self.in_flight.lock().unwrap().push(body.clone());
                Ok(Some(Delivery { body }))
            }
            None => {
                // Stand in for the bounded long-poll without blocking tests.
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(None)
            }
        }
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(pos) = in_flight.iter().position(|b| *b == delivery.body) {
            in_flight.remove(pos);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Ok(())
    }

    async fn queue_depth(&self) -> Result<u64, QueueError> {
        Ok(self.pending.lock().unwrap().len() as u64)
    }
}

// ── Result store ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryResultStore {
    items: Mutex<HashMap<Uuid, PredictionResult>>,
    writes: AtomicUsize,
}

impl MemoryResultStore {
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn item(&self, job_id: Uuid) -> Option<PredictionResult> {
        self.items.lock().unwrap().get(&job_id).cloned()
    }

    pub fn seed(&self, result: PredictionResult) {
        self.items.lock().unwrap().insert(result.job_id, result);
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put_item(&self, result: &PredictionResult) -> Result<(), ResultStoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.lock().unwrap();
        // Mirrors the production upsert: the first completion time wins.
        let mut stored = result.clone();
        if let Some(existing) = items.get(&result.job_id) {
            stored.completed_at = existing.completed_at;
        }
        items.insert(result.job_id, stored);
        Ok(())
    }

    async fn get_item(&self, job_id: Uuid) -> Result<Option<PredictionResult>, ResultStoreError> {
        Ok(self.items.lock().unwrap().get(&job_id).cloned())
    }
}

// ── Chat transport ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingChat {
    messages: Mutex<Vec<(i64, String)>>,
    attachment: Mutex<Option<AttachmentFile>>,
    fail_fetch: AtomicBool,
}

impl RecordingChat {
    pub fn with_attachment(file_name: &str, bytes: &[u8]) -> Self {
        let chat = Self::default();
        *chat.attachment.lock().unwrap() = Some(AttachmentFile {
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
        });
        chat
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn sent_messages(&self) -> Vec<(i64, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingChat {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        self.messages
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn fetch_attachment(&self, _file_id: &str) -> Result<AttachmentFile, ChatError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ChatError::Api("simulated fetch failure".to_string()));
        }
        self.attachment
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ChatError::Api("no attachment configured".to_string()))
    }
}

// ── Object detector ──────────────────────────────────────────────────

pub struct StubDetector {
    detections: Vec<RawDetection>,
    annotated_image: Vec<u8>,
    fail: AtomicBool,
}

impl StubDetector {
    pub fn with_detections(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            annotated_image: b"annotated image bytes".to_vec(),
            fail: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        Self::with_detections(Vec::new())
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectDetector for StubDetector {
    async fn detect(&self, _image: &[u8]) -> Result<Inference, DetectorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DetectorError::Decode(base64::DecodeError::InvalidPadding));
        }
        Ok(Inference {
            detections: self.detections.clone(),
            annotated_image: self.annotated_image.clone(),
        })
    }
}

pub fn raw_detection(label: &str) -> RawDetection {
    RawDetection {
        class_label: label.to_string(),
        cx: 0.512345,
        cy: 0.223456,
        width: 0.1,
        height: 0.2,
    }
}

// ── Completion notifier ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Uuid, i64)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Uuid, i64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify(&self, job_id: Uuid, chat_id: i64) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push((job_id, chat_id));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::CallbackStatus(500));
        }
        Ok(())
    }
}
