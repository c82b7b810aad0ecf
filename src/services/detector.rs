use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::models::detection::RawDetection;

/// Output of one inference run: zero or more detections plus the annotated
/// image artifact (boxes drawn over the source).
#[derive(Debug, Clone)]
pub struct Inference {
    pub detections: Vec<RawDetection>,
    pub annotated_image: Vec<u8>,
}

/// The object-detection model. Only its interface matters here; the model
/// itself runs elsewhere.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: &[u8]) -> Result<Inference, DetectorError>;
}

/// Client for the YOLO-style HTTP inference service.
pub struct HttpDetector {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<RawDetection>,
    annotated_image: String,
}

impl HttpDetector {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    async fn detect(&self, image: &[u8]) -> Result<Inference, DetectorError> {
        let request_body = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
        });

        let response = self
            .http
            .post(format!("{}/detect", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(DetectorError::Http)?
            .error_for_status()
            .map_err(DetectorError::Http)?;

        let parsed: DetectResponse = response.json().await.map_err(DetectorError::Http)?;

        let annotated_image = base64::engine::general_purpose::STANDARD
            .decode(&parsed.annotated_image)
            .map_err(DetectorError::Decode)?;

        Ok(Inference {
            detections: parsed.detections,
            annotated_image,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode annotated image: {0}")]
    Decode(#[from] base64::DecodeError),
}
