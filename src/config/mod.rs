use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8443"). Unused by the worker.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Chat bot token; also the webhook path segment.
    pub telegram_token: String,

    /// Chat API base URL. Overridable for tests and proxies.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Base URL of the chat-facing server, used by the worker to deliver
    /// completion callbacks.
    pub callback_url: String,

    /// PostgreSQL connection string (result store)
    pub database_url: String,

    /// Redis connection string for the job queue
    pub redis_url: String,

    /// Job store bucket name
    pub s3_bucket: String,

    /// Job store endpoint URL (S3-compatible)
    pub s3_endpoint: String,

    /// Job store access key ID
    pub s3_access_key: String,

    /// Job store secret access key
    pub s3_secret_key: String,

    /// Base URL of the object-detection inference service
    pub detector_url: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8443".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
