use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Attachment bytes fetched from the chat transport, with the file name the
/// transport knows them by.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outbound side of the chat transport plus attachment retrieval.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError>;
    async fn fetch_attachment(&self, file_id: &str) -> Result<AttachmentFile, ChatError>;
}

/// Telegram Bot API client.
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(ChatError::Http)?
            .json()
            .await
            .map_err(ChatError::Http)?;

        if !response.ok {
            return Err(ChatError::Api(
                response.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    async fn fetch_attachment(&self, file_id: &str) -> Result<AttachmentFile, ChatError> {
        // Resolve the file id to a server-side path, then download it.
        let body = serde_json::json!({ "file_id": file_id });
        let response: ApiResponse<FileInfo> = self
            .http
            .post(self.method_url("getFile"))
            .json(&body)
            .send()
            .await
            .map_err(ChatError::Http)?
            .json()
            .await
            .map_err(ChatError::Http)?;

        let info = match (response.ok, response.result) {
            (true, Some(info)) => info,
            _ => {
                return Err(ChatError::Api(
                    response.description.unwrap_or_else(|| "unknown error".to_string()),
                ))
            }
        };

        let download_url = format!(
            "{}/file/bot{}/{}",
            self.api_base, self.token, info.file_path
        );
        let bytes = self
            .http
            .get(&download_url)
            .send()
            .await
            .map_err(ChatError::Http)?
            .error_for_status()
            .map_err(ChatError::Http)?
            .bytes()
            .await
            .map_err(ChatError::Http)?;

        let file_name = info
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(info.file_path.as_str())
            .to_string();

        Ok(AttachmentFile {
            file_name,
            bytes: bytes.to_vec(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat API error: {0}")]
    Api(String),
}
