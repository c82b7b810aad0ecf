use serde::{Deserialize, Serialize};

/// Webhook payload from the chat transport. Only `message` is of interest;
/// other update kinds are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<ChatEvent>,
}

/// An inbound chat message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoAttachment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One size variant of a photo attachment. Telegram sends several; the last
/// entry is the largest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub file_id: String,
}

impl ChatEvent {
    pub fn has_photo(&self) -> bool {
        self.photo.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// File id of the largest photo variant, if any.
    pub fn photo_file_id(&self) -> Option<&str> {
        self.photo
            .as_ref()
            .and_then(|p| p.last())
            .map(|a| a.file_id.as_str())
    }
}
