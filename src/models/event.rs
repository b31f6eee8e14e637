use serde::{Deserialize, Serialize};

use super::{FileAttachment, ReplyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    AiMessage,
    AiNavigate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AiMessage => "ai-message",
            EventKind::AiNavigate => "ai-navigate",
        }
    }
}

/// A message the dashboard already sent, handed to the chat view.
/// `reply` is what the backend answered, so the chat view does not ask again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMessagePayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default)]
    pub is_eli5: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "kebab-case")]
pub enum AppEvent {
    AiMessage(AiMessagePayload),
    AiNavigate,
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::AiMessage(_) => EventKind::AiMessage,
            AppEvent::AiNavigate => EventKind::AiNavigate,
        }
    }
}
