//! # Messaging Gateway
//!
//! Outbound messaging seam used by both workers. The workers only see
//! [`MessagingGateway`]; [`telegram::TelegramGateway`] talks to the Bot API
//! and the in-memory recorder in [`crate::test_helpers`] backs the tests.
//!
//! Upstream failures are not `Err`: a request that reached the upstream and
//! was answered with an error comes back as a [`GatewayOutcome`] carrying an
//! [`UpstreamError`], so the retry policy can inspect the code. `Err` is
//! reserved for transport failures and local validation.

pub mod telegram;

use crate::constants::retry::TRANSIENT_ERROR_CODES;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use telegram::TelegramGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "photo" => Ok(Self::Photo),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "audio" => Ok(Self::Audio),
            _ => Err(format!("Invalid media kind: {s}")),
        }
    }
}

/// A file already uploaded to the messaging platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Rows of callback buttons rendered under a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Chat id or `@username`
    pub destination: String,
    /// Telegram HTML
    pub text: String,
    /// Idempotency tag for correlation in upstream logs
    pub tag: Option<String>,
    pub media: Vec<MediaAttachment>,
    pub reply_to_message_id: Option<i64>,
    pub keyboard: Option<InlineKeyboard>,
}

impl OutboundMessage {
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
            tag: None,
            media: Vec::new(),
            reply_to_message_id: None,
            keyboard: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_media(mut self, media: Vec<MediaAttachment>) -> Self {
        self.media = media;
        self
    }

    pub fn in_reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardRequest {
    pub from_chat: String,
    pub to_chat: String,
    pub message_id: i64,
    /// Forum topic in the destination chat
    pub topic_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamError {
    pub error_code: u16,
    pub description: String,
}

impl UpstreamError {
    pub fn is_transient(&self) -> bool {
        TRANSIENT_ERROR_CODES.contains(&self.error_code)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream error {}: {}", self.error_code, self.description)
    }
}

/// Result of one gateway call that reached the upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayOutcome {
    pub message_ids: Vec<i64>,
    pub error: Option<UpstreamError>,
    pub response: serde_json::Value,
}

impl GatewayOutcome {
    pub fn delivered(message_ids: Vec<i64>) -> Self {
        Self {
            message_ids,
            error: None,
            response: serde_json::Value::Null,
        }
    }

    pub fn failed(error_code: u16, description: impl Into<String>) -> Self {
        Self {
            message_ids: Vec::new(),
            error: Some(UpstreamError {
                error_code,
                description: description.into(),
            }),
            response: serde_json::Value::Null,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && !self.message_ids.is_empty()
    }

    /// Media groups return one id per item; the last one identifies the post
    pub fn last_message_id(&self) -> Option<i64> {
        self.message_ids.last().copied()
    }

    pub fn is_transient_failure(&self) -> bool {
        self.error.as_ref().is_some_and(UpstreamError::is_transient)
    }

    /// Human readable failure reason for logs and error values
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(error) => error.to_string(),
            None if self.message_ids.is_empty() => "no message id returned".to_string(),
            None => "ok".to_string(),
        }
    }
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_message(&self, message: OutboundMessage) -> Result<GatewayOutcome>;

    async fn forward_message(&self, request: ForwardRequest) -> Result<GatewayOutcome>;
}
