//! Telegram Bot API implementation of [`MessagingGateway`].

use super::{
    ForwardRequest, GatewayOutcome, InlineKeyboard, MediaAttachment, MediaKind, MessagingGateway,
    OutboundMessage,
};
use crate::config::TelegramConfig;
use crate::constants::system::{MAX_CAPTION_LENGTH, MAX_MEDIA_GROUP_SIZE};
use crate::error::{AuctionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Longest slice of a non-JSON body kept in the error description
const MAX_BODY_EXCERPT: usize = 200;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramGateway {
    client: Client,
    base_url: String,
    bot_token: String,
}

impl TelegramGateway {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AuctionError::ConfigurationError(
                "telegram.bot_token not configured".into(),
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuctionError::ConfigurationError(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    async fn call(&self, method: &str, payload: Value) -> Result<GatewayOutcome> {
        let url = format!("{}/bot{}/{}", self.base_url, self.bot_token, method);

        // The URL carries the token, so it is stripped from transport errors
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuctionError::GatewayError(format!("{method}: {}", e.without_url())))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuctionError::GatewayError(format!("{method}: {}", e.without_url())))?;

        let outcome = parse_api_response(status, &body);
        debug!(
            method = method,
            http_status = status,
            message_ids = ?outcome.message_ids,
            error = ?outcome.error,
            "Telegram API call completed"
        );
        Ok(outcome)
    }

    async fn send_text(
        &self,
        message: &OutboundMessage,
        with_keyboard: bool,
    ) -> Result<GatewayOutcome> {
        let mut payload = base_payload(message);
        payload.insert("text".into(), json!(message.text));
        payload.insert("disable_web_page_preview".into(), json!(true));
        if with_keyboard {
            if let Some(keyboard) = &message.keyboard {
                payload.insert("reply_markup".into(), keyboard_markup(keyboard));
            }
        }
        self.call("sendMessage", Value::Object(payload)).await
    }

    async fn send_single_media(
        &self,
        message: &OutboundMessage,
        attachment: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<GatewayOutcome> {
        let field = attachment.kind.as_str();
        let mut payload = base_payload(message);
        payload.insert(field.into(), json!(attachment.file_id));
        if let Some(caption) = caption {
            payload.insert("caption".into(), json!(caption));
        }
        if let Some(keyboard) = &message.keyboard {
            payload.insert("reply_markup".into(), keyboard_markup(keyboard));
        }
        self.call(single_media_method(attachment.kind), Value::Object(payload))
            .await
    }

    async fn send_media_group(
        &self,
        message: &OutboundMessage,
        attachments: &[MediaAttachment],
        caption: Option<&str>,
    ) -> Result<GatewayOutcome> {
        let media: Vec<Value> = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| {
                let mut item = json!({
                    "type": attachment.kind.as_str(),
                    "media": attachment.file_id,
                });
                if index == 0 {
                    if let Some(caption) = caption {
                        item["caption"] = json!(caption);
                        item["parse_mode"] = json!("HTML");
                    }
                }
                item
            })
            .collect();

        let mut payload = Map::new();
        payload.insert("chat_id".into(), json!(message.destination));
        payload.insert("media".into(), Value::Array(media));
        if let Some(reply_to) = message.reply_to_message_id {
            payload.insert("reply_parameters".into(), json!({ "message_id": reply_to }));
        }
        self.call("sendMediaGroup", Value::Object(payload)).await
    }

    async fn send_with_media(&self, message: &OutboundMessage) -> Result<GatewayOutcome> {
        let mut attachments: &[MediaAttachment] = &message.media;
        if attachments.len() > MAX_MEDIA_GROUP_SIZE {
            warn!(
                tag = ?message.tag,
                attachments = attachments.len(),
                "Media group exceeds platform limit, extra attachments dropped"
            );
            attachments = &attachments[..MAX_MEDIA_GROUP_SIZE];
        }

        let caption_fits = message.text.chars().count() <= MAX_CAPTION_LENGTH;
        let caption = (caption_fits && !message.text.is_empty()).then_some(message.text.as_str());

        let media_outcome = match attachments {
            [single] => self.send_single_media(message, single, caption).await?,
            group => self.send_media_group(message, group, caption).await?,
        };

        if caption_fits || media_outcome.error.is_some() {
            return Ok(media_outcome);
        }

        // Caption was too long: the text follows as its own message. The
        // media post already exists, so the outcome stays the media outcome
        // and a failed follow-up is only logged.
        let mut outcome = media_outcome;
        match self.send_text(message, true).await {
            Ok(text_outcome) if text_outcome.is_ok() => {
                outcome.message_ids.extend(text_outcome.message_ids);
            }
            Ok(text_outcome) => warn!(
                tag = ?message.tag,
                reason = %text_outcome.failure_reason(),
                "Overflow text after media post was rejected"
            ),
            Err(e) => warn!(
                tag = ?message.tag,
                error = %e,
                "Overflow text after media post failed"
            ),
        }
        Ok(outcome)
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(&self, message: OutboundMessage) -> Result<GatewayOutcome> {
        debug!(
            destination = %message.destination,
            tag = ?message.tag,
            media = message.media.len(),
            "Sending message"
        );

        if message.media.is_empty() {
            self.send_text(&message, true).await
        } else {
            self.send_with_media(&message).await
        }
    }

    async fn forward_message(&self, request: ForwardRequest) -> Result<GatewayOutcome> {
        let mut payload = Map::new();
        payload.insert("chat_id".into(), json!(request.to_chat));
        payload.insert("from_chat_id".into(), json!(request.from_chat));
        payload.insert("message_id".into(), json!(request.message_id));
        if let Some(topic_id) = request.topic_id {
            payload.insert("message_thread_id".into(), json!(topic_id));
        }
        self.call("forwardMessage", Value::Object(payload)).await
    }
}

fn base_payload(message: &OutboundMessage) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("chat_id".into(), json!(message.destination));
    payload.insert("parse_mode".into(), json!("HTML"));
    if let Some(reply_to) = message.reply_to_message_id {
        payload.insert("reply_parameters".into(), json!({ "message_id": reply_to }));
    }
    payload
}

fn keyboard_markup(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| json!({ "text": button.text, "callback_data": button.callback_data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

fn single_media_method(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "sendPhoto",
        MediaKind::Video => "sendVideo",
        MediaKind::Document => "sendDocument",
        MediaKind::Audio => "sendAudio",
    }
}

/// Map a Bot API response body onto a [`GatewayOutcome`].
///
/// Bodies that are not Bot API JSON (proxy error pages) become an upstream
/// error coded with the HTTP status.
fn parse_api_response(http_status: u16, body: &str) -> GatewayOutcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
            return GatewayOutcome::failed(http_status, format!("non-JSON response: {excerpt}"));
        }
    };

    let parsed: ApiResponse = match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let mut outcome =
                GatewayOutcome::failed(http_status, format!("unexpected response shape: {e}"));
            outcome.response = value;
            return outcome;
        }
    };

    let mut outcome = if parsed.ok {
        GatewayOutcome::delivered(extract_message_ids(parsed.result.as_ref()))
    } else {
        GatewayOutcome::failed(
            parsed.error_code.unwrap_or(http_status),
            parsed
                .description
                .unwrap_or_else(|| "no description".to_string()),
        )
    };
    outcome.response = value;
    outcome
}

fn extract_message_ids(result: Option<&Value>) -> Vec<i64> {
    match result {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("message_id").and_then(Value::as_i64))
            .collect(),
        Some(item) => item
            .get("message_id")
            .and_then(Value::as_i64)
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}
