//! # Thread Discovery
//!
//! When a post lands in a channel with a linked discussion group, Telegram
//! copies it into the group as an automatic forward. Comments on the post are
//! replies to that copy, so its message id is the thread id. The platform
//! does not return it to the sender; it only arrives as an inbound webhook,
//! which the HTTP layer records in the request log. The scanner polls that
//! log for a bounded number of attempts.

use crate::config::ThreadDiscoveryConfig;
use crate::error::{AuctionError, Result};
use crate::models::{AutoForwardQuery, InboundRecord, LogStore};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
struct WebhookUpdate {
    message: Option<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    message_id: i64,
    chat: WebhookChat,
    #[serde(default)]
    is_automatic_forward: bool,
    forward_from_message_id: Option<i64>,
    forward_from_chat: Option<WebhookChat>,
}

#[derive(Debug, Deserialize)]
struct WebhookChat {
    id: i64,
    username: Option<String>,
}

pub struct ThreadDiscoveryScanner {
    log_store: Arc<dyn LogStore>,
    /// Channel the original post was sent to, numeric id or `@username`
    source_channel: String,
    discussion_group_id: Option<i64>,
    config: ThreadDiscoveryConfig,
}

impl ThreadDiscoveryScanner {
    pub fn new(
        log_store: Arc<dyn LogStore>,
        source_channel: impl Into<String>,
        discussion_group_id: Option<i64>,
        config: ThreadDiscoveryConfig,
    ) -> Self {
        Self {
            log_store,
            source_channel: source_channel.into(),
            discussion_group_id,
            config,
        }
    }

    /// Find the discussion-group copy of `original_message_id`.
    ///
    /// Sleeps `interval` between attempts, never after the last one.
    /// `Ok(None)` means the comment thread could not be located.
    pub async fn find_thread_id(&self, original_message_id: i64) -> Result<Option<i64>> {
        let Some(discussion_group_id) = self.discussion_group_id else {
            error!(
                original_message_id = original_message_id,
                "Discussion group not configured, cannot locate comment thread"
            );
            return Ok(None);
        };

        let lookback = chrono::Duration::from_std(self.config.lookback()).map_err(|e| {
            AuctionError::ConfigurationError(format!("thread discovery lookback out of range: {e}"))
        })?;

        for attempt in 1..=self.config.max_attempts {
            let query = AutoForwardQuery {
                url_tag: self.config.webhook_url_tag.clone(),
                received_since: Utc::now() - lookback,
                forward_from_message_id: original_message_id,
                discussion_group_id,
                limit: self.config.candidate_limit,
            };

            let candidates = self.log_store.recent_auto_forwards(&query).await?;

            if let Some(thread_id) = candidates
                .iter()
                .find_map(|record| self.verify_candidate(record, original_message_id, discussion_group_id))
            {
                info!(
                    original_message_id = original_message_id,
                    thread_id = thread_id,
                    attempt = attempt,
                    "🧵 Located comment thread"
                );
                return Ok(Some(thread_id));
            }

            debug!(
                original_message_id = original_message_id,
                attempt = attempt,
                candidates = candidates.len(),
                "Auto-forward not yet recorded"
            );

            if attempt < self.config.max_attempts {
                sleep(self.config.interval()).await;
            }
        }

        warn!(
            original_message_id = original_message_id,
            attempts = self.config.max_attempts,
            "Comment thread not found, comment skipped"
        );
        Ok(None)
    }

    fn verify_candidate(
        &self,
        record: &InboundRecord,
        original_message_id: i64,
        discussion_group_id: i64,
    ) -> Option<i64> {
        let body = record.request_data.as_deref()?;
        let update: WebhookUpdate = match serde_json::from_str(body) {
            Ok(update) => update,
            Err(e) => {
                debug!(record_id = record.id, error = %e, "Skipping unparseable webhook record");
                return None;
            }
        };
        let message = update.message?;

        let is_match = message.is_automatic_forward
            && message.forward_from_message_id == Some(original_message_id)
            && message.chat.id == discussion_group_id
            && message
                .forward_from_chat
                .as_ref()
                .is_some_and(|chat| self.is_source_channel(chat));

        is_match.then_some(message.message_id)
    }

    fn is_source_channel(&self, chat: &WebhookChat) -> bool {
        let configured = self.source_channel.trim();
        match configured.strip_prefix('@') {
            Some(username) => chat
                .username
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(username)),
            None => configured.parse::<i64>().is_ok_and(|id| id == chat.id),
        }
    }
}
