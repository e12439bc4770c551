//! # Pipeline Configuration
//!
//! Layered configuration for the claim and publish workers: built-in
//! defaults, an optional TOML file, then `AUCTION__SECTION__KEY` environment
//! overrides (see [`loader::ConfigManager`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auction_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load(None)?;
//!
//! let window = manager.config().workers.max_execution_window();
//! let channel = manager.config().auction.channel_id.clone();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::{retry, thread_discovery, timing};
use crate::error::{AuctionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/auction.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Messaging gateway (Telegram Bot API) settings
    pub telegram: TelegramConfig,

    /// Review notification destination
    pub admin: AdminConfig,

    /// Auction channel topology and announcement content
    pub auction: AuctionChannelConfig,

    /// Poll-loop timing
    pub workers: WorkerConfig,

    /// Transient error retry policy for the gateway
    pub retry: RetryConfig,

    /// Auto-forward correlation search
    pub thread_discovery: ThreadDiscoveryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/auction_development".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: "https://api.telegram.org".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

// Keeps the token out of debug logs
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[MASKED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Chat that receives review requests
    pub chat_id: Option<String>,
}

impl AdminConfig {
    pub fn require_chat_id(&self) -> Result<&str> {
        self.chat_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AuctionError::ConfigurationError("admin.chat_id not configured".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuctionChannelConfig {
    /// Public auction channel, numeric id or `@username`
    pub channel_id: Option<String>,
    /// Discussion group linked to the channel
    pub discussion_group_id: Option<i64>,
    /// Optional group the channel post is forwarded to
    pub repost_group_id: Option<String>,
    /// Forum topic inside the repost group
    pub repost_topic_id: Option<i64>,
    /// Comment posted under each new lot
    pub comment_text: String,
    /// Minimum raise shown in the announcement
    pub bid_step: i64,
    /// Promotional lines appended to every announcement
    pub footer_lines: Vec<String>,
}

impl Default for AuctionChannelConfig {
    fn default() -> Self {
        Self {
            channel_id: None,
            discussion_group_id: None,
            repost_group_id: None,
            repost_topic_id: None,
            comment_text: "Place your bids".to_string(),
            bid_step: 10,
            footer_lines: vec![
                "👉<b>To join the lot follow the link:</b>  👈".to_string(),
                "<b>Want to sell? Message us:</b> @AuctionsIsrBot".to_string(),
                "<b>Auction channel:</b> https://t.me/Auction_Israel".to_string(),
            ],
        }
    }
}

impl AuctionChannelConfig {
    pub fn require_channel_id(&self) -> Result<&str> {
        self.channel_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AuctionError::ConfigurationError("auction.channel_id not configured".into())
            })
    }

    pub fn repost_group(&self) -> Option<&str> {
        self.repost_group_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub max_execution_seconds: u64,
    pub idle_backoff_ms: u64,
    pub stale_claim_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_execution_seconds: timing::MAX_EXECUTION_WINDOW.as_secs(),
            idle_backoff_ms: timing::IDLE_BACKOFF.as_millis() as u64,
            stale_claim_seconds: timing::STALE_CLAIM_THRESHOLD.as_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn max_execution_window(&self) -> Duration {
        Duration::from_secs(self.max_execution_seconds)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    pub fn stale_claim_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_claim_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            delay_ms: retry::DELAY.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThreadDiscoveryConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub lookback_seconds: u64,
    pub candidate_limit: i64,
    pub webhook_url_tag: String,
}

impl Default for ThreadDiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: thread_discovery::MAX_ATTEMPTS,
            interval_ms: thread_discovery::INTERVAL.as_millis() as u64,
            lookback_seconds: thread_discovery::LOOKBACK.as_secs(),
            candidate_limit: thread_discovery::CANDIDATE_LIMIT,
            webhook_url_tag: thread_discovery::WEBHOOK_URL_TAG.to_string(),
        }
    }
}

impl ThreadDiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_seconds)
    }
}

impl AuctionConfig {
    /// Validate numeric preconditions. Destination ids are checked where
    /// they are used, since each worker needs a different subset.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AuctionError::ConfigurationError(
                "database.url must not be empty".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(AuctionError::ConfigurationError(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(AuctionError::ConfigurationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.thread_discovery.max_attempts == 0 {
            return Err(AuctionError::ConfigurationError(
                "thread_discovery.max_attempts must be at least 1".into(),
            ));
        }

        if self.thread_discovery.candidate_limit < 1 {
            return Err(AuctionError::ConfigurationError(
                "thread_discovery.candidate_limit must be at least 1".into(),
            ));
        }

        if self.workers.max_execution_seconds == 0 {
            return Err(AuctionError::ConfigurationError(
                "workers.max_execution_seconds must be greater than 0".into(),
            ));
        }

        // Zero would poll the database continuously while the queue is empty
        if self.workers.idle_backoff_ms == 0 {
            return Err(AuctionError::ConfigurationError(
                "workers.idle_backoff_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
