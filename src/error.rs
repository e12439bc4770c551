//! Error types for the auction pipeline.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuctionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Gateway error: {0}")]
    GatewayError(String),
    #[error("Publish failed for order {order_id}: {reason}")]
    PublishError { order_id: i64, reason: String },
    #[error("Location error: {0}")]
    LocationError(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl AuctionError {
    /// Configuration problems are never worth retrying within the same run
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuctionError::ConfigurationError(_))
    }
}

impl From<sqlx::Error> for AuctionError {
    fn from(err: sqlx::Error) -> Self {
        AuctionError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AuctionError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AuctionError::DatabaseError(format!("Migration failed: {err}"))
    }
}

impl From<serde_json::Error> for AuctionError {
    fn from(error: serde_json::Error) -> Self {
        AuctionError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for AuctionError {
    fn from(error: config::ConfigError) -> Self {
        AuctionError::ConfigurationError(error.to_string())
    }
}

impl From<reqwest::Error> for AuctionError {
    fn from(error: reqwest::Error) -> Self {
        AuctionError::GatewayError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuctionError>;
