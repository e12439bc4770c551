//! # Inbound Request Log
//!
//! Every inbound webhook call is recorded in `request_logs` by the HTTP
//! layer. The pipeline only reads it, to find the discussion-group copy of a
//! freshly posted channel message.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// A recorded inbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InboundRecord {
    pub id: i64,
    pub method: String,
    pub url: String,
    /// Raw JSON body as received
    pub request_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Coarse pre-filter for auto-forward candidates. Matching is textual; the
/// caller verifies each candidate against the parsed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoForwardQuery {
    pub url_tag: String,
    pub received_since: DateTime<Utc>,
    pub forward_from_message_id: i64,
    pub discussion_group_id: i64,
    pub limit: i64,
}

impl AutoForwardQuery {
    /// Payload fragments every candidate must contain
    pub fn payload_fragments(&self) -> [String; 3] {
        [
            r#""is_automatic_forward":true"#.to_string(),
            format!(r#""forward_from_message_id":{}"#, self.forward_from_message_id),
            format!(r#""chat":{{"id":{}"#, self.discussion_group_id),
        ]
    }

    /// In-process equivalent of the SQL pre-filter
    pub fn matches(&self, record: &InboundRecord) -> bool {
        if !record.url.contains(&self.url_tag) || record.created_at < self.received_since {
            return false;
        }
        let Some(body) = record.request_data.as_deref() else {
            return false;
        };
        self.payload_fragments()
            .iter()
            .all(|fragment| body.contains(fragment.as_str()))
    }
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Newest first, at most `query.limit` records
    async fn recent_auto_forwards(&self, query: &AutoForwardQuery) -> Result<Vec<InboundRecord>>;
}

pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn recent_auto_forwards(&self, query: &AutoForwardQuery) -> Result<Vec<InboundRecord>> {
        let [automatic, forwarded_from, chat] = query.payload_fragments();

        let records = sqlx::query_as::<_, InboundRecord>(
            r#"
            SELECT id, method, url, request_data, created_at
            FROM request_logs
            WHERE url LIKE $1
              AND created_at >= $2
              AND request_data LIKE $3
              AND request_data LIKE $4
              AND request_data LIKE $5
            ORDER BY created_at DESC, id DESC
            LIMIT $6
            "#,
        )
        .bind(like_pattern(&query.url_tag))
        .bind(query.received_since)
        .bind(like_pattern(&automatic))
        .bind(like_pattern(&forwarded_from))
        .bind(like_pattern(&chat))
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
