use crate::gateway::{MediaAttachment, MediaKind};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::warn;

/// File attached to an order at intake
/// Maps to `order_media` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderMedia {
    pub id: i64,
    pub order_id: i64,
    pub file_type: String,
    pub telegram_file_id: Option<String>,
}

impl OrderMedia {
    /// Media already uploaded to Telegram can be re-sent by file id; the rest
    /// is skipped
    pub fn to_attachment(&self) -> Option<MediaAttachment> {
        let file_id = self.telegram_file_id.as_deref().filter(|id| !id.is_empty())?;
        match self.file_type.parse::<MediaKind>() {
            Ok(kind) => Some(MediaAttachment {
                kind,
                file_id: file_id.to_string(),
            }),
            Err(e) => {
                warn!(media_id = self.id, order_id = self.order_id, error = %e, "Skipping media with unknown type");
                None
            }
        }
    }

    pub async fn for_order(pool: &PgPool, order_id: i64) -> Result<Vec<OrderMedia>, sqlx::Error> {
        sqlx::query_as::<_, OrderMedia>(
            r#"
            SELECT id, order_id, file_type, telegram_file_id
            FROM order_media
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }
}
