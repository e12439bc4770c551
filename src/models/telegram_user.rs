use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Telegram identity that submitted orders
/// Maps to `telegram_users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TelegramUser {
    pub uid: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl TelegramUser {
    /// Username usable as an `@handle`, if the user has one
    pub fn handle(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(|name| name.trim_start_matches('@'))
            .filter(|name| !name.is_empty())
    }

    pub async fn find_by_uid(pool: &PgPool, uid: i64) -> Result<Option<TelegramUser>, sqlx::Error> {
        sqlx::query_as::<_, TelegramUser>(
            "SELECT uid, username, first_name FROM telegram_users WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(pool)
        .await
    }
}
