//! # Pipeline Constants
//!
//! Fixed values that define the operational boundaries of the claim and
//! publish workers. Anything an operator may want to tune lives in
//! [`crate::config`]; the defaults there are taken from this module.

use std::time::Duration;

// Re-export state types for convenience
pub use crate::state_machine::{AuctionStatus, OrderStatus, ReviewCheck};

/// Worker loop timing
pub mod timing {
    use super::Duration;

    /// Wall-clock window for one worker invocation
    pub const MAX_EXECUTION_WINDOW: Duration = Duration::from_secs(55);

    /// Sleep when no claimable row was found
    pub const IDLE_BACKOFF: Duration = Duration::from_secs(1);

    /// Age after which a review claim is considered abandoned
    pub const STALE_CLAIM_THRESHOLD: Duration = Duration::from_secs(5 * 60);
}

/// Messaging gateway retry policy
pub mod retry {
    use super::Duration;

    pub const MAX_ATTEMPTS: u32 = 3;
    pub const DELAY: Duration = Duration::from_secs(2);

    /// Upstream status codes treated as transient
    pub const TRANSIENT_ERROR_CODES: &[u16] = &[502, 503];
}

/// Thread discovery over the inbound webhook log
pub mod thread_discovery {
    use super::Duration;

    pub const MAX_ATTEMPTS: u32 = 10;
    pub const INTERVAL: Duration = Duration::from_secs(2);
    pub const LOOKBACK: Duration = Duration::from_secs(5 * 60);
    pub const CANDIDATE_LIMIT: i64 = 1;
    pub const WEBHOOK_URL_TAG: &str = "/api/telegram/assistant_webhook";
}

/// Idempotency tags attached to outbound messages
pub mod tags {
    pub fn admin_order(order_id: i64) -> String {
        format!("admin_order_{order_id}")
    }

    pub fn auction_post(order_id: i64) -> String {
        format!("auction_{order_id}")
    }

    pub fn auction_comment(order_id: i64) -> String {
        format!("auction_comm_{order_id}")
    }
}

/// Inline keyboard callback payloads consumed by the bot
pub mod callbacks {
    pub fn accept_order(order_id: i64) -> String {
        format!("admin_acceptOrder_{order_id}")
    }

    pub fn reject_order(order_id: i64) -> String {
        format!("admin_rejectOrder_{order_id}")
    }
}

/// Core system values
pub mod system {
    /// Current crate version for logging
    pub const AUCTION_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Telegram caption limit for media messages
    pub const MAX_CAPTION_LENGTH: usize = 1024;

    /// Telegram media group size limit
    pub const MAX_MEDIA_GROUP_SIZE: usize = 10;
}
