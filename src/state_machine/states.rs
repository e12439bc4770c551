use serde::{Deserialize, Serialize};
use std::fmt;

/// Admin review progress of an order.
///
/// Persisted as the SMALLINT codes used by the intake API, so the numeric
/// values are part of the storage format and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCheck {
    /// Submitted, waiting to be sent to the admin
    New,
    /// Delivered to the admin, waiting for a decision
    Sended,
    /// Rejected by the admin
    Blocked,
    /// Accepted by the admin
    InWork,
    /// Marked unusable by downstream processing
    Broken,
    /// Claimed by an admin notification worker
    Sending,
}

impl ReviewCheck {
    pub fn code(&self) -> i16 {
        match self {
            Self::New => 0,
            Self::Sended => 1,
            Self::Blocked => 2,
            Self::InWork => 3,
            Self::Broken => 4,
            Self::Sending => 5,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, String> {
        match code {
            0 => Ok(Self::New),
            1 => Ok(Self::Sended),
            2 => Ok(Self::Blocked),
            3 => Ok(Self::InWork),
            4 => Ok(Self::Broken),
            5 => Ok(Self::Sending),
            _ => Err(format!("Invalid review check code: {code}")),
        }
    }

    /// Check if a worker currently holds the review claim
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Sending)
    }
}

impl fmt::Display for ReviewCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Sended => write!(f, "sended"),
            Self::Blocked => write!(f, "blocked"),
            Self::InWork => write!(f, "in_work"),
            Self::Broken => write!(f, "broken"),
            Self::Sending => write!(f, "sending"),
        }
    }
}

impl std::str::FromStr for ReviewCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "sended" => Ok(Self::Sended),
            "blocked" => Ok(Self::Blocked),
            "in_work" => Ok(Self::InWork),
            "broken" => Ok(Self::Broken),
            "sending" => Ok(Self::Sending),
            _ => Err(format!("Invalid review check: {s}")),
        }
    }
}

/// Derived lifecycle status of an order.
///
/// Never assigned directly; see [`super::lifecycle::derive_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    RejectedByAdmin,
    InWork,
    Broken,
    Closed,
}

impl OrderStatus {
    pub fn code(&self) -> i16 {
        match self {
            Self::New => 0,
            Self::RejectedByAdmin => 2,
            Self::InWork => 3,
            Self::Broken => 4,
            Self::Closed => 8,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, String> {
        match code {
            0 => Ok(Self::New),
            2 => Ok(Self::RejectedByAdmin),
            3 => Ok(Self::InWork),
            4 => Ok(Self::Broken),
            8 => Ok(Self::Closed),
            _ => Err(format!("Invalid order status code: {code}")),
        }
    }

    /// Check if this is a terminal state for the order lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RejectedByAdmin | Self::Broken | Self::Closed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::RejectedByAdmin => write!(f, "rejected_by_admin"),
            Self::InWork => write!(f, "in_work"),
            Self::Broken => write!(f, "broken"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Publication state of an approved order. `None` on the order means
/// "not yet picked up by a publisher".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Claimed by a publisher, protocol in flight
    Publishing,
    /// Posted to the channel
    Published,
    /// Publish protocol failed; not retried automatically
    Failed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Failed)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publishing" => Ok(Self::Publishing),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid auction status: {s}")),
        }
    }
}

/// Default state for new orders
impl Default for ReviewCheck {
    fn default() -> Self {
        Self::New
    }
}
