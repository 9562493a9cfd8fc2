//! Canonical status sentinels for events and invites
//!
//! Event status lives in a server-side enum column whose accepted values
//! differ between deployments; `EVENT_STATUS_FINISHED` is the substitute
//! the archive path falls back to when `EVENT_STATUS_ARCHIVED` is rejected.

use serde::{Deserialize, Serialize};

/// Event is open and accepting participants
pub const EVENT_STATUS_ACTIVE: &str = "ACTIVE";

/// Event has been archived by its host (preferred sentinel)
pub const EVENT_STATUS_ARCHIVED: &str = "ARCHIVED";

/// Fallback sentinel for deployments whose status enum predates ARCHIVED
pub const EVENT_STATUS_FINISHED: &str = "FINISHED";

/// Event was cancelled before it took place
pub const EVENT_STATUS_CANCELLED: &str = "CANCELLED";

/// Status of an event invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    /// Sent, awaiting a response
    Pending,
    /// Recipient accepted and joined the event
    Accepted,
    /// Recipient declined
    Declined,
}

impl InviteStatus {
    /// Database string representation of this status
    pub fn as_db_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Declined => "DECLINED",
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}
