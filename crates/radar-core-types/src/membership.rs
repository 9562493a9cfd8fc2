//! Participant membership state machine
//!
//! `None -> Pending -> Joined | Rejected` (approval required),
//! `None -> Joined` (open join), `Joined -> Left` (self-exit).
//! `Rejected` and `Left` are terminal; `Joined` holds until an explicit leave.

use serde::{Deserialize, Serialize};

/// Membership status of a user relative to one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    /// Not a participant (no row, or an explicit NONE row)
    None,
    /// Join requested, awaiting host decision
    Pending,
    /// Full participant
    Joined,
    /// Left after having joined
    Left,
    /// Join request rejected by the host
    Rejected,
}

impl MembershipStatus {
    /// Database string representation of this status
    pub fn as_db_str(self) -> &'static str {
        match self {
            MembershipStatus::None => "NONE",
            MembershipStatus::Pending => "PENDING",
            MembershipStatus::Joined => "JOINED",
            MembershipStatus::Left => "LEFT",
            MembershipStatus::Rejected => "REJECTED",
        }
    }

    /// Parse a database string into a status
    ///
    /// Matching is case-insensitive; unknown strings yield `None` (the
    /// caller-facing meaning of a row we cannot interpret is "not a member").
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Some(MembershipStatus::None),
            "PENDING" => Some(MembershipStatus::Pending),
            "JOINED" => Some(MembershipStatus::Joined),
            "LEFT" => Some(MembershipStatus::Left),
            "REJECTED" => Some(MembershipStatus::Rejected),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition(self, next: MembershipStatus) -> bool {
        matches!(
            (self, next),
            (MembershipStatus::None, MembershipStatus::Pending)
                | (MembershipStatus::None, MembershipStatus::Joined)
                | (MembershipStatus::Pending, MembershipStatus::Joined)
                | (MembershipStatus::Pending, MembershipStatus::Rejected)
                | (MembershipStatus::Joined, MembershipStatus::Left)
        )
    }

    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(self) -> bool {
        matches!(self, MembershipStatus::Left | MembershipStatus::Rejected)
    }

    /// Whether this status counts against event capacity
    pub fn is_joined(self) -> bool {
        matches!(self, MembershipStatus::Joined)
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}
