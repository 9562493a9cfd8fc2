use radar_core_types::MembershipStatus;
use thiserror::Error;

/// Result type alias using RadarError
pub type Result<T> = std::result::Result<T, RadarError>;

/// Error taxonomy for Radar client operations
///
/// Expected classification outcomes (missing relation, permission denial,
/// duplicate key) are not errors: they travel through
/// [`crate::adaptive::WriteOutcome`] so callers can choose a fallback.
/// Variants here are the genuinely failing paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RadarError {
    /// Event row not found
    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    /// Event is at capacity (best-effort client-side check)
    #[error("Event {event_id} is full (capacity {capacity})")]
    EventFull { event_id: String, capacity: u64 },

    /// Invite row not found
    #[error("Invite not found: {invite_id}")]
    InviteNotFound { invite_id: String },

    /// Membership transition is not allowed by the state machine
    #[error("Illegal membership transition: {from} -> {to}")]
    IllegalTransition {
        from: MembershipStatus,
        to: MembershipStatus,
    },

    /// Event title failed validation
    #[error("Invalid event title: {reason}")]
    InvalidTitle { reason: String },

    /// Comment body failed validation
    #[error("Invalid comment: {reason}")]
    InvalidComment { reason: String },

    /// Write denied by row-level security in a context where it is required
    #[error("Write to {table} denied by the server")]
    WriteDenied { table: String },

    /// The target table is absent and no further generation exists to try
    #[error("No schema generation provides table {table}")]
    NoUsableGeneration { table: String },

    /// The bounded retry budget was exhausted
    #[error("Write to {table} failed after {attempts} attempts")]
    WriteExhausted { table: String, attempts: u32 },

    /// Unclassified transport failure
    #[error("Transport error on {table}: {message}")]
    Transport { table: String, message: String },

    /// Remote procedure failed for a reason that has no fallback
    #[error("Remote procedure {function} failed: {message}")]
    Rpc { function: String, message: String },

    /// A row came back in a shape we cannot interpret
    #[error("Malformed row from {table}: {reason}")]
    MalformedRow { table: String, reason: String },
}
