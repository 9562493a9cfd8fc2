//! Schema generation selector
//!
//! The remote store exists in two parallel table layouts ("legacy" and "v2")
//! representing successive migrations that may coexist in a deployment.
//! Once a logical operation lands in one generation, every dependent write
//! must target the same generation.

use serde::{Deserialize, Serialize};

/// Which of the two parallel table layouts a logical operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    /// Original table layout (`events`, `event_participants`, ...)
    Legacy,
    /// Migrated table layout (`events_v2`, `event_participants_v2`, ...)
    V2,
}

impl SchemaGeneration {
    /// Events table name for this generation
    pub fn events_table(self) -> &'static str {
        match self {
            SchemaGeneration::Legacy => "events",
            SchemaGeneration::V2 => "events_v2",
        }
    }

    /// Participants table name for this generation
    pub fn participants_table(self) -> &'static str {
        match self {
            SchemaGeneration::Legacy => "event_participants",
            SchemaGeneration::V2 => "event_participants_v2",
        }
    }

    /// Invites table name for this generation
    pub fn invites_table(self) -> &'static str {
        match self {
            SchemaGeneration::Legacy => "event_invites",
            SchemaGeneration::V2 => "event_invites_v2",
        }
    }

    /// The generation to try next when this one's tables are absent
    ///
    /// Legacy falls back to V2; V2 is the last resort and has no fallback.
    pub fn fallback(self) -> Option<SchemaGeneration> {
        match self {
            SchemaGeneration::Legacy => Some(SchemaGeneration::V2),
            SchemaGeneration::V2 => None,
        }
    }
}

impl std::fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaGeneration::Legacy => write!(f, "legacy"),
            SchemaGeneration::V2 => write!(f, "v2"),
        }
    }
}
