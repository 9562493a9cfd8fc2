//! Event operations with dual-generation fallback
//!
//! `create_event` is the entry point of the generation orchestration: it
//! tries the legacy tables first and falls back to v2 when the legacy
//! relation is absent (or unrecoverably failing). The returned
//! [`EventHandle`] records which generation the event landed in; every
//! dependent write in the same logical operation takes the handle and
//! targets that generation only.

use chrono::{DateTime, Utc};
use radar_core_types::status::{
    EVENT_STATUS_ACTIVE, EVENT_STATUS_ARCHIVED, EVENT_STATUS_CANCELLED, EVENT_STATUS_FINISHED,
};
use radar_core_types::SchemaGeneration;
use radar_postgrest::{Filter, Row, Transport};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::adaptive::{adaptive_insert, adaptive_update, WriteOutcome, WritePolicy};
use crate::errors::{RadarError, Result};

/// An event plus the schema generation its row lives in
///
/// Threading the handle through dependent operations is what keeps one
/// logical operation from straddling generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandle {
    /// Server-side event id
    pub event_id: String,
    /// Generation the event row landed in
    pub generation: SchemaGeneration,
}

/// Caller-supplied fields for a new event
///
/// The draft is schema-agnostic; [`EventDraft::payload`] shapes it for a
/// concrete generation (the two layouts name their columns differently).
/// Optional columns that a given deployment lacks are stripped by the
/// adaptive shim at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Event title (must not be empty or whitespace-only)
    pub title: String,
    /// Hosting user id
    pub host_id: String,
    /// Optional long description
    pub description: Option<String>,
    /// Optional venue name (legacy column `church_name`)
    pub venue: Option<String>,
    /// Optional start time
    pub starts_at: Option<DateTime<Utc>>,
    /// Optional end time
    pub ends_at: Option<DateTime<Utc>>,
    /// Optional participant capacity
    pub capacity: Option<u64>,
    /// Whether joins require host approval
    pub requires_approval: bool,
}

impl EventDraft {
    /// Create a draft with the required fields
    pub fn new(title: impl Into<String>, host_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            host_id: host_id.into(),
            description: None,
            venue: None,
            starts_at: None,
            ends_at: None,
            capacity: None,
            requires_approval: false,
        }
    }

    /// Shape this draft into an insert payload for the given generation
    pub fn payload(&self, generation: SchemaGeneration, event_id: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(event_id));
        row.insert("status".to_string(), json!(EVENT_STATUS_ACTIVE));
        row.insert(
            "requires_approval".to_string(),
            json!(self.requires_approval),
        );
        if let Some(description) = &self.description {
            row.insert("description".to_string(), json!(description));
        }
        match generation {
            SchemaGeneration::Legacy => {
                row.insert("title".to_string(), json!(self.title));
                row.insert("created_by".to_string(), json!(self.host_id));
                if let Some(venue) = &self.venue {
                    row.insert("church_name".to_string(), json!(venue));
                }
                if let Some(starts_at) = &self.starts_at {
                    row.insert("start_time".to_string(), json!(starts_at.to_rfc3339()));
                }
                if let Some(ends_at) = &self.ends_at {
                    row.insert("end_time".to_string(), json!(ends_at.to_rfc3339()));
                }
                if let Some(capacity) = self.capacity {
                    row.insert("max_participants".to_string(), json!(capacity));
                }
            }
            SchemaGeneration::V2 => {
                row.insert("name".to_string(), json!(self.title));
                row.insert("host_id".to_string(), json!(self.host_id));
                if let Some(venue) = &self.venue {
                    row.insert("venue".to_string(), json!(venue));
                }
                if let Some(starts_at) = &self.starts_at {
                    row.insert("starts_at".to_string(), json!(starts_at.to_rfc3339()));
                }
                if let Some(ends_at) = &self.ends_at {
                    row.insert("ends_at".to_string(), json!(ends_at.to_rfc3339()));
                }
                if let Some(capacity) = self.capacity {
                    row.insert("capacity".to_string(), json!(capacity));
                }
            }
        }
        row
    }
}

/// The subset of an event row the client logic needs
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event id
    pub id: String,
    /// Title (`title` in legacy rows, `name` in v2 rows)
    pub title: String,
    /// Current status sentinel
    pub status: String,
    /// Participant capacity, when the deployment has the column
    pub capacity: Option<u64>,
    /// Whether joins require host approval
    pub requires_approval: bool,
}

/// Create an event, landing it in whichever schema generation this
/// deployment provides
///
/// Tries the legacy generation first; on a missing relation (or an
/// unrecoverable failure) re-shapes the payload for the next generation
/// and retries there.
///
/// # Errors
///
/// * `InvalidTitle` - empty or whitespace-only title
/// * `WriteDenied` - the insert was rejected by row-level security
/// * `NoUsableGeneration` - no generation has the events table
/// * the last generation's failure when every generation fails
pub fn create_event(transport: &dyn Transport, draft: &EventDraft) -> Result<EventHandle> {
    if draft.title.trim().is_empty() {
        return Err(RadarError::InvalidTitle {
            reason: "Title cannot be empty or whitespace-only".to_string(),
        });
    }

    let event_id = Uuid::now_v7().to_string();
    let mut generation = SchemaGeneration::Legacy;

    loop {
        let payload = draft.payload(generation, &event_id);
        let table = generation.events_table();
        let attempt = adaptive_insert(transport, table, payload, Some("id"), &WritePolicy::default());

        match attempt {
            Ok(WriteOutcome::Written(row)) => {
                let id = row
                    .as_ref()
                    .and_then(returned_id)
                    .unwrap_or_else(|| event_id.clone());
                return Ok(EventHandle {
                    event_id: id,
                    generation,
                });
            }
            // Duplicate cannot occur under the default policy, but the row
            // existing still means the handle is valid.
            Ok(WriteOutcome::Duplicate) => {
                return Ok(EventHandle {
                    event_id,
                    generation,
                });
            }
            Ok(WriteOutcome::Denied) => {
                return Err(RadarError::WriteDenied {
                    table: table.to_string(),
                });
            }
            Ok(WriteOutcome::MissingRelation) => match generation.fallback() {
                Some(next) => {
                    warn!(from = %generation, to = %next, "events table absent, falling back");
                    generation = next;
                }
                None => {
                    return Err(RadarError::NoUsableGeneration {
                        table: table.to_string(),
                    });
                }
            },
            Err(err) => match generation.fallback() {
                Some(next) => {
                    warn!(from = %generation, to = %next, %err, "create failed, trying next generation");
                    generation = next;
                }
                None => return Err(err),
            },
        }
    }
}

/// Read one event row
///
/// # Errors
///
/// * `EventNotFound` - no row matches the handle
/// * `MalformedRow` - the row lacks the fields we need
/// * `Transport` - the read failed
pub fn get_event(transport: &dyn Transport, handle: &EventHandle) -> Result<EventRecord> {
    let table = handle.generation.events_table();
    let rows = transport
        .select(table, &[Filter::eq("id", &handle.event_id)], "*")
        .map_err(|e| RadarError::Transport {
            table: table.to_string(),
            message: e.to_string(),
        })?;
    let row = rows.first().ok_or_else(|| RadarError::EventNotFound {
        event_id: handle.event_id.clone(),
    })?;
    parse_event_row(table, row)
}

/// Update an event's title and/or description
///
/// # Errors
///
/// * `InvalidTitle` - title provided but empty or whitespace-only
/// * `WriteDenied` / `NoUsableGeneration` / write failures as in
///   [`create_event`]
pub fn update_event(
    transport: &dyn Transport,
    handle: &EventHandle,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let mut patch = Row::new();
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(RadarError::InvalidTitle {
                reason: "Title cannot be empty or whitespace-only".to_string(),
            });
        }
        let column = match handle.generation {
            SchemaGeneration::Legacy => "title",
            SchemaGeneration::V2 => "name",
        };
        patch.insert(column.to_string(), json!(title));
    }
    if let Some(description) = description {
        patch.insert("description".to_string(), json!(description));
    }
    if patch.is_empty() {
        return Ok(());
    }
    set_event_fields(transport, handle, patch, &WritePolicy::default())
}

/// Archive an event
///
/// Sets `status = "ARCHIVED"`; if the deployment's status enum predates
/// that sentinel, the shim substitutes `"FINISHED"` once and retries.
///
/// # Errors
///
/// Same failure surface as [`update_event`].
pub fn archive_event(transport: &dyn Transport, handle: &EventHandle) -> Result<()> {
    let mut patch = Row::new();
    patch.insert("status".to_string(), json!(EVENT_STATUS_ARCHIVED));
    set_event_fields(
        transport,
        handle,
        patch,
        &WritePolicy::archival(EVENT_STATUS_ARCHIVED, EVENT_STATUS_FINISHED),
    )
}

/// Cancel an event before it takes place
///
/// # Errors
///
/// Same failure surface as [`update_event`].
pub fn cancel_event(transport: &dyn Transport, handle: &EventHandle) -> Result<()> {
    let mut patch = Row::new();
    patch.insert("status".to_string(), json!(EVENT_STATUS_CANCELLED));
    set_event_fields(transport, handle, patch, &WritePolicy::default())
}

fn set_event_fields(
    transport: &dyn Transport,
    handle: &EventHandle,
    patch: Row,
    policy: &WritePolicy,
) -> Result<()> {
    let table = handle.generation.events_table();
    let outcome = adaptive_update(
        transport,
        table,
        &[Filter::eq("id", &handle.event_id)],
        patch,
        policy,
    )?;
    match outcome {
        WriteOutcome::Written(_) | WriteOutcome::Duplicate => Ok(()),
        WriteOutcome::Denied => Err(RadarError::WriteDenied {
            table: table.to_string(),
        }),
        WriteOutcome::MissingRelation => Err(RadarError::NoUsableGeneration {
            table: table.to_string(),
        }),
    }
}

/// Interpret a raw event row leniently
///
/// Tolerates either generation's column names and absent optional columns;
/// reads never strip-and-retry, they just cope with what came back.
pub fn parse_event_row(table: &str, row: &Value) -> Result<EventRecord> {
    let object = row.as_object().ok_or_else(|| RadarError::MalformedRow {
        table: table.to_string(),
        reason: "row is not an object".to_string(),
    })?;
    let id = object
        .get("id")
        .and_then(field_as_string)
        .ok_or_else(|| RadarError::MalformedRow {
            table: table.to_string(),
            reason: "missing id".to_string(),
        })?;
    let title = object
        .get("title")
        .or_else(|| object.get("name"))
        .and_then(field_as_string)
        .unwrap_or_default();
    let status = object
        .get("status")
        .and_then(field_as_string)
        .unwrap_or_else(|| EVENT_STATUS_ACTIVE.to_string());
    let capacity = object
        .get("capacity")
        .or_else(|| object.get("max_participants"))
        .and_then(Value::as_u64);
    let requires_approval = object
        .get("requires_approval")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(EventRecord {
        id,
        title,
        status,
        capacity,
        requires_approval,
    })
}

/// Extract the id from a returned representation row
fn returned_id(row: &Value) -> Option<String> {
    row.get("id").and_then(field_as_string)
}

/// String view of a field that may be a string or a number
fn field_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
