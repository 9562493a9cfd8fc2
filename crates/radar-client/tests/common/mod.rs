use radar_client::EventHandle;
use radar_core_types::SchemaGeneration;
use radar_postgrest::{MockTransport, Row, TransportError};
use serde_json::Value;

/// Create an empty scripted mock transport
#[allow(dead_code)]
pub fn mock() -> MockTransport {
    MockTransport::new()
}

/// Handle for an event that landed in the legacy generation
#[allow(dead_code)]
pub fn legacy_handle() -> EventHandle {
    EventHandle {
        event_id: "event-1".to_string(),
        generation: SchemaGeneration::Legacy,
    }
}

/// Handle for an event that landed in the v2 generation
#[allow(dead_code)]
pub fn v2_handle() -> EventHandle {
    EventHandle {
        event_id: "event-1".to_string(),
        generation: SchemaGeneration::V2,
    }
}

/// Build a payload row from key/value pairs
#[allow(dead_code)]
pub fn row(pairs: &[(&str, Value)]) -> Row {
    let mut row = Row::new();
    for (key, value) in pairs {
        row.insert((*key).to_string(), value.clone());
    }
    row
}

/// Server error: the named column does not exist
#[allow(dead_code)]
pub fn missing_column(column: &str) -> TransportError {
    TransportError::message(format!(
        "column \"{column}\" of relation \"events\" does not exist"
    ))
    .with_code("42703")
}

/// Server error: the named relation does not exist
#[allow(dead_code)]
pub fn missing_relation(table: &str) -> TransportError {
    TransportError::message(format!("relation \"public.{table}\" does not exist"))
        .with_code("42P01")
}

/// Server error: row-level security denial
#[allow(dead_code)]
pub fn permission_denied(table: &str) -> TransportError {
    TransportError::message(format!(
        "new row violates row-level security policy for table \"{table}\""
    ))
    .with_code("42501")
}

/// Server error: unique-constraint violation
#[allow(dead_code)]
pub fn duplicate_key() -> TransportError {
    TransportError::message("duplicate key value violates unique constraint \"pkey\"")
        .with_code("23505")
}

/// Server error: the status enum rejected a value
#[allow(dead_code)]
pub fn enum_violation(value: &str) -> TransportError {
    TransportError::message(format!(
        "invalid input value for enum event_status: \"{value}\""
    ))
    .with_code("22P02")
}

/// Server error: the named stored procedure is not deployed
#[allow(dead_code)]
pub fn missing_function(function: &str) -> TransportError {
    TransportError::message(format!(
        "Could not find the function public.{function} in the schema cache"
    ))
    .with_code("PGRST202")
}
