//! Dual-generation table fallback tests
//!
//! Event creation tries the legacy layout first and falls back to v2 when
//! the legacy relation is absent; once an event lands in a generation,
//! every dependent write stays there.

mod common;

use common::{missing_relation, mock, permission_denied};
use radar_client::ops::{event_ops, invite_ops, participant_ops};
use radar_client::{EventDraft, RadarError};
use radar_core_types::{MembershipStatus, SchemaGeneration};
use radar_postgrest::{MockCall, MockReply};
use serde_json::json;

const LEGACY_TABLES: &[&str] = &["events", "event_participants", "event_invites"];

#[test]
fn test_create_event_lands_in_legacy_first() {
    let mock = mock();
    mock.push(MockReply::InsertOk(Some(json!({"id": "e-legacy"}))));

    let draft = EventDraft::new("Vigil", "user-1");
    let handle = event_ops::create_event(&mock, &draft).unwrap();

    assert_eq!(handle.event_id, "e-legacy");
    assert_eq!(handle.generation, SchemaGeneration::Legacy);
    assert_eq!(mock.calls()[0].table(), Some("events"));
}

#[test]
fn test_create_event_falls_back_to_v2_when_legacy_table_absent() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_relation("events")));
    mock.push(MockReply::InsertOk(Some(json!({"id": "e-v2"}))));

    let draft = EventDraft::new("Vigil", "user-1");
    let handle = event_ops::create_event(&mock, &draft).unwrap();

    assert_eq!(handle.generation, SchemaGeneration::V2);
    let calls = mock.calls();
    assert_eq!(calls[0].table(), Some("events"));
    assert_eq!(calls[1].table(), Some("events_v2"));
    // The v2 payload is reshaped, not a stripped-down legacy payload.
    let row = calls[1].inserted_row().unwrap();
    assert_eq!(row.get("name"), Some(&json!("Vigil")));
    assert!(!row.contains_key("title"));
}

#[test]
fn test_create_event_fails_when_no_generation_has_the_table() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_relation("events")));
    mock.push(MockReply::Fail(missing_relation("events_v2")));

    let result = event_ops::create_event(&mock, &EventDraft::new("Vigil", "user-1"));
    assert!(matches!(
        result,
        Err(RadarError::NoUsableGeneration { table }) if table == "events_v2"
    ));
}

#[test]
fn test_create_event_denied_does_not_fall_back() {
    let mock = mock();
    mock.push(MockReply::Fail(permission_denied("events")));

    let result = event_ops::create_event(&mock, &EventDraft::new("Vigil", "user-1"));
    assert!(matches!(result, Err(RadarError::WriteDenied { table }) if table == "events"));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_create_event_rejects_blank_title_without_calling_server() {
    let mock = mock();
    let result = event_ops::create_event(&mock, &EventDraft::new("   ", "user-1"));
    assert!(matches!(result, Err(RadarError::InvalidTitle { .. })));
    assert_eq!(mock.call_count(), 0);
}

// Once an event lands in v2, every dependent write in the same logical
// operation targets v2 tables only.
#[test]
fn test_dependent_writes_stay_in_the_handles_generation() {
    let mock = mock();
    // create: legacy absent, v2 accepts
    mock.push(MockReply::Fail(missing_relation("events")));
    mock.push(MockReply::InsertOk(Some(json!({"id": "e-v2"}))));
    // join: procedure present
    mock.push(MockReply::RpcOk(json!("JOINED")));
    // invite: insert, then best-effort notification
    mock.push(MockReply::InsertOk(Some(json!({"id": "inv-1"}))));
    mock.push(MockReply::InsertOk(None));

    let handle = event_ops::create_event(&mock, &EventDraft::new("Vigil", "user-1")).unwrap();
    let status = participant_ops::join_event(&mock, &handle, "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Joined);
    let invite_id = invite_ops::send_invite(&mock, &handle, "user-1", "user-3").unwrap();
    assert_eq!(invite_id, "inv-1");

    for call in mock.calls() {
        if let Some(table) = call.table() {
            assert!(
                !LEGACY_TABLES.contains(&table),
                "dependent write hit legacy table {table}"
            );
        }
    }
    let invite_call = &mock.calls()[3];
    assert_eq!(invite_call.table(), Some("event_invites_v2"));
    assert!(matches!(invite_call, MockCall::Insert { .. }));
}
