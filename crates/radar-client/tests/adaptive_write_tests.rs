//! Adaptive write shim tests
//!
//! Covers the strip-and-retry loop end to end against the scripted mock:
//! column fallback convergence, the attempt ceiling, missing-relation and
//! permission short-circuits, and duplicate-key idempotence.

mod common;

use common::{
    duplicate_key, missing_column, missing_relation, mock, permission_denied, row,
};
use radar_client::{adaptive_insert, adaptive_update, RadarError, WriteOutcome, WritePolicy};
use radar_postgrest::{Filter, MockReply, TransportError};
use serde_json::json;

// ============================================================
// Column fallback tests
// ============================================================

#[test]
fn test_insert_strips_reported_columns_until_accepted() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_column("church_name")));
    mock.push(MockReply::Fail(missing_column("max_participants")));
    mock.push(MockReply::InsertOk(Some(json!({"id": "e1"}))));

    let payload = row(&[
        ("title", json!("Vigil")),
        ("church_name", json!("St. Mary")),
        ("max_participants", json!(40)),
    ]);
    let outcome =
        adaptive_insert(&mock, "events", payload, Some("id"), &WritePolicy::default()).unwrap();
    assert_eq!(outcome, WriteOutcome::Written(Some(json!({"id": "e1"}))));

    // The final attempt carried the payload minus both stripped columns.
    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    let last = calls[2].inserted_row().unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last.get("title"), Some(&json!("Vigil")));
}

#[test]
fn test_insert_stops_when_reported_column_not_in_payload() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_column("venue")));

    let payload = row(&[("title", json!("Vigil"))]);
    let result = adaptive_insert(&mock, "events", payload, None, &WritePolicy::default());
    assert!(matches!(result, Err(RadarError::Transport { .. })));
    assert_eq!(mock.call_count(), 1);
}

// ============================================================
// Attempt bound tests
// ============================================================

#[test]
fn test_attempt_bound_is_respected() {
    let mock = mock();
    // The mock always names a column still present, so every attempt
    // strips one and retries; only the ceiling stops the loop.
    let mut payload = radar_postgrest::Row::new();
    for i in 0..20 {
        payload.insert(format!("col_{i}"), json!(i));
        mock.push(MockReply::Fail(missing_column(&format!("col_{i}"))));
    }

    let policy = WritePolicy {
        max_attempts: 5,
        ..WritePolicy::default()
    };
    let result = adaptive_insert(&mock, "events", payload, None, &policy);
    assert_eq!(
        result,
        Err(RadarError::WriteExhausted {
            table: "events".to_string(),
            attempts: 5,
        })
    );
    assert_eq!(mock.call_count(), 5);
}

// ============================================================
// Missing relation tests
// ============================================================

#[test]
fn test_missing_relation_short_circuits() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_relation("events")));

    let payload = row(&[("title", json!("Vigil"))]);
    let outcome =
        adaptive_insert(&mock, "events", payload, None, &WritePolicy::default()).unwrap();
    assert_eq!(outcome, WriteOutcome::MissingRelation);
    // Never retried against the same table.
    assert_eq!(mock.call_count(), 1);
}

// ============================================================
// Permission tests
// ============================================================

#[test]
fn test_permission_denial_is_surfaced_not_retried() {
    let mock = mock();
    mock.push(MockReply::Fail(permission_denied("events")));

    let payload = row(&[("title", json!("Vigil"))]);
    let outcome =
        adaptive_insert(&mock, "events", payload, None, &WritePolicy::default()).unwrap();
    assert_eq!(outcome, WriteOutcome::Denied);
    assert_eq!(mock.call_count(), 1);
}

// ============================================================
// Duplicate key tests
// ============================================================

#[test]
fn test_duplicate_key_is_success_under_idempotent_policy() {
    let mock = mock();
    mock.push(MockReply::Fail(duplicate_key()));

    let payload = row(&[("event_id", json!("e1")), ("user_id", json!("u1"))]);
    let outcome = adaptive_insert(
        &mock,
        "event_likes",
        payload,
        None,
        &WritePolicy::idempotent(),
    )
    .unwrap();
    assert_eq!(outcome, WriteOutcome::Duplicate);
}

#[test]
fn test_duplicate_key_is_failure_under_default_policy() {
    let mock = mock();
    mock.push(MockReply::Fail(duplicate_key()));

    let payload = row(&[("id", json!("e1"))]);
    let result = adaptive_insert(&mock, "events", payload, None, &WritePolicy::default());
    assert!(matches!(result, Err(RadarError::Transport { .. })));
}

// ============================================================
// Update path tests
// ============================================================

#[test]
fn test_update_strips_columns_too() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_column("description")));
    mock.push(MockReply::UpdateOk);

    let patch = row(&[
        ("title", json!("New title")),
        ("description", json!("New description")),
    ]);
    let outcome = adaptive_update(
        &mock,
        "events",
        &[Filter::eq("id", "e1")],
        patch,
        &WritePolicy::default(),
    )
    .unwrap();
    assert_eq!(outcome, WriteOutcome::Written(None));
    assert_eq!(mock.call_count(), 2);
}

#[test]
fn test_unclassified_error_surfaces_raw_message() {
    let mock = mock();
    mock.push(MockReply::Fail(TransportError::message(
        "deadlock detected",
    )));

    let payload = row(&[("title", json!("Vigil"))]);
    let err = adaptive_insert(&mock, "events", payload, None, &WritePolicy::default())
        .unwrap_err();
    let RadarError::Transport { table, message } = err else {
        panic!("expected Transport error");
    };
    assert_eq!(table, "events");
    assert!(message.contains("deadlock detected"));
}
