//! Participant operation tests
//!
//! Join/leave/approve/reject over the scripted mock: procedure preference,
//! client-side fallback with capacity and approval handling, and the
//! membership state machine's legality checks.

mod common;

use common::{duplicate_key, legacy_handle, missing_function, mock, permission_denied};
use radar_client::ops::participant_ops;
use radar_client::RadarError;
use radar_core_types::MembershipStatus;
use radar_postgrest::{MockCall, MockReply, TransportError};
use serde_json::json;

fn event_row(extra: &[(&str, serde_json::Value)]) -> serde_json::Value {
    let mut row = json!({"id": "event-1", "title": "Vigil", "status": "ACTIVE"});
    for (key, value) in extra {
        row[*key] = value.clone();
    }
    row
}

#[test]
fn test_join_prefers_the_procedure() {
    let mock = mock();
    mock.push(MockReply::RpcOk(json!({"status": "PENDING"})));

    let status = participant_ops::join_event(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Pending);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let MockCall::Rpc { function, args } = &calls[0] else {
        panic!("expected rpc");
    };
    assert_eq!(function, "join_event");
    assert_eq!(args.get("p_event_id"), Some(&json!("event-1")));
}

#[test]
fn test_join_falls_back_when_procedure_absent() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![event_row(&[])]));
    mock.push(MockReply::InsertOk(None));

    let status = participant_ops::join_event(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Joined);

    let calls = mock.calls();
    assert_eq!(calls[2].table(), Some("event_participants"));
    let row = calls[2].inserted_row().unwrap();
    assert_eq!(row.get("status"), Some(&json!("JOINED")));
}

#[test]
fn test_join_fallback_lands_pending_when_approval_required() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![event_row(&[(
        "requires_approval",
        json!(true),
    )])]));
    mock.push(MockReply::InsertOk(None));

    let status = participant_ops::join_event(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Pending);
    let row = mock.calls()[2].inserted_row().unwrap().clone();
    assert_eq!(row.get("status"), Some(&json!("PENDING")));
}

#[test]
fn test_join_fallback_enforces_capacity() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![event_row(&[(
        "max_participants",
        json!(2),
    )])]));
    // Two joined participants already.
    mock.push(MockReply::SelectOk(vec![
        json!({"user_id": "a"}),
        json!({"user_id": "b"}),
    ]));

    let result = participant_ops::join_event(&mock, &legacy_handle(), "user-2");
    assert!(matches!(
        result,
        Err(RadarError::EventFull { capacity: 2, .. })
    ));
}

#[test]
fn test_join_fallback_admits_below_capacity() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![event_row(&[(
        "max_participants",
        json!(2),
    )])]));
    mock.push(MockReply::SelectOk(vec![json!({"user_id": "a"})]));
    mock.push(MockReply::InsertOk(None));

    let status = participant_ops::join_event(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Joined);
}

#[test]
fn test_join_twice_reports_existing_status() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![event_row(&[])]));
    mock.push(MockReply::Fail(duplicate_key()));
    // Readback of the existing row: the user is actually pending.
    mock.push(MockReply::SelectOk(vec![json!({"status": "PENDING"})]));

    let status = participant_ops::join_event(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::Pending);
}

#[test]
fn test_join_fallback_missing_event() {
    let mock = mock();
    mock.push(MockReply::Fail(missing_function("join_event")));
    mock.push(MockReply::SelectOk(vec![]));

    let result = participant_ops::join_event(&mock, &legacy_handle(), "user-2");
    assert!(matches!(result, Err(RadarError::EventNotFound { .. })));
}

#[test]
fn test_join_genuine_rpc_failure_surfaces() {
    let mock = mock();
    mock.push(MockReply::Fail(
        TransportError::message("function join_event crashed").with_code("XX000"),
    ));

    let result = participant_ops::join_event(&mock, &legacy_handle(), "user-2");
    assert!(matches!(
        result,
        Err(RadarError::Rpc { function, .. }) if function == "join_event"
    ));
}

#[test]
fn test_leave_requires_joined() {
    let mock = mock();
    // No participant row: status None, and None cannot go to Left.
    mock.push(MockReply::SelectOk(vec![]));

    let result = participant_ops::leave_event(&mock, &legacy_handle(), "user-2");
    assert!(matches!(
        result,
        Err(RadarError::IllegalTransition {
            from: MembershipStatus::None,
            to: MembershipStatus::Left,
        })
    ));
}

#[test]
fn test_leave_uses_procedure_when_present() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "JOINED"})]));
    mock.push(MockReply::RpcOk(json!(null)));

    participant_ops::leave_event(&mock, &legacy_handle(), "user-2").unwrap();
    let MockCall::Rpc { function, .. } = &mock.calls()[1] else {
        panic!("expected rpc");
    };
    assert_eq!(function, "leave_event");
}

#[test]
fn test_leave_falls_back_to_direct_update() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "JOINED"})]));
    mock.push(MockReply::Fail(missing_function("leave_event")));
    mock.push(MockReply::UpdateOk);

    participant_ops::leave_event(&mock, &legacy_handle(), "user-2").unwrap();
    let MockCall::Update { table, patch, .. } = &mock.calls()[2] else {
        panic!("expected update");
    };
    assert_eq!(table, "event_participants");
    assert_eq!(patch.get("status"), Some(&json!("LEFT")));
}

#[test]
fn test_approve_moves_pending_to_joined_and_notifies() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "PENDING"})]));
    mock.push(MockReply::UpdateOk);
    mock.push(MockReply::InsertOk(None));

    participant_ops::approve_request(&mock, &legacy_handle(), "user-2").unwrap();

    let calls = mock.calls();
    let MockCall::Update { patch, .. } = &calls[1] else {
        panic!("expected update");
    };
    assert_eq!(patch.get("status"), Some(&json!("JOINED")));
    assert_eq!(calls[2].table(), Some("notifications"));
    let notification = calls[2].inserted_row().unwrap();
    assert_eq!(notification.get("kind"), Some(&json!("join_approved")));
}

#[test]
fn test_approve_succeeds_when_notification_denied() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "PENDING"})]));
    mock.push(MockReply::UpdateOk);
    mock.push(MockReply::Fail(permission_denied("notifications")));

    participant_ops::approve_request(&mock, &legacy_handle(), "user-2").unwrap();
}

#[test]
fn test_reject_requires_pending() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "JOINED"})]));

    let result = participant_ops::reject_request(&mock, &legacy_handle(), "user-2");
    assert!(matches!(
        result,
        Err(RadarError::IllegalTransition {
            from: MembershipStatus::Joined,
            to: MembershipStatus::Rejected,
        })
    ));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn test_unknown_status_value_reads_as_none() {
    let mock = mock();
    mock.push(MockReply::SelectOk(vec![json!({"status": "banana"})]));

    let status =
        participant_ops::current_status(&mock, &legacy_handle(), "user-2").unwrap();
    assert_eq!(status, MembershipStatus::None);
}
