//! Participant operations
//!
//! Joining prefers the `join_event` stored procedure, whose transaction is
//! the only place capacity and approval are enforced atomically. The
//! client-side fallback replicates the sequence with plain reads and
//! writes and is explicitly best-effort: two clients racing for the last
//! capacity slot can both get it.

use radar_core_types::MembershipStatus;
use radar_postgrest::{Filter, Row, Transport};
use serde_json::{json, Value};
use tracing::warn;

use crate::adaptive::{adaptive_insert, adaptive_update, WriteOutcome, WritePolicy};
use crate::errors::{RadarError, Result};
use crate::ops::event_ops::{self, EventHandle};
use crate::ops::{engagement_ops, map_raw, try_rpc, RpcAttempt};

/// Join an event
///
/// Prefers the `join_event` procedure; falls back to the direct path when
/// the procedure is absent or not invocable. Joining an event that
/// requires approval lands in `Pending`; open events land in `Joined`.
/// Joining twice is idempotent and returns the current status.
///
/// # Errors
///
/// * `EventNotFound` - the event row is gone (fallback path)
/// * `EventFull` - capacity reached (fallback path, best-effort)
/// * `WriteDenied` - the participant insert was rejected
/// * `Rpc` / `Transport` - genuine failures
pub fn join_event(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
) -> Result<MembershipStatus> {
    let args = json!({ "p_event_id": handle.event_id, "p_user_id": user_id });
    match try_rpc(transport, "join_event", args)? {
        RpcAttempt::Ok(value) => {
            Ok(status_from_rpc(&value).unwrap_or(MembershipStatus::Joined))
        }
        RpcAttempt::Unavailable => join_event_direct(transport, handle, user_id),
    }
}

/// Client-side join: read event, best-effort capacity check, insert
///
/// Not transactional against concurrent joins; capacity is checked with a
/// separate read and may admit one participant too many under a race.
fn join_event_direct(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
) -> Result<MembershipStatus> {
    let record = event_ops::get_event(transport, handle)?;

    if let Some(capacity) = record.capacity {
        let joined = joined_count(transport, handle)?;
        if joined >= capacity {
            return Err(RadarError::EventFull {
                event_id: handle.event_id.clone(),
                capacity,
            });
        }
    }

    let target = if record.requires_approval {
        MembershipStatus::Pending
    } else {
        MembershipStatus::Joined
    };

    let mut row = Row::new();
    row.insert("event_id".to_string(), json!(handle.event_id));
    row.insert("user_id".to_string(), json!(user_id));
    row.insert("status".to_string(), json!(target.as_db_str()));

    let table = handle.generation.participants_table();
    match adaptive_insert(transport, table, row, None, &WritePolicy::idempotent())? {
        WriteOutcome::Written(_) => Ok(target),
        WriteOutcome::Duplicate => {
            // The row already exists; report its actual status when we can
            // read it back.
            match current_status(transport, handle, user_id) {
                Ok(MembershipStatus::None) | Err(_) => Ok(target),
                Ok(status) => Ok(status),
            }
        }
        WriteOutcome::Denied => Err(RadarError::WriteDenied {
            table: table.to_string(),
        }),
        WriteOutcome::MissingRelation => Err(RadarError::NoUsableGeneration {
            table: table.to_string(),
        }),
    }
}

/// Leave an event the user has joined
///
/// # Errors
///
/// * `IllegalTransition` - the user is not currently `Joined`
/// * `WriteDenied` / `NoUsableGeneration` / `Rpc` / `Transport`
pub fn leave_event(transport: &dyn Transport, handle: &EventHandle, user_id: &str) -> Result<()> {
    let current = current_status(transport, handle, user_id)?;
    if !current.can_transition(MembershipStatus::Left) {
        return Err(RadarError::IllegalTransition {
            from: current,
            to: MembershipStatus::Left,
        });
    }

    let args = json!({ "p_event_id": handle.event_id, "p_user_id": user_id });
    match try_rpc(transport, "leave_event", args)? {
        RpcAttempt::Ok(_) => Ok(()),
        RpcAttempt::Unavailable => {
            set_status(transport, handle, user_id, MembershipStatus::Left)
        }
    }
}

/// Approve a pending join request (host decision)
///
/// Sends a best-effort notification to the approved user; a denied
/// notification write is logged and ignored.
///
/// # Errors
///
/// * `IllegalTransition` - the request is not `Pending`
/// * `WriteDenied` / `NoUsableGeneration` / `Transport`
pub fn approve_request(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
) -> Result<()> {
    decide_request(transport, handle, user_id, MembershipStatus::Joined, "join_approved")
}

/// Reject a pending join request (host decision)
///
/// # Errors
///
/// Same failure surface as [`approve_request`].
pub fn reject_request(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
) -> Result<()> {
    decide_request(transport, handle, user_id, MembershipStatus::Rejected, "join_rejected")
}

fn decide_request(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
    decision: MembershipStatus,
    notification_kind: &str,
) -> Result<()> {
    let current = current_status(transport, handle, user_id)?;
    if !current.can_transition(decision) {
        return Err(RadarError::IllegalTransition {
            from: current,
            to: decision,
        });
    }

    set_status(transport, handle, user_id, decision)?;

    let payload = json!({ "event_id": handle.event_id });
    if let Err(err) = engagement_ops::notify(transport, user_id, notification_kind, &payload) {
        warn!(user_id, %err, "could not notify user of host decision");
    }
    Ok(())
}

/// Current membership status of a user for an event
///
/// No participant row (or a row we cannot interpret) reads as `None`.
///
/// # Errors
///
/// Returns `WriteDenied` / `NoUsableGeneration` / `Transport` when the
/// read itself fails.
pub fn current_status(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
) -> Result<MembershipStatus> {
    let table = handle.generation.participants_table();
    let rows = transport
        .select(
            table,
            &[
                Filter::eq("event_id", &handle.event_id),
                Filter::eq("user_id", user_id),
            ],
            "status",
        )
        .map_err(|e| map_raw(table, e))?;
    let status = rows
        .first()
        .and_then(|row| row.get("status"))
        .and_then(Value::as_str)
        .and_then(MembershipStatus::from_db_str)
        .unwrap_or(MembershipStatus::None);
    Ok(status)
}

/// Count of joined participants (best-effort capacity input)
fn joined_count(transport: &dyn Transport, handle: &EventHandle) -> Result<u64> {
    let table = handle.generation.participants_table();
    let rows = transport
        .select(
            table,
            &[
                Filter::eq("event_id", &handle.event_id),
                Filter::eq("status", MembershipStatus::Joined.as_db_str()),
            ],
            "user_id",
        )
        .map_err(|e| map_raw(table, e))?;
    Ok(rows.len() as u64)
}

fn set_status(
    transport: &dyn Transport,
    handle: &EventHandle,
    user_id: &str,
    status: MembershipStatus,
) -> Result<()> {
    let table = handle.generation.participants_table();
    let mut patch = Row::new();
    patch.insert("status".to_string(), json!(status.as_db_str()));
    let outcome = adaptive_update(
        transport,
        table,
        &[
            Filter::eq("event_id", &handle.event_id),
            Filter::eq("user_id", user_id),
        ],
        patch,
        &WritePolicy::default(),
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

/// Interpret the status a membership procedure returned
///
/// Procedures come back as a bare status string, a `{ "status": ... }`
/// object, or a one-row array of either.
pub(crate) fn status_from_rpc(value: &Value) -> Option<MembershipStatus> {
    match value {
        Value::String(s) => MembershipStatus::from_db_str(s),
        Value::Object(map) => map
            .get("status")
            .and_then(Value::as_str)
            .and_then(MembershipStatus::from_db_str),
        Value::Array(items) => items.first().and_then(status_from_rpc),
        _ => None,
    }
}
