//! Invite operations
//!
//! Invites live in the generation the event landed in (the handle carries
//! it). Accepting an invite prefers the `respond_event_invite` procedure;
//! the direct fallback marks the invite, registers the participant, and
//! makes a best-effort attempt at the chat bridge.

use radar_core_types::{InviteStatus, MembershipStatus};
use radar_postgrest::{Filter, Row, Transport};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::adaptive::{adaptive_insert, adaptive_update, WriteOutcome, WritePolicy};
use crate::errors::{RadarError, Result};
use crate::ops::event_ops::EventHandle;
use crate::ops::{engagement_ops, map_raw, try_rpc, RpcAttempt};

/// Send an invite for an event
///
/// Inviting the same user twice is idempotent: the existing invite id is
/// returned when it can be read back. A best-effort notification goes to
/// the invited user.
///
/// # Errors
///
/// * `WriteDenied` - the invite insert was rejected
/// * `NoUsableGeneration` - the invites table is absent
/// * `WriteExhausted` / `Transport` - write failures
pub fn send_invite(
    transport: &dyn Transport,
    handle: &EventHandle,
    from_user_id: &str,
    to_user_id: &str,
) -> Result<String> {
    let invite_id = Uuid::now_v7().to_string();
    let table = handle.generation.invites_table();

    let mut row = Row::new();
    row.insert("id".to_string(), json!(invite_id));
    row.insert("event_id".to_string(), json!(handle.event_id));
    row.insert("from_user_id".to_string(), json!(from_user_id));
    row.insert("to_user_id".to_string(), json!(to_user_id));
    row.insert("status".to_string(), json!(InviteStatus::Pending.as_db_str()));

    let outcome = adaptive_insert(transport, table, row, Some("id"), &WritePolicy::idempotent())?;
    let id = match outcome {
        WriteOutcome::Written(returned) => returned
            .as_ref()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(invite_id),
        WriteOutcome::Duplicate => {
            existing_invite_id(transport, handle, to_user_id).unwrap_or(invite_id)
        }
        WriteOutcome::Denied => {
            return Err(RadarError::WriteDenied {
                table: table.to_string(),
            });
        }
        WriteOutcome::MissingRelation => {
            return Err(RadarError::NoUsableGeneration {
                table: table.to_string(),
            });
        }
    };

    let payload = json!({ "event_id": handle.event_id, "invite_id": id });
    if let Err(err) = engagement_ops::notify(transport, to_user_id, "event_invite", &payload) {
        warn!(to_user_id, %err, "could not notify invited user");
    }
    Ok(id)
}

/// Respond to an invite
///
/// Accepting yields `Joined`; declining yields `None`. Prefers the
/// `respond_event_invite` procedure; the direct fallback marks the invite
/// row, inserts the participant on accept, and tries the chat bridge
/// best-effort.
///
/// # Errors
///
/// * `InviteNotFound` - no invite row matches (fallback path)
/// * `MalformedRow` - the invite row lacks a recipient (fallback path)
/// * `WriteDenied` / `NoUsableGeneration` / `Rpc` / `Transport`
pub fn respond_invite(
    transport: &dyn Transport,
    handle: &EventHandle,
    invite_id: &str,
    accept: bool,
) -> Result<MembershipStatus> {
    let args = json!({ "p_invite_id": invite_id, "p_accept": accept });
    match try_rpc(transport, "respond_event_invite", args)? {
        RpcAttempt::Ok(value) => {
            let fallback = if accept {
                MembershipStatus::Joined
            } else {
                MembershipStatus::None
            };
            Ok(super::participant_ops::status_from_rpc(&value).unwrap_or(fallback))
        }
        RpcAttempt::Unavailable => respond_invite_direct(transport, handle, invite_id, accept),
    }
}

fn respond_invite_direct(
    transport: &dyn Transport,
    handle: &EventHandle,
    invite_id: &str,
    accept: bool,
) -> Result<MembershipStatus> {
    let invites_table = handle.generation.invites_table();
    let rows = transport
        .select(invites_table, &[Filter::eq("id", invite_id)], "*")
        .map_err(|e| map_raw(invites_table, e))?;
    let invite = rows.first().ok_or_else(|| RadarError::InviteNotFound {
        invite_id: invite_id.to_string(),
    })?;

    let decision = if accept {
        InviteStatus::Accepted
    } else {
        InviteStatus::Declined
    };
    let mut patch = Row::new();
    patch.insert("status".to_string(), json!(decision.as_db_str()));
    require_success(
        invites_table,
        adaptive_update(
            transport,
            invites_table,
            &[Filter::eq("id", invite_id)],
            patch,
            &WritePolicy::default(),
        )?,
    )?;

    if !accept {
        return Ok(MembershipStatus::None);
    }

    let to_user_id = invite
        .get("to_user_id")
        .and_then(Value::as_str)
        .ok_or_else(|| RadarError::MalformedRow {
            table: invites_table.to_string(),
            reason: "invite has no to_user_id".to_string(),
        })?;

    let participants_table = handle.generation.participants_table();
    let mut row = Row::new();
    row.insert("event_id".to_string(), json!(handle.event_id));
    row.insert("user_id".to_string(), json!(to_user_id));
    row.insert(
        "status".to_string(),
        json!(MembershipStatus::Joined.as_db_str()),
    );
    require_success(
        participants_table,
        adaptive_insert(
            transport,
            participants_table,
            row,
            None,
            &WritePolicy::idempotent(),
        )?,
    )?;

    // Chat bridge is not critical-path: a deployment without the procedure
    // or without permission just goes without the bridge.
    if let Err(err) = transport.rpc(
        "ensure_event_chat",
        &json!({ "p_event_id": handle.event_id }),
    ) {
        warn!(event_id = %handle.event_id, %err, "chat bridge unavailable, continuing");
    }

    Ok(MembershipStatus::Joined)
}

fn require_success(table: &str, outcome: WriteOutcome) -> Result<()> {
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

fn existing_invite_id(
    transport: &dyn Transport,
    handle: &EventHandle,
    to_user_id: &str,
) -> Option<String> {
    let table = handle.generation.invites_table();
    let rows = transport
        .select(
            table,
            &[
                Filter::eq("event_id", &handle.event_id),
                Filter::eq("to_user_id", to_user_id),
            ],
            "id",
        )
        .ok()?;
    rows.first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
