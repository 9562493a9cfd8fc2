//! Physical attendance check-in/check-out
//!
//! Check-ins live in a single-generation table. The set/clear procedures
//! are preferred; the fallback is a direct insert (checking in twice is
//! idempotent) or delete.

use chrono::Utc;
use radar_postgrest::{Filter, Row, Transport};
use serde_json::json;

use crate::adaptive::{adaptive_insert, WriteOutcome, WritePolicy};
use crate::errors::{RadarError, Result};
use crate::ops::event_ops::EventHandle;
use crate::ops::{map_raw, try_rpc, RpcAttempt};

const CHECK_INS_TABLE: &str = "event_check_ins";

/// Record physical attendance for a user
///
/// # Errors
///
/// * `WriteDenied` - the check-in insert was rejected
/// * `NoUsableGeneration` - the check-ins table is absent
/// * `Rpc` / `Transport` / `WriteExhausted`
pub fn check_in(transport: &dyn Transport, handle: &EventHandle, user_id: &str) -> Result<()> {
    let args = json!({ "p_event_id": handle.event_id, "p_user_id": user_id });
    match try_rpc(transport, "set_check_in", args)? {
        RpcAttempt::Ok(_) => Ok(()),
        RpcAttempt::Unavailable => {
            let mut row = Row::new();
            row.insert("event_id".to_string(), json!(handle.event_id));
            row.insert("user_id".to_string(), json!(user_id));
            row.insert(
                "checked_in_at".to_string(),
                json!(Utc::now().to_rfc3339()),
            );
            let outcome = adaptive_insert(
                transport,
                CHECK_INS_TABLE,
                row,
                None,
                &WritePolicy::idempotent(),
            )?;
            match outcome {
                WriteOutcome::Written(_) | WriteOutcome::Duplicate => Ok(()),
                WriteOutcome::Denied => Err(RadarError::WriteDenied {
                    table: CHECK_INS_TABLE.to_string(),
                }),
                WriteOutcome::MissingRelation => Err(RadarError::NoUsableGeneration {
                    table: CHECK_INS_TABLE.to_string(),
                }),
            }
        }
    }
}

/// Clear a user's check-in
///
/// Clearing an absent check-in is a no-op server-side; both paths are
/// idempotent.
///
/// # Errors
///
/// * `WriteDenied` / `NoUsableGeneration` / `Rpc` / `Transport`
pub fn check_out(transport: &dyn Transport, handle: &EventHandle, user_id: &str) -> Result<()> {
    let args = json!({ "p_event_id": handle.event_id, "p_user_id": user_id });
    match try_rpc(transport, "clear_check_in", args)? {
        RpcAttempt::Ok(_) => Ok(()),
        RpcAttempt::Unavailable => transport
            .delete(
                CHECK_INS_TABLE,
                &[
                    Filter::eq("event_id", &handle.event_id),
                    Filter::eq("user_id", user_id),
                ],
            )
            .map_err(|e| map_raw(CHECK_INS_TABLE, e)),
    }
}
