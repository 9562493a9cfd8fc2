//! Comments, likes, and best-effort notifications
//!
//! All three live in single-generation tables. Likes opt into
//! duplicate-as-success (tapping like twice is not an error); notification
//! inserts are fail-open: a permission denial or an absent table is logged
//! and swallowed, because notifications are not critical-path.

use radar_postgrest::{Filter, Row, Transport};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::adaptive::{adaptive_insert, WriteOutcome, WritePolicy};
use crate::errors::{RadarError, Result};
use crate::ops::event_ops::EventHandle;
use crate::ops::{map_raw, try_rpc, RpcAttempt};

const COMMENTS_TABLE: &str = "event_comments";
const LIKES_TABLE: &str = "event_likes";
const NOTIFICATIONS_TABLE: &str = "notifications";

/// Add a comment to an event
///
/// # Errors
///
/// * `InvalidComment` - empty or whitespace-only body
/// * `WriteDenied` / `NoUsableGeneration` / `WriteExhausted` / `Transport`
pub fn add_comment(
    transport: &dyn Transport,
    handle: &EventHandle,
    author_id: &str,
    body: &str,
) -> Result<String> {
    if body.trim().is_empty() {
        return Err(RadarError::InvalidComment {
            reason: "Comment body cannot be empty or whitespace-only".to_string(),
        });
    }

    let comment_id = Uuid::now_v7().to_string();
    let mut row = Row::new();
    row.insert("id".to_string(), json!(comment_id));
    row.insert("event_id".to_string(), json!(handle.event_id));
    row.insert("author_id".to_string(), json!(author_id));
    row.insert("body".to_string(), json!(body));

    let outcome = adaptive_insert(
        transport,
        COMMENTS_TABLE,
        row,
        Some("id"),
        &WritePolicy::default(),
    )?;
    match outcome {
        WriteOutcome::Written(returned) => Ok(returned
            .as_ref()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(comment_id)),
        WriteOutcome::Duplicate => Ok(comment_id),
        WriteOutcome::Denied => Err(RadarError::WriteDenied {
            table: COMMENTS_TABLE.to_string(),
        }),
        WriteOutcome::MissingRelation => Err(RadarError::NoUsableGeneration {
            table: COMMENTS_TABLE.to_string(),
        }),
    }
}

/// Delete one of the author's own comments
///
/// # Errors
///
/// * `WriteDenied` / `NoUsableGeneration` / `Transport`
pub fn delete_comment(transport: &dyn Transport, comment_id: &str, author_id: &str) -> Result<()> {
    transport
        .delete(
            COMMENTS_TABLE,
            &[
                Filter::eq("id", comment_id),
                Filter::eq("author_id", author_id),
            ],
        )
        .map_err(|e| map_raw(COMMENTS_TABLE, e))
}

/// Like an event (idempotent)
///
/// # Errors
///
/// * `WriteDenied` / `NoUsableGeneration` / `WriteExhausted` / `Transport`
pub fn like_event(transport: &dyn Transport, handle: &EventHandle, user_id: &str) -> Result<()> {
    let mut row = Row::new();
    row.insert("event_id".to_string(), json!(handle.event_id));
    row.insert("user_id".to_string(), json!(user_id));

    let outcome = adaptive_insert(
        transport,
        LIKES_TABLE,
        row,
        None,
        &WritePolicy::idempotent(),
    )?;
    match outcome {
        WriteOutcome::Written(_) | WriteOutcome::Duplicate => Ok(()),
        WriteOutcome::Denied => Err(RadarError::WriteDenied {
            table: LIKES_TABLE.to_string(),
        }),
        WriteOutcome::MissingRelation => Err(RadarError::NoUsableGeneration {
            table: LIKES_TABLE.to_string(),
        }),
    }
}

/// Remove a like
///
/// # Errors
///
/// * `WriteDenied` / `NoUsableGeneration` / `Transport`
pub fn unlike_event(transport: &dyn Transport, handle: &EventHandle, user_id: &str) -> Result<()> {
    transport
        .delete(
            LIKES_TABLE,
            &[
                Filter::eq("event_id", &handle.event_id),
                Filter::eq("user_id", user_id),
            ],
        )
        .map_err(|e| map_raw(LIKES_TABLE, e))
}

/// Number of likes on an event
///
/// Prefers the aggregating `event_like_counts` procedure; falls back to
/// selecting the like rows and counting client-side.
///
/// # Errors
///
/// * `Rpc` / `Transport` and the read failures of the fallback path
pub fn like_count(transport: &dyn Transport, handle: &EventHandle) -> Result<u64> {
    let args = json!({ "p_event_id": handle.event_id });
    match try_rpc(transport, "event_like_counts", args)? {
        RpcAttempt::Ok(value) => {
            if let Some(count) = count_from_rpc(&value) {
                return Ok(count);
            }
            count_likes_directly(transport, handle)
        }
        RpcAttempt::Unavailable => count_likes_directly(transport, handle),
    }
}

/// Insert a notification row, fail-open
///
/// Backends deny notification inserts for some roles and some omit the
/// table entirely; both cases are logged and reported as success because
/// notifications are best-effort.
///
/// # Errors
///
/// * `WriteExhausted` / `Transport` - only genuine write failures
pub fn notify(
    transport: &dyn Transport,
    user_id: &str,
    kind: &str,
    payload: &Value,
) -> Result<()> {
    let mut row = Row::new();
    row.insert("user_id".to_string(), json!(user_id));
    row.insert("kind".to_string(), json!(kind));
    row.insert("payload".to_string(), payload.clone());

    let outcome = adaptive_insert(
        transport,
        NOTIFICATIONS_TABLE,
        row,
        None,
        &WritePolicy::idempotent(),
    )?;
    match outcome {
        WriteOutcome::Written(_) | WriteOutcome::Duplicate => Ok(()),
        WriteOutcome::Denied => {
            warn!(user_id, kind, "notification insert denied, continuing");
            Ok(())
        }
        WriteOutcome::MissingRelation => {
            warn!(user_id, kind, "notifications table absent, continuing");
            Ok(())
        }
    }
}

fn count_likes_directly(transport: &dyn Transport, handle: &EventHandle) -> Result<u64> {
    let rows = transport
        .select(
            LIKES_TABLE,
            &[Filter::eq("event_id", &handle.event_id)],
            "user_id",
        )
        .map_err(|e| map_raw(LIKES_TABLE, e))?;
    Ok(rows.len() as u64)
}

/// Interpret the aggregate procedure's return value
///
/// Comes back as a bare number, a `{ "count": ... }` object, or a one-row
/// array of either.
fn count_from_rpc(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map.get("count").and_then(Value::as_u64),
        Value::Array(items) => items.first().and_then(count_from_rpc),
        _ => None,
    }
}
