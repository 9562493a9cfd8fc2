//! Domain operations
//!
//! Free functions over a [`Transport`], grouped per entity. Operations that
//! have a server-side stored procedure prefer it (the procedure carries the
//! server's transactional guarantees) and fall back to direct row
//! operations when the procedure is absent or not invocable.

use radar_postgrest::{Transport, TransportError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{classify, ErrorKind};
use crate::errors::{RadarError, Result};

pub mod checkin_ops;
pub mod engagement_ops;
pub mod event_ops;
pub mod invite_ops;
pub mod participant_ops;

pub use event_ops::{EventDraft, EventHandle, EventRecord};

/// Outcome of a preferred-procedure invocation
pub(crate) enum RpcAttempt {
    /// The procedure ran; carries its return value
    Ok(Value),
    /// The procedure is absent, broken, or not invocable here; use the
    /// client-side fallback path
    Unavailable,
}

/// Invoke a stored procedure, mapping "cannot use this procedure" to
/// `Unavailable` and genuine failures to `Err`
pub(crate) fn try_rpc(
    transport: &dyn Transport,
    function: &str,
    args: Value,
) -> Result<RpcAttempt> {
    match transport.rpc(function, &args) {
        Ok(value) => Ok(RpcAttempt::Ok(value)),
        Err(err) => match classify(&err) {
            ErrorKind::MissingFunction => {
                debug!(function, "procedure not deployed, using local fallback");
                Ok(RpcAttempt::Unavailable)
            }
            ErrorKind::AmbiguousColumn => {
                warn!(function, %err, "ambiguous column in procedure, using local fallback");
                Ok(RpcAttempt::Unavailable)
            }
            ErrorKind::PermissionDenied | ErrorKind::NotAuthenticated => {
                debug!(function, "procedure not invocable, using local fallback");
                Ok(RpcAttempt::Unavailable)
            }
            _ => Err(RadarError::Rpc {
                function: function.to_string(),
                message: err.to_string(),
            }),
        },
    }
}

/// Map a raw transport error from a non-adaptive verb (select/delete) onto
/// the crate taxonomy
pub(crate) fn map_raw(table: &str, err: TransportError) -> RadarError {
    match classify(&err) {
        ErrorKind::PermissionDenied | ErrorKind::NotAuthenticated => RadarError::WriteDenied {
            table: table.to_string(),
        },
        ErrorKind::MissingRelation => RadarError::NoUsableGeneration {
            table: table.to_string(),
        },
        _ => RadarError::Transport {
            table: table.to_string(),
            message: err.to_string(),
        },
    }
}
