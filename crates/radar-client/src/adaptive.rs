//! Schema-adaptive write shim
//!
//! Inserts and updates against a deployment whose column set is not known
//! in advance. The loop is bounded; between attempts the next candidate
//! payload is computed by [`plan_retry`], a pure function of the previous
//! payload and the classified error, so the retry logic is unit-testable
//! without a transport at all.
//!
//! Expected classification outcomes are encoded in [`WriteOutcome`] rather
//! than errors: a missing relation or a permission denial is information
//! the caller routes on (fall back to the other schema generation, or
//! treat a best-effort write as done), not a failure of this shim.

use radar_postgrest::{Filter, Row, Transport};
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{classify, ErrorKind};
use crate::errors::{RadarError, Result};

/// Attempt ceiling used when a policy does not override it
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Key whose value the status-sentinel fallback substitutes
const STATUS_KEY: &str = "status";

/// How a single adaptive write behaves
#[derive(Debug, Clone)]
pub struct WritePolicy {
    /// Bounded attempt budget; exhausting it yields `WriteExhausted`
    pub max_attempts: u32,
    /// Treat a unique-constraint violation as idempotent success
    pub duplicate_is_success: bool,
    /// On an enum/check violation, substitute `status` once:
    /// `(rejected sentinel, fallback sentinel)`
    pub status_fallback: Option<(String, String)>,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            duplicate_is_success: false,
            status_fallback: None,
        }
    }
}

impl WritePolicy {
    /// Policy for writes where the row already existing is success
    pub fn idempotent() -> Self {
        Self {
            duplicate_is_success: true,
            ..Self::default()
        }
    }

    /// Policy for the archive path: substitute the fallback sentinel once
    /// if the deployment's status enum rejects the preferred one
    pub fn archival(rejected: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            status_fallback: Some((rejected.into(), fallback.into())),
            ..Self::default()
        }
    }
}

/// Structured outcome of an adaptive write
///
/// `Written` and `Duplicate` are successes; `MissingRelation` and `Denied`
/// are routing signals for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The write landed; carries the returned row when one was requested
    Written(Option<Value>),
    /// Unique-constraint violation under an idempotent policy: the desired
    /// row already exists
    Duplicate,
    /// The target table does not exist in this deployment; never retried
    /// against the same table
    MissingRelation,
    /// Permission denied or not authenticated; caller decides fatal vs
    /// best-effort-ignore
    Denied,
}

impl WriteOutcome {
    /// Whether the desired row exists after this outcome
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Written(_) | WriteOutcome::Duplicate)
    }

    /// The returned row, when the server sent one back
    pub fn row(&self) -> Option<&Value> {
        match self {
            WriteOutcome::Written(Some(row)) => Some(row),
            _ => None,
        }
    }
}

/// Next step for the retry loop, computed by [`plan_retry`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStep {
    /// Retry with this payload
    Retry(Row),
    /// Retry with this payload; the status-sentinel fallback is now spent
    RetryWithStatusFallback(Row),
    /// No recovery applies; surface the raw error
    Stop,
}

/// Compute the next candidate payload from the previous one and the
/// classified error
///
/// Pure function: no transport, no clock, no mutation of the input.
/// - Missing column present in the payload: strip it.
/// - Enum/check violation while the payload sets `status` to the policy's
///   rejected sentinel and the fallback is unspent: substitute once.
/// - Anything else: stop.
pub fn plan_retry(
    payload: &Row,
    kind: &ErrorKind,
    policy: &WritePolicy,
    status_fallback_spent: bool,
) -> RetryStep {
    match kind {
        ErrorKind::MissingColumn { column } if payload.contains_key(column) => {
            let mut next = payload.clone();
            next.remove(column);
            RetryStep::Retry(next)
        }
        ErrorKind::EnumOrCheckViolation if !status_fallback_spent => {
            let Some((rejected, fallback)) = &policy.status_fallback else {
                return RetryStep::Stop;
            };
            let current = payload.get(STATUS_KEY).and_then(Value::as_str);
            if current != Some(rejected.as_str()) {
                return RetryStep::Stop;
            }
            let mut next = payload.clone();
            next.insert(
                STATUS_KEY.to_string(),
                Value::String(fallback.clone()),
            );
            RetryStep::RetryWithStatusFallback(next)
        }
        _ => RetryStep::Stop,
    }
}

/// Insert a row, adapting the payload to whatever columns the deployment
/// actually has
///
/// # Errors
///
/// Returns `WriteExhausted` after `max_attempts` failed attempts, or
/// `Transport` for an unrecoverable unclassified error. Expected outcomes
/// (missing relation, denial, duplicate under an idempotent policy) are
/// `Ok` values; see [`WriteOutcome`].
pub fn adaptive_insert(
    transport: &dyn Transport,
    table: &str,
    payload: Row,
    returning: Option<&str>,
    policy: &WritePolicy,
) -> Result<WriteOutcome> {
    run_adaptive(table, payload, policy, |current| {
        transport.insert(table, current, returning).map(WriteOutcome::Written)
    })
}

/// Patch rows matching the filters, adapting the payload like
/// [`adaptive_insert`]
///
/// # Errors
///
/// Same contract as [`adaptive_insert`].
pub fn adaptive_update(
    transport: &dyn Transport,
    table: &str,
    filters: &[Filter],
    patch: Row,
    policy: &WritePolicy,
) -> Result<WriteOutcome> {
    run_adaptive(table, patch, policy, |current| {
        transport
            .update(table, filters, current)
            .map(|()| WriteOutcome::Written(None))
    })
}

/// The shared bounded loop behind both write verbs
fn run_adaptive<F>(table: &str, payload: Row, policy: &WritePolicy, mut send: F) -> Result<WriteOutcome>
where
    F: FnMut(&Row) -> std::result::Result<WriteOutcome, radar_postgrest::TransportError>,
{
    let mut current = payload;
    let mut status_fallback_spent = false;

    for attempt in 1..=policy.max_attempts {
        let err = match send(&current) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        let kind = classify(&err);
        match kind {
            ErrorKind::MissingRelation => {
                debug!(table, "relation absent, not retrying");
                return Ok(WriteOutcome::MissingRelation);
            }
            ErrorKind::PermissionDenied | ErrorKind::NotAuthenticated => {
                debug!(table, "write denied");
                return Ok(WriteOutcome::Denied);
            }
            ErrorKind::DuplicateKey if policy.duplicate_is_success => {
                debug!(table, "duplicate key treated as idempotent success");
                return Ok(WriteOutcome::Duplicate);
            }
            _ => {}
        }

        match plan_retry(&current, &kind, policy, status_fallback_spent) {
            RetryStep::Retry(next) => {
                debug!(table, attempt, ?kind, "stripping payload and retrying");
                current = next;
            }
            RetryStep::RetryWithStatusFallback(next) => {
                debug!(table, attempt, "substituting status sentinel and retrying");
                status_fallback_spent = true;
                current = next;
            }
            RetryStep::Stop => {
                return Err(RadarError::Transport {
                    table: table.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    warn!(
        table,
        attempts = policy.max_attempts,
        "adaptive write exhausted its attempt budget"
    );
    Err(RadarError::WriteExhausted {
        table: table.to_string(),
        attempts: policy.max_attempts,
    })
}
