//! Radar client - schema-adaptive data access for the community-events
//! backend
//!
//! This crate provides the client-side logic for the Radar feature set
//! (events, participants, invites, check-ins, comments, likes) over a
//! hosted PostgREST-style backend, including:
//! - Error classification over the server's free-text error payloads
//! - A schema-adaptive insert/update shim that strips columns the current
//!   deployment does not have and retries within a bounded attempt budget
//! - Dual-generation (legacy/v2) table fallback orchestration
//! - Remote-procedure preference with client-side fallback paths
//!
//! The remote schema exists in two parallel generations with overlapping
//! but not identical column sets, and deployments may be mid-migration.
//! Rather than hard-coding per-deployment schema knowledge, the shim treats
//! the server's own error messages as a runtime capability-discovery signal.

pub mod adaptive;
pub mod classify;
pub mod errors;
pub mod logging;
pub mod ops;

pub use adaptive::{
    adaptive_insert, adaptive_update, plan_retry, RetryStep, WriteOutcome, WritePolicy,
};
pub use classify::{classify, ErrorKind};
pub use errors::{RadarError, Result};
pub use ops::event_ops::{EventDraft, EventHandle};
