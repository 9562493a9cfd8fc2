//! PostgREST transport binding for the Radar client
//!
//! This crate owns the seam between the domain operations and the hosted
//! relational store:
//! - A [`Transport`] trait covering the five verbs the client needs
//!   (insert / update / select / delete / rpc)
//! - An HTTP implementation speaking PostgREST conventions
//! - An explicit [`PostgrestConfig`] (never read from ambient globals)
//! - A scripted [`MockTransport`] used by tests across the workspace
//!
//! Server errors arrive as free-text payloads; [`TransportError`] preserves
//! them verbatim (message, optional code/details/hint) so the classification
//! layer upstream can pattern-match on them.

pub mod config;
pub mod http;
pub mod mock;
pub mod transport;

pub use config::{ConfigError, PostgrestConfig};
pub use http::HttpTransport;
pub use mock::{MockCall, MockReply, MockTransport};
pub use transport::{Filter, Row, Transport, TransportError};
