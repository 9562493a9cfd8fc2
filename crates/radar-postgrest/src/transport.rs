//! The transport seam
//!
//! All remote access goes through the [`Transport`] trait so the adaptive
//! write shim and the domain operations can be exercised against a scripted
//! mock. The error type deliberately carries the server's raw free-text
//! payload: there is no typed error contract with the backend, and the
//! classification layer upstream works by pattern-matching these fields.

use serde_json::Value;
use thiserror::Error;

/// An outbound payload or patch: a key-value map mutated only by the
/// adaptive retry planner between attempts
pub type Row = serde_json::Map<String, Value>;

/// A single equality filter (`column=eq.value` in PostgREST terms)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column to filter on
    pub column: String,
    /// Value the column must equal
    pub value: String,
}

impl Filter {
    /// Build an equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Raw error payload from the remote store
///
/// Mirrors the PostgREST error body shape. `code` may be a Postgres
/// SQLSTATE (`42703`) or a PostgREST code (`PGRST204`); `message` is
/// unstructured text and is the primary classification signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// SQLSTATE or PostgREST error code, when the server supplied one
    pub code: Option<String>,
    /// Free-text error message
    pub message: String,
    /// Optional detail text
    pub details: Option<String>,
    /// Optional hint text
    pub hint: Option<String>,
}

impl TransportError {
    /// Build an error carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Attach an error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach detail text
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach hint text
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The five verbs the Radar client needs from the remote store
///
/// Implementations: [`crate::HttpTransport`] for production,
/// [`crate::MockTransport`] for tests.
pub trait Transport {
    /// Insert one row, optionally returning the listed columns of the
    /// created row
    ///
    /// # Errors
    ///
    /// Returns the server's raw error payload on any non-success response.
    fn insert(
        &self,
        table: &str,
        row: &Row,
        returning: Option<&str>,
    ) -> Result<Option<Value>, TransportError>;

    /// Patch all rows matching the filters
    ///
    /// # Errors
    ///
    /// Returns the server's raw error payload on any non-success response.
    fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<(), TransportError>;

    /// Read rows matching the filters, selecting the given columns
    /// (`*` for all)
    ///
    /// # Errors
    ///
    /// Returns the server's raw error payload on any non-success response.
    fn select(
        &self,
        table: &str,
        filters: &[Filter],
        columns: &str,
    ) -> Result<Vec<Value>, TransportError>;

    /// Delete all rows matching the filters
    ///
    /// # Errors
    ///
    /// Returns the server's raw error payload on any non-success response.
    fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), TransportError>;

    /// Invoke a remote stored procedure by name
    ///
    /// # Errors
    ///
    /// Returns the server's raw error payload on any non-success response,
    /// including "could not find the function" for undeployed procedures.
    fn rpc(&self, function: &str, args: &Value) -> Result<Value, TransportError>;
}
