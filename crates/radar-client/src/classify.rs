//! Error classification over the server's free-text error payloads
//!
//! There is no typed error contract with the backend: errors arrive as
//! unstructured strings, sometimes with a SQLSTATE or PostgREST code
//! attached. This module is the single place that pattern-matching lives;
//! everything upstream works against [`ErrorKind`] so the matching rules
//! can be swapped for a structured-code check without touching call sites.

use radar_postgrest::TransportError;

/// Classified view of a raw server error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The target table lacks the named column; the shim strips it and
    /// retries
    MissingColumn {
        /// Column name extracted from the message
        column: String,
    },
    /// The target table/view does not exist in this deployment
    MissingRelation,
    /// The named stored procedure is not deployed
    MissingFunction,
    /// Row-level security or grant denial
    PermissionDenied,
    /// No authenticated session
    NotAuthenticated,
    /// Unique-constraint violation
    DuplicateKey,
    /// Foreign-key violation
    ForeignKeyViolation,
    /// Enum input or check-constraint violation
    EnumOrCheckViolation,
    /// Ambiguous column reference in a server-side query
    AmbiguousColumn,
    /// Anything we cannot classify
    Other,
}

/// Classify a raw server error
///
/// Codes are checked first (Postgres SQLSTATE and PostgREST `PGRST*`
/// codes), then substring signals over the lowercased message and details.
/// A missing-column error whose column name cannot be extracted is `Other`:
/// without the name the shim has nothing to strip.
pub fn classify(err: &TransportError) -> ErrorKind {
    if let Some(kind) = classify_code(err) {
        return kind;
    }

    let mut haystack = err.message.to_lowercase();
    if let Some(details) = &err.details {
        haystack.push(' ');
        haystack.push_str(&details.to_lowercase());
    }

    if haystack.contains("row-level security") || haystack.contains("permission denied") {
        return ErrorKind::PermissionDenied;
    }
    if haystack.contains("not authenticated") || haystack.contains("jwt") {
        return ErrorKind::NotAuthenticated;
    }
    if haystack.contains("duplicate key") {
        return ErrorKind::DuplicateKey;
    }
    if haystack.contains("foreign key") {
        return ErrorKind::ForeignKeyViolation;
    }
    if haystack.contains("invalid input value for enum") || haystack.contains("check constraint") {
        return ErrorKind::EnumOrCheckViolation;
    }
    if haystack.contains("is ambiguous") {
        return ErrorKind::AmbiguousColumn;
    }
    if haystack.contains("could not find the function")
        || (haystack.contains("function") && haystack.contains("does not exist"))
    {
        return ErrorKind::MissingFunction;
    }
    if haystack.contains("could not find the table")
        || (haystack.contains("relation") && haystack.contains("does not exist"))
        || (haystack.contains("table") && haystack.contains("does not exist"))
    {
        return ErrorKind::MissingRelation;
    }
    if (haystack.contains("column") && haystack.contains("does not exist"))
        || (haystack.contains("could not find") && haystack.contains("column"))
    {
        return match extract_column(&err.message) {
            Some(column) => ErrorKind::MissingColumn { column },
            None => ErrorKind::Other,
        };
    }

    ErrorKind::Other
}

/// Classification by error code alone, when the server supplied one
fn classify_code(err: &TransportError) -> Option<ErrorKind> {
    let code = err.code.as_deref()?;
    match code {
        "42703" | "PGRST204" => {
            // Column name still has to come out of the message.
            extract_column(&err.message).map(|column| ErrorKind::MissingColumn { column })
        }
        "42P01" | "PGRST205" => Some(ErrorKind::MissingRelation),
        "42501" => Some(ErrorKind::PermissionDenied),
        "PGRST301" => Some(ErrorKind::NotAuthenticated),
        "23505" => Some(ErrorKind::DuplicateKey),
        "23503" => Some(ErrorKind::ForeignKeyViolation),
        "22P02" | "23514" => Some(ErrorKind::EnumOrCheckViolation),
        "42883" | "PGRST202" => Some(ErrorKind::MissingFunction),
        "42702" => Some(ErrorKind::AmbiguousColumn),
        _ => None,
    }
}

/// Pull the offending column name out of a missing-column message
///
/// Handles the observed shapes:
/// - `column "church_name" of relation "events" does not exist`
/// - `column events.church_name does not exist`
/// - `Could not find the 'church_name' column of 'events' in the schema cache`
fn extract_column(message: &str) -> Option<String> {
    if let Some(token) = quoted_token(message) {
        return Some(strip_qualifier(&token));
    }
    let lower = message.to_lowercase();
    let start = lower.find("column ")? + "column ".len();
    let rest = &message[start..];
    // split(' ') rather than split_whitespace: a run of spaces after
    // "column" means the name is genuinely absent, not further along.
    let word = rest.split(' ').next()?;
    let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '.');
    if word.is_empty() {
        return None;
    }
    Some(strip_qualifier(word))
}

/// First token enclosed in single or double quotes, if any
fn quoted_token(message: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let mut parts = message.split(quote);
        let _before = parts.next()?;
        if let Some(inside) = parts.next() {
            if !inside.is_empty() && !inside.contains(' ') {
                return Some(inside.to_string());
            }
        }
    }
    None
}

/// Drop a `table.` qualifier from a column reference
fn strip_qualifier(column: &str) -> String {
    match column.rsplit_once('.') {
        Some((_, bare)) => bare.to_string(),
        None => column.to_string(),
    }
}
