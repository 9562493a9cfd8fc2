//! Blocking HTTP implementation of [`Transport`] speaking PostgREST
//! conventions
//!
//! Request shape:
//! - `POST   /rest/v1/{table}`            insert (optionally with
//!   `Prefer: return=representation` and a `select` query)
//! - `PATCH  /rest/v1/{table}?col=eq.v`   update
//! - `GET    /rest/v1/{table}?select=...` select
//! - `DELETE /rest/v1/{table}?col=eq.v`   delete
//! - `POST   /rest/v1/rpc/{function}`     stored procedure invocation
//!
//! Error bodies are parsed leniently: a JSON object with
//! `message`/`code`/`details`/`hint` when the server sends one, otherwise
//! the raw body text is preserved as the message.

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::PostgrestConfig;
use crate::transport::{Filter, Row, Transport, TransportError};

/// PostgREST error body shape (all fields optional in practice)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Parse an error response body into a [`TransportError`]
///
/// Falls back to the raw body text (or the HTTP status line) when the body
/// is not the expected JSON object.
fn parse_error_body(status: u16, body: &str) -> TransportError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = parsed
            .message
            .unwrap_or_else(|| format!("HTTP {status}"));
        return TransportError {
            code: parsed.code,
            message,
            details: parsed.details,
            hint: parsed.hint,
        };
    }
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    };
    TransportError::message(message)
}

/// Blocking PostgREST client
pub struct HttpTransport {
    config: PostgrestConfig,
    client: Client,
}

impl HttpTransport {
    /// Create a transport from the given configuration
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the HTTP client cannot be built.
    pub fn new(config: PostgrestConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::message(format!("http client build failed: {e}")))?;
        Ok(Self { config, client })
    }

    fn table_url(&self, table: &str, filters: &[Filter]) -> Result<Url, TransportError> {
        let mut url = self
            .config
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| TransportError::message(format!("bad table url: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
            }
        }
        Ok(url)
    }

    fn rpc_url(&self, function: &str) -> Result<Url, TransportError> {
        self.config
            .base_url
            .join(&format!("rest/v1/rpc/{function}"))
            .map_err(|e| TransportError::message(format!("bad rpc url: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .config
            .bearer_token
            .as_deref()
            .unwrap_or(&self.config.api_key);
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
    }

    fn check(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }

    fn send_error(err: reqwest::Error) -> TransportError {
        TransportError::message(format!("http request failed: {err}"))
    }
}

impl Transport for HttpTransport {
    fn insert(
        &self,
        table: &str,
        row: &Row,
        returning: Option<&str>,
    ) -> Result<Option<Value>, TransportError> {
        let mut url = self.table_url(table, &[])?;
        if let Some(columns) = returning {
            url.query_pairs_mut().append_pair("select", columns);
        }
        debug!(table, "postgrest insert");
        let prefer = if returning.is_some() {
            "return=representation"
        } else {
            "return=minimal"
        };
        let response = self
            .authorize(self.client.post(url))
            .header("Prefer", prefer)
            .json(row)
            .send()
            .map_err(Self::send_error)?;
        let response = Self::check(response)?;
        if returning.is_none() {
            return Ok(None);
        }
        // Representation responses are arrays, one element per created row.
        let rows: Vec<Value> = response.json().map_err(Self::send_error)?;
        Ok(rows.into_iter().next())
    }

    fn update(&self, table: &str, filters: &[Filter], patch: &Row) -> Result<(), TransportError> {
        let url = self.table_url(table, filters)?;
        debug!(table, "postgrest update");
        let response = self
            .authorize(self.client.patch(url))
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .map_err(Self::send_error)?;
        Self::check(response)?;
        Ok(())
    }

    fn select(
        &self,
        table: &str,
        filters: &[Filter],
        columns: &str,
    ) -> Result<Vec<Value>, TransportError> {
        let mut url = self.table_url(table, filters)?;
        url.query_pairs_mut().append_pair("select", columns);
        debug!(table, "postgrest select");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .map_err(Self::send_error)?;
        let response = Self::check(response)?;
        response.json().map_err(Self::send_error)
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), TransportError> {
        let url = self.table_url(table, filters)?;
        debug!(table, "postgrest delete");
        let response = self
            .authorize(self.client.delete(url))
            .header("Prefer", "return=minimal")
            .send()
            .map_err(Self::send_error)?;
        Self::check(response)?;
        Ok(())
    }

    fn rpc(&self, function: &str, args: &Value) -> Result<Value, TransportError> {
        let url = self.rpc_url(function)?;
        debug!(function, "postgrest rpc");
        let response = self
            .authorize(self.client.post(url))
            .json(args)
            .send()
            .map_err(Self::send_error)?;
        let response = Self::check(response)?;
        let body = response.text().map_err(Self::send_error)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| TransportError::message(format!("malformed rpc response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_body_full_shape() {
        let body = r#"{"message":"column events.church_name does not exist","code":"42703","details":null,"hint":null}"#;
        let err = parse_error_body(400, body);
        assert_eq!(err.code.as_deref(), Some("42703"));
        assert_eq!(err.message, "column events.church_name does not exist");
    }

    #[test]
    fn test_parse_error_body_message_only() {
        let err = parse_error_body(404, r#"{"message":"relation \"public.events\" does not exist"}"#);
        assert!(err.code.is_none());
        assert!(err.message.contains("does not exist"));
    }

    #[test]
    fn test_parse_error_body_non_json_falls_back_to_text() {
        let err = parse_error_body(502, "Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
        assert!(err.code.is_none());
    }

    #[test]
    fn test_parse_error_body_empty_uses_status() {
        let err = parse_error_body(500, "");
        assert_eq!(err.message, "HTTP 500");
    }

    #[test]
    fn test_table_url_filters() {
        let config = PostgrestConfig::new("https://example.supabase.co", "key").unwrap();
        let transport = HttpTransport::new(config).unwrap();
        let url = transport
            .table_url("events", &[Filter::eq("id", "abc"), Filter::eq("status", "ACTIVE")])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/events");
        assert_eq!(url.query(), Some("id=eq.abc&status=eq.ACTIVE"));
    }

    #[test]
    fn test_rpc_url() {
        let config = PostgrestConfig::new("https://example.supabase.co", "key").unwrap();
        let transport = HttpTransport::new(config).unwrap();
        let url = transport.rpc_url("join_event").unwrap();
        assert_eq!(url.path(), "/rest/v1/rpc/join_event");
    }
}
