//! Error types for the Instatus client.

use crate::resilience::is_transient_io;
use crate::serialization::ResponseBody;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result type alias for Instatus operations.
pub type InstatusResult<T> = Result<T, InstatusError>;

/// Error kinds for categorizing Instatus errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstatusErrorKind {
    // HTTP errors
    /// Generic HTTP failure. Also used for 429 responses without the proxy marker.
    HttpException,
    /// Access forbidden (403).
    Forbidden,
    /// Resource not found (404).
    NotFound,
    /// Service unavailable (503) or a 5xx that outlived every retry.
    ServerError,

    // Library errors
    /// Invalid input supplied by the caller.
    Client,
    /// Invalid configuration.
    InvalidConfiguration,
    /// The client was closed.
    Closed,

    // Network errors
    /// Connection failed.
    ConnectionFailed,
    /// Request or operation timeout.
    Timeout,

    // Response errors
    /// Failed to deserialize response.
    DeserializationError,
}

impl fmt::Display for InstatusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpException => write!(f, "http_exception"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::ServerError => write!(f, "server_error"),
            Self::Client => write!(f, "client"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::Closed => write!(f, "closed"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DeserializationError => write!(f, "deserialization_error"),
        }
    }
}

/// Instatus API error with detailed information.
#[derive(Error, Debug)]
pub struct InstatusError {
    kind: InstatusErrorKind,
    /// Human-readable text. For HTTP errors this is `error.message` or the raw body.
    message: String,
    status_code: Option<u16>,
    /// Instatus specific error code, 0 when the body carried none.
    code: i64,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for InstatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        match self.status_code {
            Some(status) => {
                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("");
                write!(f, " {} {} (error code: {})", status, reason, self.code)?;
                if !self.message.is_empty() {
                    write!(f, ": {}", self.message)?;
                }
            }
            None => write!(f, " {}", self.message)?,
        }
        Ok(())
    }
}

impl InstatusError {
    /// Creates a new Instatus error.
    pub fn new(kind: InstatusErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            code: 0,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Sets the Instatus error code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> InstatusErrorKind {
        self.kind
    }

    /// Gets the error text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the Instatus error code.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Returns true for errors produced from an HTTP response.
    pub fn is_http(&self) -> bool {
        matches!(
            self.kind,
            InstatusErrorKind::HttpException
                | InstatusErrorKind::Forbidden
                | InstatusErrorKind::NotFound
                | InstatusErrorKind::ServerError
        )
    }

    /// Builds an error of the given kind from a response body.
    ///
    /// A JSON object body shaped like `{"error": {"code": .., "message": ..}}`
    /// supplies the code and message. Any other body becomes the message
    /// verbatim with code 0.
    pub fn from_body(kind: InstatusErrorKind, status: StatusCode, body: &ResponseBody) -> Self {
        let (code, message) = match body {
            ResponseBody::Json(value) => match value.get("error").filter(|e| e.is_object()) {
                Some(error) => (
                    parse_error_code(error.get("code")),
                    error
                        .get("message")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default()
                        .to_string(),
                ),
                None => (0, value.to_string()),
            },
            ResponseBody::Text(text) => (0, text.clone()),
        };

        Self::new(kind, message)
            .with_status(status.as_u16())
            .with_code(code)
    }

    /// Maps a terminal response to an error.
    pub fn from_response(status: StatusCode, body: &ResponseBody) -> Self {
        Self::from_body(Self::kind_from_status(status), status, body)
    }

    /// Maps an HTTP status code to an error kind.
    pub fn kind_from_status(status: StatusCode) -> InstatusErrorKind {
        match status.as_u16() {
            403 => InstatusErrorKind::Forbidden,
            404 => InstatusErrorKind::NotFound,
            503 => InstatusErrorKind::ServerError,
            _ => InstatusErrorKind::HttpException,
        }
    }

    /// Maps a transport failure from reqwest.
    pub fn from_transport(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            InstatusErrorKind::Timeout
        } else if error.is_connect() || error.is_request() || is_transient_io(&error) {
            InstatusErrorKind::ConnectionFailed
        } else if error.is_decode() {
            InstatusErrorKind::DeserializationError
        } else {
            InstatusErrorKind::HttpException
        };
        Self::new(kind, format!("Request failed: {}", error)).with_cause(error)
    }

    // Convenience constructors

    /// Creates a caller input error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(InstatusErrorKind::Client, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(InstatusErrorKind::InvalidConfiguration, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(InstatusErrorKind::Timeout, message)
    }

    /// Creates a closed-client error.
    pub fn closed() -> Self {
        Self::new(InstatusErrorKind::Closed, "Client has been closed")
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(InstatusErrorKind::DeserializationError, message)
    }
}

fn parse_error_code(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
