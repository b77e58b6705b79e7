//! Wire encoding for request and response bodies.
//!
//! Request bodies go out as compact JSON with every non-ASCII character
//! escaped. Response bodies are decoded as JSON only when the server labels
//! them `application/json`; anything else stays text.

use crate::errors::{InstatusError, InstatusResult};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Parsed body of an API response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body served as `application/json`.
    Json(serde_json::Value),
    /// Any other body.
    Text(String),
}

impl ResponseBody {
    /// Returns the JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text, if the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Deserializes the body into `T`.
    ///
    /// Text bodies are offered as a JSON string, and an empty text body as
    /// `null`, so `()` and `Option<_>` targets work for bodiless responses.
    pub fn deserialize<T: DeserializeOwned>(self) -> InstatusResult<T> {
        let value = match self {
            Self::Json(value) => value,
            Self::Text(text) if text.is_empty() => serde_json::Value::Null,
            Self::Text(text) => serde_json::Value::String(text),
        };
        serde_json::from_value(value).map_err(|e| {
            InstatusError::deserialization(format!("Failed to deserialize response: {}", e))
                .with_cause(e)
        })
    }
}

/// Compact formatter that escapes non-ASCII characters as `\uXXXX`.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                writer.write_all(format!("\\u{:04x}", unit).as_bytes())?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serializes a value as compact, ASCII-only JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> InstatusResult<String> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut serializer).map_err(|e| {
        InstatusError::client(format!("Failed to serialize request body: {}", e)).with_cause(e)
    })?;
    // The formatter only ever emits ASCII.
    String::from_utf8(out)
        .map_err(|e| InstatusError::client(format!("Serialized body was not UTF-8: {}", e)))
}

/// Returns true when the response is labelled exactly `application/json`.
pub fn is_json_response(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "application/json")
        .unwrap_or(false)
}

/// Decodes a response body the way the dispatcher consumes it.
pub fn json_or_text(headers: &HeaderMap, text: String) -> ResponseBody {
    if is_json_response(headers) {
        match serde_json::from_str(&text) {
            Ok(value) => return ResponseBody::Json(value),
            Err(e) => {
                tracing::debug!(error = %e, "Body labelled JSON did not parse, keeping text");
            }
        }
    }
    ResponseBody::Text(text)
}
