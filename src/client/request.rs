//! Per-call request options.

use crate::errors::{InstatusError, InstatusResult};
use crate::serialization::to_json;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Serialize;

/// Default content type for request bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// File attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field name
    pub field_name: String,
    /// File name
    pub file_name: String,
    /// File content
    pub content: Bytes,
    /// MIME type
    pub mime_type: String,
}

impl FileUpload {
    /// Create a new file upload
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content: content.into(),
            mime_type: "application/octet-stream".to_string(),
        }
    }

    /// Set the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Body and attachments for one dispatch.
///
/// When form fields or files are present the request is sent as multipart
/// form data and any JSON or raw body is not sent.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    body: Option<Bytes>,
    content_type: Option<String>,
    fields: Vec<(String, String)>,
    files: Vec<FileUpload>,
}

impl RequestOptions {
    /// Options with no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying `value` as compact ASCII JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> InstatusResult<Self> {
        Ok(Self {
            body: Some(Bytes::from(to_json(value)?)),
            ..Self::default()
        })
    }

    /// Options carrying a raw body with its own content type.
    pub fn raw(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    /// Overrides the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a form field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a file
    pub fn file(mut self, upload: FileUpload) -> Self {
        self.files.push(upload);
        self
    }

    /// Returns true when the request goes out as multipart form data.
    pub fn is_multipart(&self) -> bool {
        !self.fields.is_empty() || !self.files.is_empty()
    }

    pub(crate) fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(APPLICATION_JSON)
    }

    /// Builds a fresh form. Called once per attempt since a sent form is consumed.
    pub(crate) fn multipart(&self) -> InstatusResult<Form> {
        let mut form = Form::new();

        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }

        for file in &self.files {
            let length = file.content.len() as u64;
            let part = Part::stream_with_length(Body::from(file.content.clone()), length)
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    InstatusError::client(format!(
                        "Invalid MIME type {} for {}: {}",
                        file.mime_type, file.file_name, e
                    ))
                })?;
            form = form.part(file.field_name.clone(), part);
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_options_are_encoded_once() {
        let options = RequestOptions::json(&json!({ "name": "Überwachung" })).unwrap();

        assert_eq!(
            options.body().unwrap().as_ref(),
            br#"{"name":"\u00dcberwachung"}"#
        );
        assert_eq!(options.content_type_or_default(), APPLICATION_JSON);
        assert!(!options.is_multipart());
    }

    #[test]
    fn test_raw_options() {
        let options = RequestOptions::raw("a,b,c", "text/csv");
        assert_eq!(options.content_type_or_default(), "text/csv");
    }

    #[test]
    fn test_multipart_rebuilds() {
        let options = RequestOptions::new()
            .field("name", "logo")
            .file(FileUpload::new("file", "logo.png", vec![0u8, 1, 2]).with_mime_type("image/png"));

        assert!(options.is_multipart());
        assert!(options.multipart().is_ok());
        assert!(options.multipart().is_ok());
    }

    #[test]
    fn test_invalid_mime_type() {
        let options = RequestOptions::new()
            .file(FileUpload::new("file", "x.bin", vec![1u8]).with_mime_type("not a mime"));
        assert!(options.multipart().is_err());
    }
}
