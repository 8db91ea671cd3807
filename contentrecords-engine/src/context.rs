//! Request context supplied by the host.
//!
//! The host buffers the whole request before rendering. Every instance on a
//! page reads the same [`HostRequest`], so an inline-edit body declined by one
//! instance is still intact for the next.

use std::sync::OnceLock;

use serde_json::{Map, Value};

/// A file part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was posted under.
    pub field: String,
    /// Client-supplied file name.
    pub filename: String,
    pub data: Vec<u8>,
}

/// A fully buffered HTTP request.
#[derive(Debug, Clone, Default)]
pub struct HostRequest {
    method: String,
    content_type: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    body: Vec<u8>,
    files: Vec<UploadedFile>,
    json: OnceLock<Option<Map<String, Value>>>,
}

impl HostRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn post() -> Self {
        Self::new("POST")
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the raw body. Resets the cached JSON view.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.json = OnceLock::new();
        self
    }

    /// Sets a JSON body and the matching content type.
    pub fn with_json(self, value: &Value) -> Self {
        self.with_content_type("application/json")
            .with_body(value.to_string())
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("application/json")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("multipart/form-data")
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn form_pairs(&self) -> &[(String, String)] {
        &self.form
    }

    /// The first file posted under `field`.
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn has_file(&self, fields: &[&str]) -> bool {
        fields.iter().any(|field| self.file(field).is_some())
    }

    /// Decodes the body as a JSON object.
    ///
    /// An empty body decodes as an empty object. Anything that is not an
    /// object is an error.
    pub fn json_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let body = self.body.trim_ascii();
        if body.is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_slice(body)
    }

    fn cached_json(&self) -> Option<&Map<String, Value>> {
        self.json
            .get_or_init(|| self.json_object().ok())
            .as_ref()
    }

    /// Looks up a request input: form values, then query parameters, then a
    /// string member of a JSON body.
    pub fn input(&self, key: &str) -> Option<&str> {
        if let Some((_, value)) = self.form.iter().find(|(k, v)| k == key && !v.is_empty()) {
            return Some(value);
        }
        if let Some((_, value)) = self.query.iter().find(|(k, _)| k == key) {
            return Some(value);
        }
        self.cached_json()?.get(key)?.as_str()
    }
}

/// Per-render view of the host environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    request: Option<&'a HostRequest>,
}

impl<'a> RenderContext<'a> {
    /// A context with no request (static rendering).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(request: &'a HostRequest) -> Self {
        Self {
            request: Some(request),
        }
    }

    pub fn request(&self) -> Option<&'a HostRequest> {
        self.request
    }

    /// A POST request, if this render is serving one.
    pub fn post(&self) -> Option<&'a HostRequest> {
        self.request.filter(|req| req.is_post())
    }

    /// Request input for `key`, or the empty string.
    pub fn input(&self, key: &str) -> &'a str {
        self.request
            .and_then(|req| req.input(key))
            .unwrap_or_default()
    }
}
