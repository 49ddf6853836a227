//! Outbound request model.
//!
//! # Responsibilities
//! - Describe one outbound call: method, URL, headers, query, body
//! - Render the query-qualified URL
//! - Map the content-type tag to a MIME string on demand
//!
//! # Design Decisions
//! - Built fresh per call and exclusively owned; never reused
//! - The content-type tag has no side effect until `apply_mime_type`
//! - All operations are total; nothing here can fail

use crate::http::params::{HeaderFields, QueryParams};

/// HTTP method for an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Whether the body is sent on the wire.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MimeType {
    #[default]
    None,
    Json,
    Msgpack,
    OctetStream,
}

impl MimeType {
    /// `None` falls back to `application/octet-stream`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Json => "application/json",
            MimeType::Msgpack => "application/x-msgpack",
            MimeType::OctetStream | MimeType::None => "application/octet-stream",
        }
    }
}

/// A single outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderFields,
    query: QueryParams,
    body: Vec<u8>,
    mime: MimeType,
}

impl Request {
    /// A GET request for `url` with nothing else set.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body from text.
    pub fn set_body_text(&mut self, body: &str) {
        self.body = body.as_bytes().to_vec();
    }

    /// Body from raw bytes.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn mime_type(&self) -> MimeType {
        self.mime
    }

    pub fn set_mime_type(&mut self, mime: MimeType) {
        self.mime = mime;
    }

    /// Write `Content-Type` from the current tag.
    pub fn apply_mime_type(&mut self) {
        self.headers.set("Content-Type", self.mime.as_str());
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.set(key, value);
    }

    /// Replace every header at once.
    pub fn set_headers(&mut self, headers: HeaderFields) {
        self.headers = headers;
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }

    pub fn set_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.set(key, value);
    }

    /// Replace every query parameter at once; duplicates are kept.
    pub fn set_query_params(&mut self, params: QueryParams) {
        self.query = params;
    }

    /// `url?k1=v1&k2=v2`, or the bare URL when there are no parameters.
    pub fn build_url_with_params(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        format!("{}?{}", self.url, self.query.to_query_string())
    }
}
