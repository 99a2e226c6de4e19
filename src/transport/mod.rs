//! Transport-level input to the pipeline.
//!
//! # Data Flow
//! ```text
//! axum request  ─┐
//!                ├→ TransportEvent → Router::emit → Emission → transport output
//! CGI env+stdin ─┘
//! ```
//!
//! # Design Decisions
//! - An event is plain data; it owns the raw body and any multipart parts
//! - Faults found while reading the body travel with the event so the
//!   pipeline can answer them with a negotiated error response

pub mod cgi;
pub mod multipart;

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::http::request::UploadedFile;

/// Fields and files decoded from a `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

/// One raw request as seen by a transport.
#[derive(Debug, Clone, Default)]
pub struct TransportEvent {
    pub method: Option<String>,
    pub uri: String,
    pub protocol_version: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub cookies: BTreeMap<String, String>,
    pub body: Bytes,
    pub form: Option<FormData>,
    pub fault: Option<String>,
}

impl TransportEvent {
    /// Event for `method` on `uri`; query pairs are decoded from the URI.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = parse_query(query_part(&uri));
        Self {
            method: Some(method.into()),
            uri,
            protocol_version: "1.1".to_string(),
            query,
            ..Self::default()
        }
    }

    /// Append a header; a `Cookie` header also fills the cookie mapping.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies.extend(parse_cookies(&value));
        }
        self.headers.push((name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_fault(mut self, fault: impl Into<String>) -> Self {
        self.fault = Some(fault.into());
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// First value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"))
    }

    /// True when the client asks for HTML, i.e. a browser.
    pub fn accepts_html(&self) -> bool {
        self.header("accept")
            .is_some_and(|accept| accept.contains("text/html"))
    }
}

fn query_part(uri: &str) -> &str {
    let without_fragment = uri.split('#').next().unwrap_or_default();
    without_fragment
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or_default()
}

/// Decode `a=1&b=2` into ordered pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Decode a `Cookie` header (`a=1; b=2`).
pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}
