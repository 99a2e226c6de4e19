//! Immutable server-side request value.
//!
//! # Responsibilities
//! - Hold everything the assembler extracted from one transport event
//! - Offer `with_*` copies that share unmodified fields with the receiver
//!
//! # Design Decisions
//! - Query, cookie and upload writes merge into the existing collections
//! - Attributes are the request-scoped extension point between stages
//! - The request target is derived from the URI unless set explicitly

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{Result, RouterError};
use crate::http::headers::{Headers, HttpMessage};
use crate::http::method::Method;
use crate::http::stream::Stream;
use crate::http::uri::Uri;

/// Attribute holding the transport's correlation ID.
pub const REQUEST_ID_ATTRIBUTE: &str = "request_id";

/// One file received in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Declared media type of the part.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Copy-on-write request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    headers: Headers,
    body: Stream,
    query: Arc<Map<String, Value>>,
    cookies: Arc<BTreeMap<String, String>>,
    files: Arc<Vec<UploadedFile>>,
    attributes: Arc<Map<String, Value>>,
    uri: Uri,
    protocol_version: String,
    request_target: Option<String>,
    parsed_body: Option<Arc<Value>>,
}

impl Request {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Headers::new(),
            body: Stream::memory(),
            query: Arc::default(),
            cookies: Arc::default(),
            files: Arc::default(),
            attributes: Arc::default(),
            uri: Uri::default(),
            protocol_version: "1.1".to_string(),
            request_target: None,
            parsed_body: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body(&self) -> &Stream {
        &self.body
    }

    pub fn query_params(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn cookie_params(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_deref()
    }

    /// Explicit target, else `path[?query]`, else `/`.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.request_target {
            return target.clone();
        }
        let mut target = self.uri.path().to_string();
        if !self.uri.query().is_empty() {
            target.push('?');
            target.push_str(self.uri.query());
        }
        if target.is_empty() {
            target.push('/');
        }
        target
    }

    /// Copy with `params` merged over the existing query mapping.
    pub fn with_query_params(&self, params: Map<String, Value>) -> Self {
        let mut next = self.clone();
        let query = Arc::make_mut(&mut next.query);
        for (key, value) in params {
            query.insert(key, value);
        }
        next
    }

    pub fn with_cookie_params<I>(&self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut next = self.clone();
        Arc::make_mut(&mut next.cookies).extend(cookies);
        next
    }

    /// Copy with `files` appended to the upload list.
    pub fn with_uploaded_files<I>(&self, files: I) -> Self
    where
        I: IntoIterator<Item = UploadedFile>,
    {
        let mut next = self.clone();
        Arc::make_mut(&mut next.files).extend(files);
        next
    }

    pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.attributes).insert(name.to_string(), value.into());
        next
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        if !self.attributes.contains_key(name) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.attributes).remove(name);
        next
    }

    pub fn with_method(&self, method: Method) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    pub fn with_body(&self, body: Stream) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    pub fn with_parsed_body(&self, data: Value) -> Self {
        Self {
            parsed_body: Some(Arc::new(data)),
            ..self.clone()
        }
    }

    pub fn with_protocol_version(&self, version: &str) -> Self {
        Self {
            protocol_version: version.to_string(),
            ..self.clone()
        }
    }

    /// Copy with `uri`; the `Host` header follows the new host unless
    /// `preserve_host` is set and a `Host` header is already present.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let keep_host = preserve_host && self.has_header("Host");
        let mut next = Self {
            uri,
            ..self.clone()
        };
        if !keep_host && !next.uri.host().is_empty() {
            let host = match next.uri.port() {
                Some(port) => format!("{}:{}", next.uri.host(), port),
                None => next.uri.host().to_string(),
            };
            next = next.with_header("Host", host);
        }
        next
    }

    pub fn with_request_target(&self, target: &str) -> Result<Self> {
        if target.chars().any(char::is_whitespace) {
            return Err(RouterError::InvalidRequestTarget(target.to_string()));
        }
        Ok(Self {
            request_target: Some(target.to_string()),
            ..self.clone()
        })
    }
}

impl HttpMessage for Request {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn replace_headers(&self, headers: Headers) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }
}
