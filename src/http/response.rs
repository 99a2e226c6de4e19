//! Immutable response value and its finalize step.
//!
//! # Responsibilities
//! - Accumulate status, headers, payload and message through `with_*` copies
//! - Serialize the `{status, message, data}` envelope through the bound codec
//!
//! # Design Decisions
//! - Status stays unset until assigned; the envelope then carries `null`
//! - Finalize validates before writing, so a failure leaves the body untouched
//! - Reason phrases come from the standard table unless overridden

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::codec::{ContentCodec, MediaType};
use crate::error::{Result, RouterError};
use crate::http::headers::{Headers, HttpMessage};
use crate::http::stream::Stream;

const DEFAULT_PROTOCOL: &str = "1.1";

/// Copy-on-write response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<u16>,
    reason: String,
    headers: Headers,
    body: Stream,
    data: Option<Arc<Value>>,
    message: Option<String>,
    codec: Option<Arc<dyn ContentCodec>>,
    protocol: Option<String>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    pub fn body(&self) -> &Stream {
        &self.body
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn codec(&self) -> Option<&Arc<dyn ContentCodec>> {
        self.codec.as_ref()
    }

    pub fn protocol_version(&self) -> &str {
        self.protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL)
    }

    pub fn with_codec(&self, codec: Arc<dyn ContentCodec>) -> Self {
        Self {
            codec: Some(codec),
            ..self.clone()
        }
    }

    pub fn with_content(&self, media: MediaType) -> Self {
        self.with_codec(media.codec())
    }

    /// Copy with `code`; an empty `reason` selects the standard phrase.
    pub fn with_status(&self, code: u16, reason: &str) -> Self {
        let reason = if reason.is_empty() {
            default_reason_phrase(code).to_string()
        } else {
            reason.to_string()
        };
        Self {
            status: Some(code),
            reason,
            ..self.clone()
        }
    }

    pub fn with_data(&self, data: impl Into<Value>) -> Self {
        Self {
            data: Some(Arc::new(data.into())),
            ..self.clone()
        }
    }

    pub fn without_data(&self) -> Self {
        Self {
            data: None,
            ..self.clone()
        }
    }

    pub fn with_message(&self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn with_protocol_version(&self, version: &str) -> Self {
        Self {
            protocol: Some(version.to_string()),
            ..self.clone()
        }
    }

    pub fn with_body(&self, body: Stream) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    /// `HTTP/<version> <code> <phrase>`.
    pub fn status_line(&self) -> String {
        let code = self.status.map(|c| c.to_string()).unwrap_or_default();
        format!("HTTP/{} {} {}", self.protocol_version(), code, self.reason)
            .trim_end()
            .to_string()
    }

    /// The serialized envelope, in wire order.
    pub fn envelope(&self) -> Map<String, Value> {
        let mut envelope = Map::new();
        envelope.insert(
            "status".to_string(),
            self.status.map_or(Value::Null, Value::from),
        );
        envelope.insert(
            "message".to_string(),
            self.message.clone().map_or(Value::Null, Value::String),
        );
        envelope.insert(
            "data".to_string(),
            self.data.as_deref().cloned().unwrap_or(Value::Null),
        );
        envelope
    }

    /// Serialize the envelope into the body stream.
    ///
    /// Returns the number of bytes written. Nothing is written when header
    /// validation, codec lookup or conversion fails.
    pub fn to_response(&self) -> Result<usize> {
        self.headers.validate_names()?;
        let codec = self.codec.as_ref().ok_or(RouterError::UnboundCodec)?;
        let text = codec.convert(&self.envelope())?;
        Ok(self.body.write(text.as_bytes())?)
    }
}

impl HttpMessage for Response {
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

/// Standard phrase for `code`, or `""` when the code has none.
pub fn default_reason_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}
