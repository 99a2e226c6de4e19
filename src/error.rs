//! Pipeline error kinds.
//!
//! Every failure raised while assembling a request or running the phases is a
//! [`RouterError`]. Errors travel up with `?` to the boundary in
//! [`Router::emit`](crate::pipeline::Router::emit), where each kind is mapped to a
//! status and message through its symbolic [`key`](RouterError::key).

use thiserror::Error;

use crate::codec::CodecError;

/// Errors that can occur while handling one request.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The negotiated content type has no codec.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The transport did not report a request method.
    #[error("Request method is missing")]
    MissingMethod,

    /// The request body failed codec verification.
    #[error("Received data is not valid")]
    MalformedBody,

    /// The request method is not in the allowed set.
    #[error("Request method {0} is not allowed")]
    MethodNotAllowed(String),

    /// The URI string could not be parsed.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A request target contained whitespace.
    #[error("Invalid request target: {0}")]
    InvalidRequestTarget(String),

    /// A header name has characters outside `[A-Za-z0-9-]`.
    #[error("Invalid characters in header name: {0}")]
    InvalidHeaderName(String),

    /// A response was finalized before a codec was bound.
    #[error("Response content type is not specified")]
    UnboundCodec,

    /// The access phase denied a non-public operation.
    #[error("Access denied for operation {0}")]
    Unauthorized(String),

    /// The transport could not deliver a usable request body.
    #[error("Transport fault: {0}")]
    Transport(String),

    /// A codec failed to serialize a payload.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A byte stream operation failed.
    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Any other failure raised by application phases.
    #[error("{0}")]
    Internal(String),
}

impl RouterError {
    /// Wrap an arbitrary failure as an internal error.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal(message.to_string())
    }

    /// Symbolic key used to look up the status and message for this kind.
    pub fn key(&self) -> &'static str {
        match self {
            Self::UnsupportedContentType(_) => "router.content_type_unsupported",
            Self::MissingMethod => "router.method_missing",
            Self::MalformedBody => "router.malformed_body",
            Self::MethodNotAllowed(_) => "router.method_not_allowed",
            Self::InvalidUri(_) => "router.invalid_uri",
            Self::InvalidRequestTarget(_) => "router.invalid_request_target",
            Self::InvalidHeaderName(_) => "router.invalid_header_name",
            Self::UnboundCodec => "router.codec_unbound",
            Self::Unauthorized(_) => "router.auth_denied",
            Self::Transport(_) => "router.transport",
            Self::Codec(_) | Self::Stream(_) | Self::Internal(_) => "http.service_unavailable",
        }
    }

    /// Detail appended to the catalog message, if the kind carries one.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::UnsupportedContentType(detail)
            | Self::MethodNotAllowed(detail)
            | Self::InvalidUri(detail)
            | Self::InvalidRequestTarget(detail)
            | Self::InvalidHeaderName(detail)
            | Self::Transport(detail) => Some(detail.clone()),
            Self::Codec(e) => Some(e.to_string()),
            Self::Stream(e) => Some(e.to_string()),
            Self::Internal(message) => Some(message.clone()),
            Self::MissingMethod | Self::MalformedBody | Self::UnboundCodec | Self::Unauthorized(_) => None,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T, E = RouterError> = std::result::Result<T, E>;
