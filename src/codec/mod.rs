//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! configured content type ("application/json" | "application/xml")
//!     → MediaType (parsed once, at config load)
//!     → ContentCodec (stateless, shared via Arc)
//!
//! inbound body text  → verify → translate → Map<String, Value>
//! outbound envelope  → convert → body text
//! ```
//!
//! # Design Decisions
//! - Codecs hold no state; one instance serves every request
//! - `translate` never fails: an empty or non-mapping document is an empty map
//! - An unknown media type is rejected where it is configured, not per request

pub mod json;
pub mod xml;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::RouterError;

pub use json::JsonCodec;
pub use xml::XmlCodec;

/// Errors raised while converting a mapping to wire text.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The XML reader rejected the document.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The XML document is well-tokenised but not a single rooted tree.
    #[error("Malformed XML document: {0}")]
    MalformedXml(&'static str),

    /// A mapping key cannot be used as an XML element name.
    #[error("Invalid XML element name: {0}")]
    InvalidElementName(String),

    /// Document bytes were not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Verify/translate/convert contract implemented once per wire format.
pub trait ContentCodec: Send + Sync + fmt::Debug {
    /// Media type this codec speaks.
    fn media_type(&self) -> MediaType;

    /// Returns true iff `text` is a syntactically valid document.
    fn verify(&self, text: &str) -> bool;

    /// Parse `text` into a generic mapping, or an empty one when there is nothing to map.
    fn translate(&self, text: &str) -> Map<String, Value>;

    /// Serialize a mapping into wire text.
    fn convert(&self, data: &Map<String, Value>) -> Result<String, CodecError>;
}

/// Wire formats the negotiator recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaType {
    #[default]
    Json,
    Xml,
}

impl MediaType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Codec for this media type.
    pub fn codec(self) -> Arc<dyn ContentCodec> {
        match self {
            Self::Json => Arc::new(JsonCodec),
            Self::Xml => Arc::new(XmlCodec),
        }
    }

    /// `Content-Type` header value with the given charset.
    pub fn header_value(self, charset: &str) -> String {
        format!("{}; charset={}", self.as_str(), charset)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = RouterError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let essence = tag.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(Self::Json.as_str()) {
            Ok(Self::Json)
        } else if essence.eq_ignore_ascii_case(Self::Xml.as_str()) {
            Ok(Self::Xml)
        } else {
            Err(RouterError::UnsupportedContentType(tag.to_string()))
        }
    }
}

impl TryFrom<String> for MediaType {
    type Error = RouterError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<MediaType> for String {
    fn from(media: MediaType) -> Self {
        media.as_str().to_string()
    }
}

/// Look up the codec for a content-type tag.
pub fn negotiate(tag: &str) -> Result<Arc<dyn ContentCodec>, RouterError> {
    tag.parse::<MediaType>().map(MediaType::codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_lookup() {
        assert_eq!("application/json".parse::<MediaType>().unwrap(), MediaType::Json);
        assert_eq!(
            "Application/XML; charset=UTF-8".parse::<MediaType>().unwrap(),
            MediaType::Xml
        );
        assert!(matches!(
            "text/plain".parse::<MediaType>(),
            Err(RouterError::UnsupportedContentType(tag)) if tag == "text/plain"
        ));
    }

    #[test]
    fn test_negotiate_returns_matching_codec() {
        assert_eq!(negotiate("application/xml").unwrap().media_type(), MediaType::Xml);
        assert!(negotiate("text/html").is_err());
    }

    #[test]
    fn test_media_type_deserializes_from_config_string() {
        #[derive(Deserialize)]
        struct Holder {
            content_type: MediaType,
        }

        let holder: Holder = toml::from_str(r#"content_type = "application/xml""#).unwrap();
        assert_eq!(holder.content_type, MediaType::Xml);

        let rejected = toml::from_str::<Holder>(r#"content_type = "text/csv""#);
        assert!(rejected.is_err());
    }
}
