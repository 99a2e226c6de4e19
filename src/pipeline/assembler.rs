//! Request assembly: transport event → immutable [`Request`].
//!
//! # Responsibilities
//! - Resolve the request method
//! - Map query string, body or multipart form into the query mapping
//! - Copy URI, protocol version, headers and cookies onto the request
//!
//! # Design Decisions
//! - GET parameters are wrapped under `data`, bodies are merged as translated
//! - An empty DELETE body is skipped without verification
//! - Multipart POST bypasses the codec; its files are appended one by one
//! - The raw body is kept on a rewound stream for handlers that want it

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::ContentCodec;
use crate::error::{Result, RouterError};
use crate::http::request::REQUEST_ID_ATTRIBUTE;
use crate::http::{HttpMessage, Method, Request, Stream, Uri};
use crate::transport::TransportEvent;

/// Header carrying the correlation ID set by the server.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Key every wrapped parameter set is stored under.
pub const DATA_KEY: &str = "data";

/// Builds requests using the negotiated codec.
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    codec: Arc<dyn ContentCodec>,
}

impl RequestAssembler {
    pub fn new(codec: Arc<dyn ContentCodec>) -> Self {
        Self { codec }
    }

    /// The event's method, or `MissingMethod` / `MethodNotAllowed`.
    pub fn method(event: &TransportEvent) -> Result<Method> {
        match event.method.as_deref().map(str::trim) {
            None | Some("") => Err(RouterError::MissingMethod),
            Some(method) => method.parse(),
        }
    }

    pub fn assemble(&self, method: Method, event: &TransportEvent) -> Result<Request> {
        if let Some(fault) = &event.fault {
            return Err(RouterError::Transport(fault.clone()));
        }

        let mut request = event
            .headers
            .iter()
            .fold(Request::new(method), |request, (name, value)| {
                request.with_added_header(name, value.clone())
            })
            .with_protocol_version(&event.protocol_version)
            .with_uri(Uri::parse(&event.uri)?, true);

        if let Some(id) = event.header(X_REQUEST_ID) {
            request = request.with_attribute(REQUEST_ID_ATTRIBUTE, id);
        }

        if method == Method::Get {
            let params: Map<String, Value> = event
                .query
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            request = request.with_query_params(wrap_data(Value::Object(params)));
        } else if method.carries_body() {
            request = self.read_body(request, event)?;
        }

        Ok(request.with_cookie_params(event.cookies.clone()))
    }

    fn read_body(&self, request: Request, event: &TransportEvent) -> Result<Request> {
        let raw = &event.body;
        if request.method() == Method::Delete && raw.is_empty() {
            return Ok(request);
        }

        let request = if request.method() == Method::Post && event.is_multipart() {
            let form = event.form.clone().unwrap_or_default();
            request
                .with_query_params(wrap_data(Value::Object(form.fields)))
                .with_uploaded_files(form.files)
        } else {
            let text = std::str::from_utf8(raw).map_err(|_| RouterError::MalformedBody)?;
            if !self.codec.verify(text) {
                return Err(RouterError::MalformedBody);
            }
            let parsed = self.codec.translate(text);
            request
                .with_query_params(parsed.clone())
                .with_parsed_body(Value::Object(parsed))
        };

        let body = Stream::memory();
        body.write(raw)?;
        body.rewind()?;
        Ok(request.with_body(body))
    }
}

fn wrap_data(value: Value) -> Map<String, Value> {
    Map::from_iter([(DATA_KEY.to_string(), value)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MediaType;
    use crate::http::request::UploadedFile;
    use crate::transport::FormData;
    use bytes::Bytes;
    use serde_json::json;

    fn assembler(media: MediaType) -> RequestAssembler {
        RequestAssembler::new(media.codec())
    }

    fn assemble(event: &TransportEvent) -> Result<Request> {
        let method = RequestAssembler::method(event)?;
        assembler(MediaType::Json).assemble(method, event)
    }

    #[test]
    fn test_method_resolution() {
        let mut event = TransportEvent::default();
        assert!(matches!(RequestAssembler::method(&event), Err(RouterError::MissingMethod)));

        event.method = Some("BREW".to_string());
        assert!(matches!(
            RequestAssembler::method(&event),
            Err(RouterError::MethodNotAllowed(_))
        ));

        event.method = Some("patch".to_string());
        assert_eq!(RequestAssembler::method(&event).unwrap(), Method::Patch);
    }

    #[test]
    fn test_get_wraps_query_under_data() {
        let request = assemble(&TransportEvent::new("GET", "/items?a=1&b=2")).unwrap();
        assert_eq!(
            Value::Object(request.query_params().clone()),
            json!({"data": {"a": "1", "b": "2"}})
        );
        assert_eq!(request.uri().path(), "/items");
    }

    #[test]
    fn test_post_json_merges_body() {
        let event = TransportEvent::new("POST", "/orders").with_body(r#"{"x":1}"#);
        let request = assemble(&event).unwrap();

        assert_eq!(Value::Object(request.query_params().clone()), json!({"x": 1}));
        assert_eq!(request.parsed_body(), Some(&json!({"x": 1})));
        assert_eq!(request.body().contents().unwrap(), br#"{"x":1}"#);
    }

    #[test]
    fn test_invalid_body_is_malformed() {
        for body in [&b"{\"x\":"[..], &b""[..], &b"\xff\xfe"[..]] {
            let event = TransportEvent::new("PUT", "/").with_body(Bytes::copy_from_slice(body));
            assert!(matches!(assemble(&event), Err(RouterError::MalformedBody)));
        }
    }

    #[test]
    fn test_empty_delete_is_skipped() {
        let request = assemble(&TransportEvent::new("DELETE", "/orders/1")).unwrap();
        assert!(request.query_params().is_empty());
        assert!(request.parsed_body().is_none());
        assert_eq!(request.body().size().unwrap(), 0);
    }

    #[test]
    fn test_delete_with_body_is_verified() {
        let event = TransportEvent::new("DELETE", "/").with_body("not json");
        assert!(matches!(assemble(&event), Err(RouterError::MalformedBody)));
    }

    #[test]
    fn test_multipart_post_bypasses_codec() {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("report"));
        let file = |name: &str| UploadedFile {
            field: "docs".to_string(),
            file_name: Some(name.to_string()),
            content_type: Some("text/plain".to_string()),
            data: Bytes::from_static(b"..."),
        };
        let event = TransportEvent::new("POST", "/upload")
            .with_header("Content-Type", "multipart/form-data; boundary=b")
            .with_body("--b--")
            .with_form(FormData {
                fields,
                files: vec![file("a.txt"), file("b.txt")],
            });

        let request = assemble(&event).unwrap();
        assert_eq!(
            Value::Object(request.query_params().clone()),
            json!({"data": {"title": "report"}})
        );
        assert_eq!(request.uploaded_files().len(), 2);
        assert!(request.parsed_body().is_none());
    }

    #[test]
    fn test_xml_body() {
        let event = TransportEvent::new("POST", "/").with_body("<req><id>4</id></req>");
        let request = assembler(MediaType::Xml).assemble(Method::Post, &event).unwrap();
        assert_eq!(Value::Object(request.query_params().clone()), json!({"id": "4"}));
    }

    #[test]
    fn test_metadata_and_cookies() {
        let event = TransportEvent::new("HEAD", "/ping")
            .with_header("X-Request-Id", "req-42")
            .with_header("Cookie", "sid=s1")
            .with_protocol_version("2");

        let request = assemble(&event).unwrap();
        assert_eq!(request.attribute(REQUEST_ID_ATTRIBUTE), Some(&json!("req-42")));
        assert_eq!(request.cookie_params().get("sid").map(String::as_str), Some("s1"));
        assert_eq!(request.protocol_version(), "2");
        assert_eq!(request.header_line("x-request-id"), "req-42");
        assert!(request.query_params().is_empty());
    }

    #[test]
    fn test_transport_fault() {
        let event = TransportEvent::new("POST", "/").with_fault("body exceeded limit");
        assert!(matches!(
            assemble(&event),
            Err(RouterError::Transport(reason)) if reason == "body exceeded limit"
        ));
    }
}
