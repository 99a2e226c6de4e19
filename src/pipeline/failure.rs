//! Error-to-response translation.

use crate::error::{Result, RouterError};
use crate::http::Response;
use crate::messages::MessageCatalog;

/// Turns a pipeline error into a negotiated error response.
#[derive(Debug, Clone, Copy)]
pub struct FailureTranslator<'a> {
    catalog: &'a MessageCatalog,
}

impl<'a> FailureTranslator<'a> {
    pub fn new(catalog: &'a MessageCatalog) -> Self {
        Self { catalog }
    }

    /// Copy of `in_flight` carrying the catalog status and message for
    /// `error`, with the error detail appended and no payload.
    pub fn translate(&self, error: &RouterError, in_flight: &Response) -> Response {
        let entry = self.catalog.lookup(error.key());
        let message = match error.detail() {
            Some(detail) => format!("{}: {}", entry.message, detail),
            None => entry.message.clone(),
        };
        in_flight
            .with_status(entry.status, "")
            .with_message(message)
            .without_data()
    }

    /// Translate and finalize through the regular `to_response` path.
    pub fn finalize(&self, error: &RouterError, in_flight: &Response) -> Result<Response> {
        let response = self.translate(error, in_flight);
        response.to_response()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MediaType;
    use crate::http::HttpMessage;
    use serde_json::json;

    fn in_flight() -> Response {
        Response::new()
            .with_content(MediaType::Json)
            .with_header("X-Service", "demo")
            .with_data(json!({"partial": true}))
    }

    #[test]
    fn test_known_kind_uses_catalog() {
        let catalog = MessageCatalog::new();
        let response = FailureTranslator::new(&catalog)
            .translate(&RouterError::MethodNotAllowed("TRACE".into()), &in_flight());

        assert_eq!(response.status(), Some(405));
        assert_eq!(response.reason_phrase(), "Method Not Allowed");
        assert_eq!(response.message(), Some("Method not allowed: TRACE"));
        assert!(response.data().is_none());
        assert_eq!(response.header_line("X-Service"), "demo");
    }

    #[test]
    fn test_generic_failure_is_service_unavailable() {
        let catalog = MessageCatalog::new();
        let response = FailureTranslator::new(&catalog)
            .translate(&RouterError::internal("database offline"), &in_flight());

        assert_eq!(response.status(), Some(503));
        assert_eq!(response.message(), Some("Service unavailable: database offline"));
    }

    #[test]
    fn test_finalize_writes_error_envelope() {
        let catalog = MessageCatalog::new();
        let response = FailureTranslator::new(&catalog)
            .finalize(&RouterError::MalformedBody, &in_flight())
            .unwrap();

        assert_eq!(
            response.body().to_bytes().unwrap(),
            br#"{"status":400,"message":"Received data is not valid","data":null}"#
        );
    }

    #[test]
    fn test_finalize_fails_without_codec() {
        let catalog = MessageCatalog::new();
        let result = FailureTranslator::new(&catalog)
            .finalize(&RouterError::MalformedBody, &Response::new());
        assert!(matches!(result, Err(RouterError::UnboundCodec)));
    }
}
