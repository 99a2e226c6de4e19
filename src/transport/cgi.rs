//! One-shot CGI transport.
//!
//! # Responsibilities
//! - Build a [`TransportEvent`] from CGI meta-variables and the stdin body
//! - Write an [`Emission`] as a CGI response (`Status:` line, headers, body)
//!
//! # Design Decisions
//! - `HTTP_*` variables become headers (`HTTP_X_TRACE_ID` → `X-Trace-Id`)
//! - An undelivered emission writes nothing at all

use std::collections::BTreeMap;
use std::io::{self, Write};

use bytes::Bytes;

use crate::pipeline::Emission;
use crate::transport::{multipart, TransportEvent};

/// Build the event for the current CGI request.
pub async fn read_event<I>(vars: I, body: Bytes) -> TransportEvent
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: BTreeMap<String, String> = vars.into_iter().collect();
    let var = |name: &str| vars.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let uri = match var("REQUEST_URI") {
        Some(uri) => uri.to_string(),
        None => {
            let path = var("PATH_INFO").unwrap_or("/");
            match var("QUERY_STRING") {
                Some(query) => format!("{path}?{query}"),
                None => path.to_string(),
            }
        }
    };

    let mut event = TransportEvent::new(var("REQUEST_METHOD").unwrap_or_default(), uri);
    event.method = var("REQUEST_METHOD").map(str::to_string);
    if let Some(protocol) = var("SERVER_PROTOCOL") {
        let version = protocol.split_once('/').map_or(protocol, |(_, v)| v);
        event = event.with_protocol_version(version);
    }

    for (name, value) in &vars {
        let header = match name.as_str() {
            "CONTENT_TYPE" => "Content-Type".to_string(),
            "CONTENT_LENGTH" => "Content-Length".to_string(),
            other => match other.strip_prefix("HTTP_") {
                Some(rest) => header_name(rest),
                None => continue,
            },
        };
        event = event.with_header(header, value.clone());
    }

    event = event.with_body(body);
    if event.method.as_deref() == Some("POST") && event.is_multipart() {
        let content_type = event.content_type().unwrap_or_default().to_string();
        match multipart::read_form(&content_type, event.body.clone()).await {
            Ok(form) => event = event.with_form(form),
            Err(e) => event = event.with_fault(e.to_string()),
        }
    }
    event
}

/// `X_TRACE_ID` → `X-Trace-Id`.
fn header_name(cgi: &str) -> String {
    cgi.split('_')
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Write `emission` in CGI response form.
pub fn write_response(emission: &Emission, out: &mut impl Write) -> io::Result<()> {
    if !emission.is_delivered() {
        return Ok(());
    }

    let status = emission.status();
    let reason = emission.response().reason_phrase();
    let status_line = format!("Status: {status} {reason}");
    write!(out, "{}\r\n", status_line.trim_end())?;
    for (name, values) in emission.headers().iter() {
        for value in values {
            write!(out, "{name}: {value}\r\n")?;
        }
    }
    out.write_all(b"\r\n")?;
    out.write_all(&emission.body())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::pipeline::{controller, Phases, Router};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_read_event_from_environment() {
        let event = read_event(
            vars(&[
                ("REQUEST_METHOD", "GET"),
                ("PATH_INFO", "/items"),
                ("QUERY_STRING", "a=1"),
                ("SERVER_PROTOCOL", "HTTP/1.0"),
                ("HTTP_ACCEPT", "application/json"),
                ("HTTP_X_TRACE_ID", "t-1"),
                ("HTTP_COOKIE", "sid=9"),
                ("DOCUMENT_ROOT", "/var/www"),
            ]),
            Bytes::new(),
        )
        .await;

        assert_eq!(event.method.as_deref(), Some("GET"));
        assert_eq!(event.uri, "/items?a=1");
        assert_eq!(event.protocol_version, "1.0");
        assert_eq!(event.query, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(event.header("x-trace-id"), Some("t-1"));
        assert_eq!(event.cookies.get("sid").map(String::as_str), Some("9"));
        assert!(event.header("document-root").is_none());
    }

    #[tokio::test]
    async fn test_missing_method_stays_missing() {
        let event = read_event(vars(&[("REQUEST_URI", "/x")]), Bytes::new()).await;
        assert!(event.method.is_none());
    }

    #[tokio::test]
    async fn test_broken_multipart_is_a_fault() {
        let event = read_event(
            vars(&[
                ("REQUEST_METHOD", "POST"),
                ("CONTENT_TYPE", "multipart/form-data"),
            ]),
            Bytes::from_static(b"junk"),
        )
        .await;
        assert!(event.fault.is_some());
    }

    #[test]
    fn test_header_name() {
        assert_eq!(header_name("X_TRACE_ID"), "X-Trace-Id");
        assert_eq!(header_name("ACCEPT"), "Accept");
    }

    #[test]
    fn test_write_response() {
        let phases = Phases::new(
            |_, response, _| Ok(controller(move |_| Ok(response.with_status(201, "")))),
            |response, _| Ok(response),
        );
        let router = Router::new(RouterConfig::default(), phases);
        let emission = router.emit(&TransportEvent::new("GET", "/"));

        let mut out = Vec::new();
        write_response(&emission, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Status: 201 Created\r\n\
             Content-Type: application/json; charset=UTF-8\r\n\
             \r\n\
             {\"status\":201,\"message\":null,\"data\":null}"
        );
    }

    #[test]
    fn test_undelivered_writes_nothing() {
        let phases = Phases::new(
            |_, response, _| Ok(controller(move |_| Ok(response))),
            |response, _| Ok(response),
        );
        let config = RouterConfig::default().with_header("Not Valid", "1");
        let emission = Router::new(config, phases).emit(&TransportEvent::new("GET", "/"));

        let mut out = Vec::new();
        write_response(&emission, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
