//! End-to-end pipeline behavior through `Router::emit`.

use std::collections::BTreeMap;

use phase_router::codec::{ContentCodec, JsonCodec, MediaType, XmlCodec};
use phase_router::config::{MessageConfig, RouterConfig};
use phase_router::error::RouterError;
use phase_router::http::{HttpMessage, Method, Response};
use phase_router::messages::MessageCatalog;
use phase_router::pipeline::{controller, Operation, Phases, Router, Stage};
use phase_router::transport::TransportEvent;
use serde_json::{json, Map, Value};

mod common;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[test]
fn test_codecs_round_trip_scalar_leaves() {
    let data = object(json!({"id": 12, "name": "Ann", "tags": {"a": "x"}}));

    let json = JsonCodec.translate(&JsonCodec.convert(&data).unwrap());
    assert_eq!(json, data);

    let xml = XmlCodec.translate(&XmlCodec.convert(&data).unwrap());
    assert_eq!(
        Value::Object(xml),
        json!({"id": "12", "name": "Ann", "tags": {"a": "x"}})
    );
}

#[test]
fn test_codecs_reject_invalid_documents() {
    for codec in [MediaType::Json.codec(), MediaType::Xml.codec()] {
        assert!(!codec.verify("<unterminated"));
        assert!(!codec.verify("{\"a\":"));
        assert!(!codec.verify(""));
    }
}

#[test]
fn test_copy_on_write_response() {
    let original = Response::new().with_header("X-A", "1");
    let _ = original
        .with_added_header("X-A", "2")
        .with_status(404, "")
        .with_message("gone")
        .without_header("X-A");

    assert_eq!(original.header_line("x-a"), "1");
    assert!(original.status().is_none());
    assert!(original.message().is_none());
}

#[test]
fn test_get_query_is_wrapped() {
    let (router, counts) = common::counting_router(RouterConfig::default());
    let emission = router.emit(&TransportEvent::new("GET", "/items?a=1&b=2"));

    assert_eq!(emission.stage(), Stage::Finalized);
    assert_eq!(
        common::json_body(&emission),
        json!({"status": 200, "message": null, "data": {"data": {"a": "1", "b": "2"}}})
    );
    assert_eq!((counts.init(), counts.out()), (1, 1));
}

#[test]
fn test_post_json_body_is_merged() {
    let (router, _) = common::counting_router(RouterConfig::default());
    let event = TransportEvent::new("POST", "/items")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"x":1}"#);

    assert_eq!(common::json_body(&router.emit(&event))["data"], json!({"x": 1}));
}

#[test]
fn test_malformed_body_never_reaches_init() {
    let (router, counts) = common::counting_router(RouterConfig::default());
    let emission = router.emit(&TransportEvent::new("POST", "/items").with_body("{\"x\":"));

    assert!(matches!(emission.failure(), Some(RouterError::MalformedBody)));
    assert_eq!(emission.status(), 400);
    assert_eq!(
        common::json_body(&emission),
        json!({"status": 400, "message": "Received data is not valid", "data": null})
    );
    assert_eq!(counts.init(), 0);
}

#[test]
fn test_empty_delete_is_accepted() {
    let (router, _) = common::counting_router(RouterConfig::default());
    let emission = router.emit(&TransportEvent::new("DELETE", "/items/1"));

    assert!(emission.failure().is_none());
    assert_eq!(common::json_body(&emission)["data"], json!({}));
}

#[test]
fn test_disallowed_method_never_reaches_init() {
    let config = RouterConfig::default().with_allowed_methods([Method::Get, Method::Post]);
    let (router, counts) = common::counting_router(config);
    let emission = router.emit(&TransportEvent::new("PUT", "/items/1").with_body("{}"));

    assert_eq!(counts.init(), 0);
    assert_eq!(emission.failed_at(), Some(Stage::MethodGate));
    assert_eq!(emission.response().reason_phrase(), "Method Not Allowed");
    assert_eq!(
        common::json_body(&emission),
        json!({"status": 405, "message": "Method not allowed: PUT", "data": null})
    );
    assert_eq!(emission.headers().line("Access-Control-Allow-Methods"), "GET, POST");
}

#[test]
fn test_missing_and_unknown_methods() {
    let (router, _) = common::counting_router(RouterConfig::default());

    let mut event = TransportEvent::new("GET", "/");
    event.method = None;
    let emission = router.emit(&event);
    assert!(matches!(emission.failure(), Some(RouterError::MissingMethod)));
    assert_eq!(emission.status(), 400);

    let emission = router.emit(&TransportEvent::new("BREW", "/"));
    assert_eq!(emission.status(), 405);
}

#[test]
fn test_reason_phrases() {
    assert_eq!(Response::new().with_status(404, "").reason_phrase(), "Not Found");
    assert_eq!(Response::new().with_status(599, "").reason_phrase(), "");
}

#[test]
fn test_finalize_without_codec_writes_nothing() {
    let response = Response::new().with_status(200, "").with_data(json!({"a": 1}));
    assert!(matches!(response.to_response(), Err(RouterError::UnboundCodec)));
    assert_eq!(response.body().size().unwrap(), 0);
}

#[test]
fn test_access_denial_skips_out() {
    let (phases, counts) = common::counting_phases(Operation::restricted("orders.delete"), Some(Some(false)));
    let emission = Router::new(RouterConfig::default(), phases).emit(&TransportEvent::new("GET", "/orders"));

    assert_eq!(emission.status(), 401);
    assert_eq!(emission.response().reason_phrase(), "Unauthorized");
    assert_eq!(common::json_body(&emission)["message"], json!("Unauthorized"));
    assert_eq!((counts.init(), counts.access(), counts.out()), (1, 1, 0));
}

#[test]
fn test_public_operation_ignores_access() {
    let (phases, counts) = common::counting_phases(Operation::public("health"), Some(Some(false)));
    let emission = Router::new(RouterConfig::default(), phases).emit(&TransportEvent::new("GET", "/"));

    assert_eq!(emission.status(), 200);
    assert_eq!((counts.access(), counts.out()), (0, 1));
}

#[test]
fn test_undecided_access_allows() {
    let (phases, counts) = common::counting_phases(Operation::restricted("items.read"), Some(None));
    let emission = Router::new(RouterConfig::default(), phases).emit(&TransportEvent::new("GET", "/"));

    assert_eq!(emission.status(), 200);
    assert_eq!(counts.access(), 1);
}

#[test]
fn test_xml_negotiation() {
    let config = RouterConfig::default().with_content_type(MediaType::Xml);
    let (router, _) = common::counting_router(config);
    let event = TransportEvent::new("POST", "/").with_body("<req><qty>2</qty><sku>A-1</sku></req>");
    let emission = router.emit(&event);

    assert_eq!(emission.headers().line("Content-Type"), "application/xml; charset=UTF-8");
    assert_eq!(
        String::from_utf8(emission.body()).unwrap(),
        "<?xml version=\"1.0\"?>\n<root><status>200</status><message></message><data><qty>2</qty><sku>A-1</sku></data></root>\n"
    );
}

#[test]
fn test_browser_view() {
    let config = RouterConfig::default().with_browser_view(json!({"name": "demo", "version": 1}));
    let (router, counts) = common::counting_router(config);
    let event = TransportEvent::new("GET", "/").with_header("Accept", "text/html,application/xhtml+xml");
    let emission = router.emit(&event);

    assert_eq!(emission.stage(), Stage::Finalized);
    assert_eq!(counts.init(), 0);
    let body = common::json_body(&emission);
    assert_eq!(body["status"], json!(200));
    assert_eq!(body["data"], json!({"name": "demo", "version": 1}));
}

#[test]
fn test_configured_headers_on_both_paths() {
    let config = RouterConfig::default()
        .with_allowed_origin("https://app.example")
        .with_header("X-Service", "demo")
        .with_header("Vary", vec!["Accept".to_string(), "Origin".to_string()]);
    let (router, _) = common::counting_router(config);

    for event in [
        TransportEvent::new("GET", "/"),
        TransportEvent::new("POST", "/").with_body("nope"),
    ] {
        let emission = router.emit(&event);
        let headers = emission.headers();
        assert_eq!(headers.line("Access-Control-Allow-Origin"), "https://app.example");
        assert_eq!(headers.line("X-Service"), "demo");
        assert_eq!(headers.line("Vary"), "Accept, Origin");
        assert!(!headers.contains("Access-Control-Allow-Methods"));
    }
}

#[test]
fn test_out_failure_becomes_service_unavailable() {
    let phases = Phases::new(
        |_, response, _| Ok(controller(move |_| Ok(response.with_data(json!({"secret": 1}))))),
        |_, _| Err(RouterError::internal("renderer crashed")),
    );
    let emission = Router::new(RouterConfig::default(), phases).emit(&TransportEvent::new("GET", "/"));

    assert_eq!(emission.failed_at(), Some(Stage::Out));
    assert_eq!(
        common::json_body(&emission),
        json!({"status": 503, "message": "Service unavailable: renderer crashed", "data": null})
    );
}

#[test]
fn test_invalid_header_from_out_is_recovered() {
    let phases = Phases::new(
        |_, response, _| Ok(controller(move |_| Ok(response))),
        |response, _| Ok(response.with_header("Bad:Name", "x")),
    );
    let emission = Router::new(RouterConfig::default(), phases).emit(&TransportEvent::new("GET", "/"));

    assert!(emission.is_delivered());
    assert_eq!(emission.status(), 500);
    assert_eq!(
        common::json_body(&emission)["message"],
        json!("Invalid characters in header name: Bad:Name")
    );
    assert!(!emission.headers().contains("Bad:Name"));
}

#[test]
fn test_invalid_configured_header_is_undelivered() {
    let (router, _) = common::counting_router(RouterConfig::default().with_header("Bad Name", "x"));
    let emission = router.emit(&TransportEvent::new("GET", "/"));

    assert!(!emission.is_delivered());
    assert_eq!(emission.stage(), Stage::Failed);
    assert!(emission.body().is_empty());
}

#[test]
fn test_message_overrides() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "router.auth_denied".to_string(),
        MessageConfig {
            status: 403,
            message: "Forbidden".to_string(),
        },
    );
    let (phases, _) = common::counting_phases(Operation::restricted("x"), Some(Some(false)));
    let router = Router::new(RouterConfig::default(), phases)
        .with_messages(MessageCatalog::new().with_overrides(&overrides));
    let emission = router.emit(&TransportEvent::new("GET", "/"));

    assert_eq!(emission.status(), 403);
    assert_eq!(emission.response().reason_phrase(), "Forbidden");
    assert_eq!(common::json_body(&emission)["message"], json!("Forbidden"));
}

#[test]
fn test_transport_fault_is_answered() {
    let (router, counts) = common::counting_router(RouterConfig::default());
    let emission = router.emit(&TransportEvent::new("POST", "/").with_fault("length limit exceeded"));

    assert_eq!(emission.status(), 400);
    assert_eq!(
        common::json_body(&emission)["message"],
        json!("Request could not be read: length limit exceeded")
    );
    assert_eq!(counts.init(), 0);
}

#[test]
fn test_deeply_nested_xml_is_malformed() {
    let config = RouterConfig::default().with_content_type(MediaType::Xml);
    let (router, counts) = common::counting_router(config);
    let depth = 5_000;
    let body = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let emission = router.emit(&TransportEvent::new("POST", "/").with_body(body));

    assert!(matches!(emission.failure(), Some(RouterError::MalformedBody)));
    assert_eq!(emission.status(), 400);
    assert!(String::from_utf8(emission.body())
        .unwrap()
        .contains("<message>Received data is not valid</message>"));
    assert_eq!(counts.init(), 0);
}
