//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all handler
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener with graceful shutdown
//! - Turn each request into a `TransportEvent` and run the pipeline
//! - Map the resulting `Emission` back to an HTTP response

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::pipeline::{Emission, Router};
use crate::transport::{multipart, TransportEvent};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_size: usize,
}

/// Generates a UUID v4 `x-request-id` for requests that lack one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP front end for a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, router: Arc<Router>) -> Self {
        let state = AppState {
            router,
            max_body_size: config.security.max_body_size,
        };
        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/", any(emit_handler))
            .route("/{*path}", any(emit_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured Axum app, for in-process use.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: request → event → emission → response.
async fn emit_handler(State(state): State<AppState>, request: Request) -> Response {
    let event = read_event(request, state.max_body_size).await;
    let request_id = event.header("x-request-id").unwrap_or("unknown").to_string();

    tracing::debug!(
        request_id = %request_id,
        method = event.method.as_deref().unwrap_or(""),
        uri = %event.uri,
        "Emitting request"
    );

    let router = Arc::clone(&state.router);
    match tokio::task::spawn_blocking(move || router.emit(&event)).await {
        Ok(emission) => into_response(&emission),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Emission task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn read_event(request: Request, limit: usize) -> TransportEvent {
    let (parts, body) = request.into_parts();
    let mut event = TransportEvent::new(parts.method.as_str(), parts.uri.to_string())
        .with_protocol_version(version_label(parts.version));

    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(value) => event = event.with_header(name.as_str(), value),
            Err(_) => tracing::warn!(header = %name, "Skipping non-text request header"),
        }
    }

    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => event = event.with_body(bytes),
        Err(e) => return event.with_fault(e.to_string()),
    }

    if parts.method == axum::http::Method::POST && event.is_multipart() {
        let content_type = event.content_type().unwrap_or_default().to_string();
        event = match multipart::read_form(&content_type, event.body.clone()).await {
            Ok(form) => event.with_form(form),
            Err(e) => event.with_fault(e.to_string()),
        };
    }
    event
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Map an emission to the wire. Undelivered emissions become a bare 500.
fn into_response(emission: &Emission) -> Response {
    if !emission.is_delivered() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let status = StatusCode::from_u16(emission.status()).unwrap_or_else(|_| {
        tracing::warn!(status = emission.status(), "Unrepresentable status code");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut response = Response::new(Body::from(emission.body()));
    *response.status_mut() = status;

    for (name, values) in emission.headers().iter() {
        let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = name, "Skipping unrepresentable response header");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    response.headers_mut().append(header.clone(), value);
                }
                Err(_) => tracing::warn!(header = name, "Skipping unrepresentable header value"),
            }
        }
    }
    response
}
