//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use phase_router::config::{RouterConfig, ServerConfig};
use phase_router::http::HttpServer;
use phase_router::lifecycle::Shutdown;
use phase_router::pipeline::{controller, Emission, Operation, Phases, Router};
use serde_json::Value;
use tokio::net::TcpListener;

/// How often each phase callback ran.
#[derive(Debug, Default)]
pub struct PhaseCounts {
    pub init: AtomicUsize,
    pub access: AtomicUsize,
    pub out: AtomicUsize,
}

impl PhaseCounts {
    pub fn init(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    pub fn access(&self) -> usize {
        self.access.load(Ordering::SeqCst)
    }

    pub fn out(&self) -> usize {
        self.out.load(Ordering::SeqCst)
    }
}

/// Phases that echo the query mapping as `data` and count every callback.
///
/// The controller authorizes `operation`; `verdict` is what the access
/// callback answers (no access callback is bound when it is `None`).
pub fn counting_phases(operation: Operation, verdict: Option<Option<bool>>) -> (Phases, Arc<PhaseCounts>) {
    let counts = Arc::new(PhaseCounts::default());

    let init_counts = Arc::clone(&counts);
    let out_counts = Arc::clone(&counts);
    let phases = Phases::new(
        move |request, response, _| {
            init_counts.init.fetch_add(1, Ordering::SeqCst);
            let query = Value::Object(request.query_params().clone());
            let operation = operation.clone();
            Ok(controller(move |gate| {
                gate.authorize(&operation)?;
                Ok(response.with_status(200, "").with_data(query))
            }))
        },
        move |response, _| {
            out_counts.out.fetch_add(1, Ordering::SeqCst);
            Ok(response)
        },
    );

    let phases = match verdict {
        Some(answer) => {
            let access_counts = Arc::clone(&counts);
            phases.with_access(move |_, _| {
                access_counts.access.fetch_add(1, Ordering::SeqCst);
                answer
            })
        }
        None => phases,
    };
    (phases, counts)
}

/// Router over [`counting_phases`] with a restricted operation and no access callback.
pub fn counting_router(config: RouterConfig) -> (Router, Arc<PhaseCounts>) {
    let (phases, counts) = counting_phases(Operation::restricted("items.read"), None);
    (Router::new(config, phases), counts)
}

/// Parse a JSON emission body.
pub fn json_body(emission: &Emission) -> Value {
    serde_json::from_slice(&emission.body()).unwrap()
}

/// Bind an ephemeral port and serve `router` until the returned handle fires.
pub async fn start_server(config: ServerConfig, router: Router) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, Arc::new(router));
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });
    (addr, shutdown)
}
