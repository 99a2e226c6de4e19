//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router::emit, HttpServer, lifecycle produce:
//!     → logging.rs (structured log events to stderr)
//!     → metrics.rs (emission counters and latency histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows from the server layer into request attributes
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
