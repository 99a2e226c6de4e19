//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, then metrics
//! - Build the message catalog the router answers with
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners are bound by the caller, after bootstrap succeeds

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, ConfigError, ServerConfig};
use crate::messages::MessageCatalog;
use crate::observability::{logging, metrics};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A global subscriber was already installed.
    #[error("Logging error: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    /// The Prometheus exporter failed to start.
    #[error("Metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// The metrics address is not a socket address.
    #[error("Invalid metrics address: {0}")]
    MetricsAddress(#[from] std::net::AddrParseError),
}

/// Everything the binary needs once startup succeeded.
#[derive(Debug)]
pub struct Bootstrap {
    pub config: ServerConfig,
    pub messages: MessageCatalog,
}

/// Load configuration (defaults when `path` is `None`), then bring up
/// logging and, when enabled, metrics.
pub fn bootstrap(path: Option<&Path>) -> Result<Bootstrap, StartupError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(
        config = %path.map_or("<defaults>".into(), |p| p.display().to_string()),
        content_type = %config.router.content_type,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let messages = MessageCatalog::new().with_overrides(&config.messages);
    Ok(Bootstrap { config, messages })
}
