//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for Ctrl+C (SIGINT)
//! - Translate it into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failure to install the handler is logged and shuts down immediately

use crate::lifecycle::Shutdown;

/// Resolve once Ctrl+C is received, then trigger `shutdown`.
pub async fn shutdown_on_ctrl_c(shutdown: &Shutdown) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    } else {
        tracing::info!("Ctrl+C received");
    }
    shutdown.trigger();
}
