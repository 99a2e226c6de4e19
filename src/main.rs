//! phase-router binary.
//!
//! ```text
//!   HTTP client ──▶ HttpServer (axum) ─┐
//!                                       ├─▶ Router::emit ─▶ init ─▶ access ─▶ out ─▶ JSON/XML
//!   CGI server  ──▶ env + stdin ───────┘
//! ```
//!
//! `serve` (default) runs the HTTP server until Ctrl+C. `cgi` answers exactly
//! one request from the CGI environment and exits.

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use phase_router::config::ServerConfig;
use phase_router::echo;
use phase_router::http::HttpServer;
use phase_router::lifecycle::{bootstrap, signals, Bootstrap, Shutdown};
use phase_router::pipeline::Router;
use phase_router::transport::cgi;

#[derive(Debug, Parser)]
#[command(name = "phase-router", version, about = "Three-phase JSON/XML request pipeline")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Handle one request from the CGI environment and stdin.
    Cgi,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let Bootstrap { config, messages } = bootstrap(cli.config.as_deref())?;

    let router = Arc::new(
        Router::new(config.router.clone(), echo::phases()).with_messages(messages),
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, router).await?,
        Command::Cgi => run_cgi(router).await?,
    }
    Ok(())
}

async fn serve(config: ServerConfig, router: Arc<Router>) -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.security.max_body_size,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    let signal = Arc::clone(&shutdown);
    tokio::spawn(async move { signals::shutdown_on_ctrl_c(&signal).await });

    HttpServer::new(config, router).run(listener, receiver).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_cgi(router: Arc<Router>) -> io::Result<()> {
    let mut body = Vec::new();
    tokio::io::stdin().read_to_end(&mut body).await?;

    let vars = std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)));
    let event = cgi::read_event(vars, Bytes::from(body)).await;

    let emission = tokio::task::spawn_blocking(move || router.emit(&event))
        .await
        .map_err(io::Error::other)?;

    let mut stdout = io::stdout().lock();
    cgi::write_response(&emission, &mut stdout)
}
