//! # domrelay
//!
//! Local relay between browser-resident DOM agents and an operator.
//! Agents connect over WebSocket and report page elements; every line the
//! operator types is broadcast back to all connected agents.

mod console;
mod display;
mod logging;
mod ws;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use dr_common::{RelayConfig, RelayError};
use tokio::io::BufReader;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use console::{ConsoleExit, OperatorConsole};
use display::{separator, timestamp, ConsolePresenter};
use ws::registry::ConnectionRegistry;
use ws::router::{MessageRouter, Presenter};

/// Shared state owned for the lifetime of the process.
pub struct AppState {
    pub config: RelayConfig,
    pub registry: ConnectionRegistry,
    pub router: MessageRouter,
}

impl AppState {
    pub fn new(config: RelayConfig, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            router: MessageRouter::new(presenter),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "domrelay", about = "Relay between browser DOM agents and an operator console")]
struct Args {
    /// Config file (default: ./domrelay.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,
    /// WebSocket server port
    #[arg(long)]
    port: Option<u16>,
    /// Do not read operator commands from stdin
    #[arg(long)]
    no_console: bool,
}

impl Args {
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_console {
            config.console.enabled = false;
        }
    }
}

fn build_app(state: Arc<AppState>) -> Router {
    ws::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = RelayConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    if let Some(path) = logging::init_tracing(&config.log)? {
        tracing::info!(path = %path.display(), "Writing logs to file");
    }
    tracing::debug!(file = ?args.config, ?config, "Relay configuration loaded");

    let presenter = Arc::new(ConsolePresenter::new(config.console.text_preview_chars));
    let state = Arc::new(AppState::new(config.clone(), presenter));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(%addr, path = %config.server.ws_path, "Starting WebSocket server");
    println!("{}", separator("DOM RELAY SERVER"));
    println!("Listening on ws://{addr}{}", config.server.ws_path);
    println!("Server started at: {}", timestamp());
    println!("Waiting for browser agent connection...");
    println!("{}", separator(""));

    let server = axum::serve(
        listener,
        build_app(state.clone()).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future();

    // Resolves only when the operator asks to quit; end of input keeps serving.
    let console_quit = {
        let console_task = config.console.enabled.then(|| {
            let console = OperatorConsole::new(state.clone());
            tokio::spawn(async move { console.run(BufReader::new(tokio::io::stdin())).await })
        });
        async move {
            match console_task {
                Some(task) => match task.await {
                    Ok(ConsoleExit::Quit) => {}
                    Ok(ConsoleExit::EndOfInput) => std::future::pending::<()>().await,
                    Err(e) => {
                        tracing::error!(error = %e, "Console task failed");
                        std::future::pending::<()>().await
                    }
                },
                None => std::future::pending::<()>().await,
            }
        }
    };

    tokio::select! {
        result = server => {
            let err = match result {
                Ok(()) => RelayError::Serve(std::io::Error::other("listener stopped")),
                Err(e) => RelayError::Serve(e),
            };
            tracing::error!(error = %err, "Server stopped");
            eprintln!("{err}");
            // stdin may still be blocked in a reader thread; do not wait for it.
            std::process::exit(1);
        }
        _ = console_quit => {
            tracing::info!("Server shutdown initiated by operator");
        }
        _ = shutdown_signal() => {}
    }

    println!("\n{}", separator("SERVER SHUTDOWN"));
    println!("Exiting at {}", timestamp());
    println!("{}", separator(""));
    std::process::exit(0);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
