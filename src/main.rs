//! Echo server over the accept loop.
//!
//! ```text
//!     Inbound connection
//!         → net::listener (socket setup, TCP Accept capability)
//!         → net::accept   (accept cycle, handler dispatch)
//!         → net::echo     (per-connection echo task)
//! ```
//!
//! Binds the configured service, then drives an accept loop that hands
//! every successful connection to the echo driver and tolerates accept
//! failures.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acceptor::config;
use acceptor::net::accept::AcceptLoop;
use acceptor::net::echo;
use acceptor::net::listener::{self, TcpConn};

#[derive(Parser)]
#[command(name = "acceptor")]
#[command(about = "TCP echo server built on the accept loop", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service to bind (host:port), overriding the configuration file.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(config::load_config).transpose() {
        Ok(loaded) => loaded.unwrap_or_default(),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service = cli.listen.unwrap_or(config.listen.service);

    // Setup failures have already been reported on stderr by the sink.
    let Ok(mut listener) = listener::listen(&service).await else {
        return ExitCode::FAILURE;
    };

    match listener.local_addr() {
        Ok(addr) => tracing::info!(address = %addr, "Echo server listening"),
        Err(err) => tracing::warn!(error = %err, "Listener has no local address"),
    }

    AcceptLoop::new(
        TcpConn::empty,
        |conn: TcpConn, outcome: Result<(), std::io::Error>| {
            match outcome {
                Ok(()) => {
                    if let Some((stream, peer)) = conn.into_parts() {
                        echo::spawn(stream, peer);
                    }
                }
                Err(err) => tracing::warn!(error = %err, "Accept failed"),
            }
            true
        },
        || tracing::info!("Accept loop stopped"),
    )
    .run(&mut listener)
    .await;

    ExitCode::SUCCESS
}
