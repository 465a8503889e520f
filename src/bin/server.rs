//! arbordb Server Binary
//!
//! Starts the TCP server and the admin REPL on standard input.

use arbordb::{Config, Supervisor};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// arbordb Server
#[derive(Parser, Debug)]
#[command(name = "arbordb-server")]
#[command(about = "Concurrent in-memory key-value store")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4000")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arbordb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .init();

    let args = Args::parse();

    tracing::info!("arbordb Server v{}", arbordb::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    let supervisor = Supervisor::new(config);
    if let Err(e) = supervisor.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
