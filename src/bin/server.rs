//! EmberKV Server Binary
//!
//! Replays the WAL and starts the TCP server.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use emberkv::network::Server;
use emberkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV Server
#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "Key-value store with a write-ahead log and SSTable flushes")]
#[command(version)]
struct Args {
    /// YAML config file (defaults to ./emberkv.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port), overrides the config
    #[arg(short, long)]
    listen: Option<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    tracing::info!("EmberKV Server v{}", emberkv::VERSION);
    tracing::info!("WAL directory: {}", config.wal_dir.display());
    tracing::info!("SSTable directory: {}", config.sst_dir.display());

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = engine.recover_from_wal() {
        tracing::error!("Failed to recover from WAL: {}", e);
        process::exit(1);
    }

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        process::exit(1);
    }
}
