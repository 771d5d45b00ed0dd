//! Relay API server binary.
//!
//! Usage:
//!   relay-api --config relay.toml
//!   relay-api --port 8080
//!   relay-api --port 8080 --bind 0.0.0.0
//!   relay-api --memory-path ./data/memories.jsonl
//!
//! # Environment Variables
//!
//! - `RELAY_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `NVIDIA_API_KEY` - Key for NVIDIA-hosted models
//! - `OPENROUTER_API_KEY` - Key for OpenRouter-hosted models

use anyhow::Result;
use clap::Parser;
use relay_api::{AppState, serve};
use relay_memory::MemoryBackend;
use relay_router::RelayConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay-api")]
#[command(about = "LLM routing front end with quota fallback and user memory")]
struct Args {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    port: u16,

    /// Bind address
    #[arg(long, short = 'b', env = "RELAY_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Path to a relay.toml file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Persist memories to this JSONL file instead of process memory
    #[arg(long)]
    memory_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relay_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.bind == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0 exposes the API to all network interfaces. \
             Relay has no authentication; put it behind a proxy or firewall."
        );
    }

    let mut config = if let Some(path) = &args.config {
        tracing::info!(path = %path.display(), "Loading configuration");
        RelayConfig::from_file(path)?
    } else {
        tracing::info!("Using default configuration");
        RelayConfig::default()
    };

    if let Some(path) = args.memory_path {
        tracing::info!(path = %path.display(), "Persisting memories to file");
        config.memory.backend = MemoryBackend::Jsonl { path };
    }

    let state = AppState::new(config)?;

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}
