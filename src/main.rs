//! Dream Relay
//!
//! Local plaintext HTTP relay for the dream land API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller (plain HTTP)
//!         │
//!         ▼
//!   ┌──────────┐   ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//!   │   net    │──▶│  http    │──▶│   routing    │──▶│   transport   │──▶ Remote origin
//!   │ listener │   │ parser   │   │  dispatcher  │   │ reqwest pool  │    (HTTPS)
//!   └──────────┘   └──────────┘   └──────────────┘   └───────┬───────┘
//!         ▲                                                  │
//!         └──────── 200 OK head + length or chunked body ◀───┘
//! ```
//!
//! One connection is served at a time on a current-thread runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use dream_relay::config::loader::{load_config, ConfigError};
use dream_relay::config::validation::validate_config;
use dream_relay::lifecycle::{shutdown_on_signal, Shutdown};
use dream_relay::observability::{logging, metrics};
use dream_relay::{Credential, RelayConfig, RelayServer};

/// Interval between readiness checks of the listening socket.
const POLL_TICK: Duration = Duration::from_millis(5);

#[derive(Parser)]
#[command(name = "dream-relay")]
#[command(about = "Local HTTP relay for the dream land API", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port; overrides `listener.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// File holding the bearer token; falls back to DREAM_RELAY_TOKEN.
    #[arg(short, long)]
    token_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let config = RelayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: RelayConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability);
    tracing::info!("dream-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let credential = match &args.token_file {
        Some(path) => Credential::from_file(path)?,
        None => Credential::from_env()?,
    };

    let port = args.port.unwrap_or(config.listener.port);
    tracing::info!(
        port,
        upstream = %config.upstream.base_url,
        debug = config.transport.debug,
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let mut relay = RelayServer::new(config, credential)?;
    relay.start(port)?;

    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();
    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown_on_signal(&shutdown).await })
    };

    relay.run(rx, POLL_TICK).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
