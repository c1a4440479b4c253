//! Ethereum test-network faucet.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /api/claim
//!     ───────────────▶ http ──▶ faucet ──▶ security ──────────▶ dispatch ──────────┐
//!                      server   facade     cooldown +           gate free?         │
//!                                          balance gate          ├ yes: transfer   │
//!                                                                └ no:  queue ─┐   │
//!                                                                   drain task ◀┘   │
//!                                                                                  ▼
//!                                             load_balancer (round robin, optional)
//!                                                                                  │
//!                                                                                  ▼
//!                                      blockchain: nonce reservation, fees, signing
//!                                                                                  │
//!                                                                                  ▼
//!                                                                  JSON-RPC node(s)
//! ```
//!
//! Signing keys are read from `FAUCET_PRIVATE_KEYS`; everything else comes from
//! the TOML file passed with `--config`.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use eth_faucet::blockchain::wallet;
use eth_faucet::config::resolve_config;
use eth_faucet::http::HttpServer;
use eth_faucet::lifecycle::{signals, startup, Shutdown};
use eth_faucet::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "eth-faucet")]
#[command(about = "Dispenses test ether to addresses over HTTP", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "FAUCET_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.bind)?;

    logging::init_tracing(&config.observability.log_level, config.observability.log_json);

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "eth-faucet starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        network = %config.faucet.network,
        rpc_url = %config.blockchain.rpc_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let signers = wallet::signers_from_env()?;
    let faucet = Arc::new(startup::build_faucet(&config, signers).await?);

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    let tasks = startup::spawn_background_tasks(&faucet, &config, &shutdown);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(faucet, config.faucet.proxy_count, config.timeouts.request());
    server.run(listener, shutdown.wait()).await?;

    shutdown.trigger();
    for task in tasks {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
