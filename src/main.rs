//! Solana Transfer Gateway
//!
//! A small backend service exposing two HTTP endpoints that delegate to the
//! Solana SDK: transfer lamports (optionally anchored by a durable nonce for
//! offline signing) and create a new nonce account.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │               TRANSFER GATEWAY                │
//!                      │                                               │
//!  POST /transaction   │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!  ────────────────────┼─▶│  http   │───▶│ handlers │───▶│ ledger  │  │
//!  POST /create-       │  │ server  │    │          │    │ service │  │
//!       nonce-acct     │  └─────────┘    └──────────┘    └────┬────┘  │
//!                      │                                      │       │
//!                      │                                      ▼       │
//!                      │  ┌──────────────────────┐      ┌─────────┐   │
//!                      │  │ Cross-Cutting        │      │ ledger  │───┼──▶ Solana
//!                      │  │ config / signers /   │      │ client  │   │    JSON-RPC
//!                      │  │ observability        │      └─────────┘   │
//!                      │  └──────────────────────┘                    │
//!                      └───────────────────────────────────────────────┘
//! ```
//!
//! Startup is fail-fast: a missing endpoint or secret key terminates the
//! process before the listener is bound.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transfer_gateway::http::HttpServer;
use transfer_gateway::ledger::{LedgerClient, ServiceSigners, TransferService};
use transfer_gateway::{config, observability};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transfer_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("transfer-gateway v0.1.0 starting");

    // Load configuration; there is no degraded mode without an endpoint.
    let config = match config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Gateway could not be initialized - exiting");
            std::process::exit(1);
        }
    };

    tracing::info!(
        rpc_url = %config.rpc_url,
        subscription_url = config.websocket_url().as_deref().unwrap_or("n/a"),
        bind_address = %config.bind_address,
        "Configuration loaded"
    );

    // Load the process identities; the service cannot function without them.
    let signers = match ServiceSigners::from_env() {
        Ok(signers) => signers,
        Err(e) => {
            tracing::error!(error = %e, "Signer initialization failed - exiting");
            std::process::exit(1);
        }
    };

    // Initialize metrics exposition
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = LedgerClient::new(&config.rpc_url, config.rpc_timeout_secs);
    let service = Arc::new(TransferService::new(client, signers));

    // Bind TCP listener
    let listener = TcpListener::bind(&config.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    // Create and run HTTP server
    let server = HttpServer::new(&config, service);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
