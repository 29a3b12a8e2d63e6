//! FlipFlow listing-lifecycle engine — HTTP entry point.
//!
//! Loads configuration and the SQLite store, wires a `MockGateway` in
//! behind the `Gateway` trait (sandbox/production marketplace clients
//! are out of scope), builds the coordinator, and serves the REST API.

mod api;
mod config;
mod coordinator;
mod domain;
mod errors;
mod gatekeepers;
mod gateway;
mod middleware;
mod policies;
mod store;

use anyhow::{Context, Result};
use config::{Config, GatewayMode};
use coordinator::Coordinator;
use gateway::{Gateway, MockGateway};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use store::Store;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("flipflow engine starting");

    let config = Config::from_env();

    let gateway: Arc<dyn Gateway> = match config.gateway_mode {
        GatewayMode::Mock => Arc::new(MockGateway::new()),
        GatewayMode::Sandbox | GatewayMode::Production => {
            warn!("sandbox/production gateway clients are not implemented; falling back to mock");
            Arc::new(MockGateway::new())
        }
    };

    let store = Store::open(&config.database_path)
        .with_context(|| format!("failed to open store at {}", config.database_path))?;

    info!(path = %config.database_path, "store opened");

    let coordinator = Arc::new(Coordinator::new(store, gateway, &config));

    let app = api::build_router(api::AppState { coordinator });

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipflow_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidates = [manifest_dir.join(".env"), manifest_dir.join("../.env")];
    for p in candidates {
        if p.exists() {
            let _ = dotenv::from_path(&p);
        }
    }
}
