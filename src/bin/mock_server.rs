//! Event Horizon Mock API Server
//!
//! Run with: cargo run --bin event-horizon-mock
//!
//! # Configuration
//!
//! Read from the standard config locations (see `event-horizon config`).
//! Environment variables:
//! - `EVENT_HORIZON_MOCK_HOST`: Host to bind to (default: 127.0.0.1)
//! - `EVENT_HORIZON_MOCK_PORT`: Port to listen on (default: 8000)
//! - `EVENT_HORIZON_LOG_LEVEL`, `EVENT_HORIZON_LOG_FORMAT`
//! - `RUST_LOG`: Full filter override

use event_horizon::api::MemoryBackend;
use event_horizon::config::Config;
use event_horizon::mock_server::{seed_demo_data, serve, MockState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    config.logging.init_tracing();

    tracing::info!("Starting Event Horizon mock API v{}", env!("CARGO_PKG_VERSION"));

    let backend = Arc::new(MemoryBackend::new());
    if config.mock_server.seed {
        seed_demo_data(&backend).await?;
    } else {
        tracing::info!("Starting with an empty backend");
    }

    serve(MockState::new(backend), &config.mock_server.bind_addr()).await?;

    tracing::info!("Event Horizon mock API stopped");
    Ok(())
}
