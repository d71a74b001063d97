//! Pupil Fatigue Server - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("failed to load configuration")?;
    init_logging(&config.log);

    info!("=== Pupil Fatigue Server v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "User {}, eye-test duration {}s",
        config.user_id, config.test_duration_seconds
    );

    run_server(config).await
}
