mod alerts;
mod analytics;
mod clock;
mod config;
mod markets;
mod metrics;
mod oracle;
mod payment;
mod risk;
mod web;

use std::sync::Arc;
use tracing::info;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::risk::engine::RiskEngine;
use crate::web::server::WebServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "snapstake=info,tower_http=info".into());
    if std::env::var_os("SNAPSTAKE_LOG_JSON").is_some() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("📈 snapstake v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::args().nth(1);
    let config = Config::resolve(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Config loaded from {}", path);
    }

    let config = Arc::new(config);

    // Initialize risk engine (scorer, payment gate, market desk, metrics)
    let engine = Arc::new(RiskEngine::new(config.clone(), Arc::new(SystemClock)));

    let web = WebServer::new(engine, config);
    web.run().await
}
