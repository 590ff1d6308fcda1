//! threatscope API Server
//!
//! REST gateway for URL and network-range risk analysis
//!
//! Usage:
//!   cargo run --bin threatscope_api
//!
//! Environment:
//!   PORT / THREATSCOPE_PORT        - Server port (default: 8080)
//!   THREATSCOPE_HOST               - Server host (default: 0.0.0.0)
//!   THREATSCOPE_URL_ANALYZER       - URL analyzer command line
//!   THREATSCOPE_NETWORK_ANALYZER   - Network analyzer command line
//!   RUST_LOG                       - Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use threatscope::api::{create_router, start_cleanup_task, AppState};
use threatscope::models::{EngineConfig, ServerConfig};
use threatscope::utils::constants::{APP_NAME, APP_VERSION};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = Arc::new(EngineConfig::from_env()?);
    let server = ServerConfig::from_env();

    let state = Arc::new(AppState::new(config));
    let telemetry = state.telemetry.clone();

    start_cleanup_task(state.rate_limiter.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

    info!("🚀 {} API starting on http://{}", APP_NAME, addr);
    info!("Endpoints:");
    info!("  POST /v1/analyze/url      - URL risk analysis");
    info!("  POST /v1/analyze/network  - Network range analysis");
    info!("  POST /v1/check-breach     - Breach exposure check");
    info!("  GET  /v1/stats            - Analysis statistics");
    info!("  GET  /v1/health           - Health check");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    let stats = telemetry.get_stats();
    info!("   Total analyzed: {}", stats.total_analyzed);
    info!("   External results: {}", stats.external_results);
    info!("   Fallback results: {}", stats.fallback_results);
    info!("👋 {} API shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║        T H R E A T S C O P E   A P I         ║
    ║                   v{:<8}                  ║
    ║   External analysis · heuristic fallback     ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#,
        APP_VERSION
    );
}
