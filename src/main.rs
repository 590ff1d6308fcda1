//! threatscope CLI
//!
//! One-shot analysis from the command line; prints the JSON response.
//!
//! Usage:
//!   threatscope url <URL>
//!   threatscope network [RANGE]
//!   threatscope breach <EMAIL>

use eyre::{bail, Result};
use std::sync::Arc;
use threatscope::core::{BreachCatalog, Orchestrator};
use threatscope::models::{AnalysisRequest, EngineConfig};
use threatscope::utils::telemetry::TelemetryCollector;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: threatscope <url URL | network [RANGE] | breach EMAIL>";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, subject) = match args.as_slice() {
        [command] => (command.as_str(), None),
        [command, subject] => (command.as_str(), Some(subject.as_str())),
        _ => bail!(USAGE),
    };

    let output = match (command, subject) {
        ("url", Some(url)) => {
            let request = AnalysisRequest::url(url)?;
            let response = orchestrator()?.handle(&request).await;
            serde_json::to_string_pretty(&response)?
        }
        ("network", range) => {
            let request = AnalysisRequest::network(range);
            let response = orchestrator()?.handle(&request).await;
            serde_json::to_string_pretty(&response)?
        }
        ("breach", Some(email)) => serde_json::to_string_pretty(&BreachCatalog::builtin().check(email))?,
        _ => bail!(USAGE),
    };

    println!("{}", output);
    Ok(())
}

fn orchestrator() -> Result<Orchestrator> {
    let config = Arc::new(EngineConfig::from_env()?);
    Ok(Orchestrator::new(config, Arc::new(TelemetryCollector::new())))
}
