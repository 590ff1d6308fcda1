//! Configuration module for threatscope
//!
//! Read once from the environment at startup, then shared read-only behind
//! an `Arc`. Defaults come from `utils/constants.rs`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult, ErrorCode};
use super::types::{AnalysisKind, SignalKind};
use crate::utils::constants::{
    DEFAULT_HOST, DEFAULT_MAX_CONCURRENT_SPAWNS, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_NETWORK_ANALYZER, DEFAULT_NETWORK_DEADLINE_SECS, DEFAULT_PORT, DEFAULT_URL_ANALYZER,
    DEFAULT_URL_DEADLINE_SECS,
};

/// Program plus leading arguments; the subject is appended as the last argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl AnalyzerCommand {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line; empty means "no analyzer"
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

/// Engine configuration (orchestrator, invoker, signal evaluator)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Analyzer for URL subjects (None = always fall back)
    pub url_analyzer: Option<AnalyzerCommand>,
    /// Analyzer for network ranges (None = always fall back)
    pub network_analyzer: Option<AnalyzerCommand>,
    /// Deadline for URL analysis
    pub url_deadline: Duration,
    /// Deadline for network analysis
    pub network_deadline: Duration,
    /// Maximum analyzer processes running at once
    pub max_concurrent_spawns: usize,
    /// Per-stream output cap
    pub max_output_bytes: usize,
    /// Signals excluded from evaluation
    pub disabled_signals: HashSet<SignalKind>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url_analyzer: AnalyzerCommand::parse(DEFAULT_URL_ANALYZER),
            network_analyzer: AnalyzerCommand::parse(DEFAULT_NETWORK_ANALYZER),
            url_deadline: Duration::from_secs(DEFAULT_URL_DEADLINE_SECS),
            network_deadline: Duration::from_secs(DEFAULT_NETWORK_DEADLINE_SECS),
            max_concurrent_spawns: DEFAULT_MAX_CONCURRENT_SPAWNS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            disabled_signals: HashSet::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `THREATSCOPE_*` environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(line) = lookup("THREATSCOPE_URL_ANALYZER") {
            config.url_analyzer = AnalyzerCommand::parse(&line);
        }
        if let Some(line) = lookup("THREATSCOPE_NETWORK_ANALYZER") {
            config.network_analyzer = AnalyzerCommand::parse(&line);
        }
        if let Some(secs) = lookup("THREATSCOPE_URL_DEADLINE_SECS") {
            config.url_deadline = Duration::from_secs(parse_positive("THREATSCOPE_URL_DEADLINE_SECS", &secs)?);
        }
        if let Some(secs) = lookup("THREATSCOPE_NETWORK_DEADLINE_SECS") {
            config.network_deadline =
                Duration::from_secs(parse_positive("THREATSCOPE_NETWORK_DEADLINE_SECS", &secs)?);
        }
        if let Some(n) = lookup("THREATSCOPE_MAX_SPAWNS") {
            config.max_concurrent_spawns = parse_positive("THREATSCOPE_MAX_SPAWNS", &n)? as usize;
        }
        if let Some(n) = lookup("THREATSCOPE_MAX_OUTPUT_BYTES") {
            config.max_output_bytes = parse_positive("THREATSCOPE_MAX_OUTPUT_BYTES", &n)? as usize;
        }
        if let Some(list) = lookup("THREATSCOPE_DISABLED_SIGNALS") {
            config.disabled_signals = parse_signal_list(&list)?;
        }

        info!(
            url_analyzer = config.url_analyzer.is_some(),
            network_analyzer = config.network_analyzer.is_some(),
            url_deadline_secs = config.url_deadline.as_secs(),
            network_deadline_secs = config.network_deadline.as_secs(),
            max_spawns = config.max_concurrent_spawns,
            disabled_signals = config.disabled_signals.len(),
            "⚙️ Engine configuration loaded"
        );

        Ok(config)
    }

    /// Analyzer command for a kind of subject
    pub fn analyzer_for(&self, kind: AnalysisKind) -> Option<&AnalyzerCommand> {
        match kind {
            AnalysisKind::Url => self.url_analyzer.as_ref(),
            AnalysisKind::NetworkRange => self.network_analyzer.as_ref(),
        }
    }

    /// Deadline for a kind of subject
    pub fn deadline_for(&self, kind: AnalysisKind) -> Duration {
        match kind {
            AnalysisKind::Url => self.url_deadline,
            AnalysisKind::NetworkRange => self.network_deadline,
        }
    }

    /// Signals that will be evaluated, in evaluation order
    pub fn enabled_signals(&self) -> Vec<SignalKind> {
        SignalKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.disabled_signals.contains(k))
            .collect()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `PORT` wins over `THREATSCOPE_PORT` so container platforms can inject it
    pub fn from_env() -> Self {
        let host = std::env::var("THREATSCOPE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("THREATSCOPE_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { host, port }
    }
}

fn parse_positive(key: &str, value: &str) -> AppResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::invalid_config(key, value)),
    }
}

fn parse_signal_list(list: &str) -> AppResult<HashSet<SignalKind>> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            SignalKind::from_id(id).ok_or_else(|| {
                AppError::new(ErrorCode::ConfigUnknownSignal, format!("Unknown signal id: {}", id))
            })
        })
        .collect()
}
