//! threatscope
//!
//! Risk classifier for URLs and network ranges. Each request goes to an
//! out-of-process analyzer first; when that analyzer is missing, fails,
//! or overruns its deadline, a deterministic heuristic scorer answers
//! instead and the response is tagged as a fallback.

pub mod api;
pub mod core;
pub mod models;
pub mod utils;

pub use crate::core::{
    AnalysisResponse, AnalysisResult, BreachCatalog, ExternalAnalyzer, Orchestrator, SignalEvaluator,
};
pub use crate::models::{AnalysisKind, AnalysisRequest, AnalysisSource, AppError, AppResult, EngineConfig, RiskTier};
pub use crate::utils::telemetry::{TelemetryCollector, TelemetryStats};
