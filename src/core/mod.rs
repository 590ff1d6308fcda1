//! Core Module - Analysis Engine
//!
//! Signal evaluation, scoring, external analyzer invocation and the
//! orchestrator that ties them together.

pub mod breach;
pub mod fallback;
pub mod invoker;
pub mod orchestrator;
pub mod scoring;
pub mod signals;

pub use breach::{BreachCatalog, BreachRecord, BreachReport};
pub use fallback::{NetworkInventory, UrlFallbackReport};
pub use invoker::ExternalAnalyzer;
pub use orchestrator::{AnalysisResponse, AnalysisResult, Orchestrator};
pub use scoring::{breach_risk_score, ladder, reputation_score};
pub use signals::SignalEvaluator;
