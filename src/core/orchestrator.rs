//! Orchestrator
//!
//! One request, one state machine:
//!
//! ```text
//! Start → Invoking ─┬─ Success ──────────────→ Done(External)
//!                   └─ Failure → Fallback ───→ Done(Fallback, note)
//! ```
//!
//! The heuristic path runs only after the external attempt has produced a
//! failure, never in parallel with it. `handle` is infallible: every path
//! ends in an [`AnalysisResponse`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use super::fallback::{NetworkInventory, UrlFallbackReport};
use super::invoker::ExternalAnalyzer;
use super::scoring::reputation_score;
use super::signals::SignalEvaluator;
use crate::models::{
    AnalysisKind, AnalysisRequest, AnalysisSource, AnalyzerFailure, AnalyzerOutcome, EngineConfig,
    RiskTier,
};
use crate::utils::constants::FALLBACK_NOTE;
use crate::utils::telemetry::TelemetryCollector;

/// Payload of an analysis response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    /// Record produced by the external analyzer, passed through as-is
    External(serde_json::Value),
    Url(UrlFallbackReport),
    Network(NetworkInventory),
}

/// Final response for one analysis request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub kind: AnalysisKind,
    pub subject: String,
    pub source: AnalysisSource,
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResponse {
    fn external(request: &AnalysisRequest, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: request.kind(),
            subject: request.subject().to_string(),
            source: AnalysisSource::External,
            result: AnalysisResult::External(payload),
            note: None,
            timestamp: Utc::now(),
        }
    }

    fn fallback(request: &AnalysisRequest, result: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: request.kind(),
            subject: request.subject().to_string(),
            source: AnalysisSource::Fallback,
            result,
            note: Some(FALLBACK_NOTE.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Tier of a heuristic URL result
    pub fn fallback_tier(&self) -> Option<RiskTier> {
        match &self.result {
            AnalysisResult::Url(report) => Some(report.tier),
            _ => None,
        }
    }
}

/// Drives external analysis with heuristic fallback
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    evaluator: SignalEvaluator,
    analyzer: ExternalAnalyzer,
    telemetry: Arc<TelemetryCollector>,
}

impl Orchestrator {
    pub fn new(config: Arc<EngineConfig>, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            evaluator: SignalEvaluator::new(config.enabled_signals()),
            analyzer: ExternalAnalyzer::new(config.clone()),
            config,
            telemetry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn available_spawn_slots(&self) -> usize {
        self.analyzer.available_permits()
    }

    /// Analyze a request: external analyzer first, heuristic fallback on any failure
    pub async fn handle(&self, request: &AnalysisRequest) -> AnalysisResponse {
        let start = Instant::now();
        let kind = request.kind();
        let deadline = self.config.deadline_for(kind);

        match self.analyzer.invoke(request.subject(), kind, deadline).await {
            AnalyzerOutcome::Success(payload) => {
                let latency = start.elapsed().as_millis() as u64;
                self.telemetry.record_external(latency);
                info!(kind = kind.as_str(), latency_ms = latency, "🔬 External analysis complete");
                AnalysisResponse::external(request, payload)
            }
            AnalyzerOutcome::Failure(failure) => self.recover(request, failure, start),
        }
    }

    /// Like [`handle`](Self::handle), but gives up when `cancelled` resolves
    ///
    /// Cancellation drops the in-flight invocation, which kills the analyzer
    /// process. No fallback is computed for a cancelled request.
    pub async fn handle_until<C>(&self, request: &AnalysisRequest, cancelled: C) -> Option<AnalysisResponse>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancelled => {
                self.telemetry.record_cancelled();
                info!(kind = request.kind().as_str(), "🛑 Analysis cancelled by caller");
                None
            }
            response = self.handle(request) => Some(response),
        }
    }

    /// Heuristic result for a request, without touching the external analyzer
    ///
    /// `elapsed` is the time already spent on the failed external attempt.
    pub fn fallback(&self, request: &AnalysisRequest, elapsed: Duration) -> AnalysisResult {
        match request.kind() {
            AnalysisKind::Url => {
                let signals = self.evaluator.evaluate(request.subject(), AnalysisKind::Url);
                AnalysisResult::Url(UrlFallbackReport::build(
                    request.subject(),
                    reputation_score(signals),
                ))
            }
            AnalysisKind::NetworkRange => {
                AnalysisResult::Network(NetworkInventory::build(request.subject(), elapsed))
            }
        }
    }

    fn recover(&self, request: &AnalysisRequest, failure: AnalyzerFailure, start: Instant) -> AnalysisResponse {
        let reason = failure.reason();
        debug_assert!(reason.error_code().is_recoverable());
        warn!(
            kind = request.kind().as_str(),
            code = reason.error_code().as_str(),
            error = %failure,
            "⚠️ External analyzer failed, using heuristic fallback"
        );

        let response = AnalysisResponse::fallback(request, self.fallback(request, start.elapsed()));
        let tier = response.fallback_tier();
        self.telemetry
            .record_fallback(reason, tier, start.elapsed().as_millis() as u64);

        if let Some(tier) = tier {
            info!(tier = tier.as_str(), "{} Heuristic score computed", tier.emoji());
        }

        response
    }
}
