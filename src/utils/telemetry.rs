//! Telemetry Module
//!
//! In-process counters describing how requests were answered:
//! - how often the external analyzer answered vs. the fallback path
//! - why the external analyzer failed, per reason
//! - risk tiers handed out by the heuristic path
//!
//! Counters only. Subjects are never stored.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{FailureReason, RiskTier};

/// Snapshot of the counters
#[derive(Debug, Clone, Serialize, Default)]
pub struct TelemetryStats {
    /// Requests answered (external + fallback)
    pub total_analyzed: u64,
    /// Answered by the external analyzer
    pub external_results: u64,
    /// Answered by the heuristic path
    pub fallback_results: u64,
    /// Abandoned because the caller went away
    pub cancelled: u64,
    /// Breach lookups served
    pub breach_checks: u64,
    /// Fallbacks by analyzer failure reason
    pub failures_by_reason: HashMap<String, u64>,
    /// Heuristic tiers handed out
    pub tiers: HashMap<String, u64>,
    /// Average end-to-end latency of answered requests (ms)
    pub avg_latency_ms: f64,
    /// Collector start (unix seconds)
    pub period_start: u64,
    /// Snapshot time (unix seconds)
    pub period_end: u64,
}

/// Main telemetry collector
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    external_results: AtomicU64,
    fallback_results: AtomicU64,
    cancelled: AtomicU64,
    breach_checks: AtomicU64,
    total_latency_ms: AtomicU64,
    failure_counts: RwLock<HashMap<FailureReason, u64>>,
    tier_counts: RwLock<HashMap<RiskTier, u64>>,
    session_start: u64,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            external_results: AtomicU64::new(0),
            fallback_results: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            breach_checks: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            failure_counts: RwLock::new(HashMap::new()),
            tier_counts: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
        }
    }

    /// Record a request answered by the external analyzer
    pub fn record_external(&self, latency_ms: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.external_results.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    /// Record a request answered by the heuristic path
    ///
    /// `tier` is None for network ranges, which are not scored.
    pub fn record_fallback(&self, reason: FailureReason, tier: Option<RiskTier>, latency_ms: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.fallback_results.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if let Ok(mut counts) = self.failure_counts.write() {
            *counts.entry(reason).or_insert(0) += 1;
        }

        if let Some(tier) = tier {
            if let Ok(mut counts) = self.tier_counts.write() {
                *counts.entry(tier).or_insert(0) += 1;
            }
        }
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_breach_check(&self) {
        self.breach_checks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        let total_analyzed = self.total_analyzed.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency = if total_analyzed > 0 {
            total_latency as f64 / total_analyzed as f64
        } else {
            0.0
        };

        let failures_by_reason = self
            .failure_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        let tiers = self
            .tier_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            total_analyzed,
            external_results: self.external_results.load(Ordering::Relaxed),
            fallback_results: self.fallback_results.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            breach_checks: self.breach_checks.load(Ordering::Relaxed),
            failures_by_reason,
            tiers,
            avg_latency_ms: avg_latency,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
