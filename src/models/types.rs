//! Type definitions for threatscope
//! Core data structures shared by the scorer, the invoker and the gateway

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::DEFAULT_NETWORK_RANGE;

/// What kind of subject is being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Url,
    NetworkRange,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Url => "url",
            AnalysisKind::NetworkRange => "network_range",
        }
    }
}

/// A validated analysis request
///
/// Only constructible through [`AnalysisRequest::url`] and
/// [`AnalysisRequest::network`], so a request that reaches the core always
/// carries a non-empty subject, and URL subjects always have a scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    kind: AnalysisKind,
    subject: String,
}

impl AnalysisRequest {
    /// Validate a URL subject
    pub fn url(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::bad_request("URL is required"));
        }

        let parsed = Url::parse(raw)
            .map_err(|e| AppError::with_source(ErrorCode::ApiBadRequest, "Invalid URL format", e))?;

        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(Self {
                kind: AnalysisKind::Url,
                subject: raw.to_string(),
            }),
            _ => Err(AppError::bad_request("Invalid URL format")),
        }
    }

    /// Build a network-range request, falling back to the default range
    pub fn network(range: Option<&str>) -> Self {
        let subject = range
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_NETWORK_RANGE)
            .to_string();

        Self {
            kind: AnalysisKind::NetworkRange,
            subject,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Discrete risk classification derived from a score ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }

    /// Label used by the URL reputation report
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
            RiskTier::Critical => "Critical Risk",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskTier::Low => "✅",
            RiskTier::Medium => "🟡",
            RiskTier::High => "🔴",
            RiskTier::Critical => "💀",
        }
    }
}

/// Identifier of one URL suspicion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    UrlShortener,
    IpAddressHost,
    SuspiciousTld,
    MaliciousKeywords,
    PhishingPattern,
    LongDigitRun,
    MultiDash,
    InsecureProtocol,
    LongDomain,
    ExcessSubdomains,
}

impl SignalKind {
    /// Evaluation order
    pub const ALL: [SignalKind; 10] = [
        SignalKind::UrlShortener,
        SignalKind::IpAddressHost,
        SignalKind::SuspiciousTld,
        SignalKind::MaliciousKeywords,
        SignalKind::PhishingPattern,
        SignalKind::LongDigitRun,
        SignalKind::MultiDash,
        SignalKind::InsecureProtocol,
        SignalKind::LongDomain,
        SignalKind::ExcessSubdomains,
    ];

    /// Stable identifier, as used in configuration
    pub fn id(&self) -> &'static str {
        match self {
            SignalKind::UrlShortener => "url_shortener",
            SignalKind::IpAddressHost => "ip_address_host",
            SignalKind::SuspiciousTld => "suspicious_tld",
            SignalKind::MaliciousKeywords => "malicious_keywords",
            SignalKind::PhishingPattern => "phishing_pattern",
            SignalKind::LongDigitRun => "long_digit_run",
            SignalKind::MultiDash => "multi_dash",
            SignalKind::InsecureProtocol => "insecure_protocol",
            SignalKind::LongDomain => "long_domain",
            SignalKind::ExcessSubdomains => "excess_subdomains",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::UrlShortener => "URL Shortener",
            SignalKind::IpAddressHost => "IP Address Host",
            SignalKind::SuspiciousTld => "Suspicious TLD",
            SignalKind::MaliciousKeywords => "Malicious Keywords",
            SignalKind::PhishingPattern => "Phishing Pattern",
            SignalKind::LongDigitRun => "Long Digit Run",
            SignalKind::MultiDash => "Multi-Dash",
            SignalKind::InsecureProtocol => "Insecure Protocol",
            SignalKind::LongDomain => "Long Domain",
            SignalKind::ExcessSubdomains => "Excess Subdomains",
        }
    }

    /// Reputation points deducted when the signal fires
    pub fn penalty(&self) -> u32 {
        match self {
            SignalKind::UrlShortener => 15,
            SignalKind::IpAddressHost => 25,
            SignalKind::SuspiciousTld => 30,
            SignalKind::MaliciousKeywords => 40,
            SignalKind::PhishingPattern => 35,
            SignalKind::LongDigitRun => 20,
            SignalKind::MultiDash => 15,
            SignalKind::InsecureProtocol => 20,
            SignalKind::LongDomain => 15,
            SignalKind::ExcessSubdomains => 10,
        }
    }
}

/// One evaluated suspicion indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub name: &'static str,
    pub detected: bool,
    pub penalty: u32,
}

impl Signal {
    pub fn new(kind: SignalKind, detected: bool) -> Self {
        Self {
            kind,
            name: kind.name(),
            detected,
            penalty: kind.penalty(),
        }
    }
}

/// Output of the reputation scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    /// 100 minus every fired penalty, may be negative
    pub raw_score: i32,
    /// `raw_score` clamped into 0..=100
    pub clamped_score: u8,
    pub tier: RiskTier,
    pub signals: Vec<Signal>,
}

impl ScoreResult {
    /// Signals that actually fired, in evaluation order
    pub fn fired(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.detected)
    }

    pub fn fired_names(&self) -> Vec<String> {
        self.fired().map(|s| s.name.to_string()).collect()
    }
}

/// Why an external analyzer attempt produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    SpawnError,
    NonZeroExit,
    MalformedOutput,
    Timeout,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::SpawnError => "spawn_error",
            FailureReason::NonZeroExit => "non_zero_exit",
            FailureReason::MalformedOutput => "malformed_output",
            FailureReason::Timeout => "timeout",
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            FailureReason::SpawnError => ErrorCode::AnalyzerSpawnFailed,
            FailureReason::NonZeroExit => ErrorCode::AnalyzerNonZeroExit,
            FailureReason::MalformedOutput => ErrorCode::AnalyzerMalformedOutput,
            FailureReason::Timeout => ErrorCode::AnalyzerTimeout,
        }
    }
}

/// Failure of one external analyzer attempt, with diagnostics for the logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerFailure {
    /// Binary missing, permission denied, or no analyzer configured
    SpawnError(String),
    /// Process exited unsuccessfully; `code` is None when killed by a signal
    NonZeroExit { code: Option<i32>, stderr: String },
    /// Exit 0 but stdout was not a JSON object (or exceeded the capture cap)
    MalformedOutput(String),
    /// Deadline fired first; the process was killed
    Timeout(Duration),
}

impl AnalyzerFailure {
    pub fn reason(&self) -> FailureReason {
        match self {
            AnalyzerFailure::SpawnError(_) => FailureReason::SpawnError,
            AnalyzerFailure::NonZeroExit { .. } => FailureReason::NonZeroExit,
            AnalyzerFailure::MalformedOutput(_) => FailureReason::MalformedOutput,
            AnalyzerFailure::Timeout(_) => FailureReason::Timeout,
        }
    }
}

impl fmt::Display for AnalyzerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerFailure::SpawnError(msg) => write!(f, "failed to start analyzer: {}", msg),
            AnalyzerFailure::NonZeroExit { code: Some(code), stderr } => {
                write!(f, "analyzer failed with code {}: {}", code, stderr)
            }
            AnalyzerFailure::NonZeroExit { code: None, stderr } => {
                write!(f, "analyzer terminated by signal: {}", stderr)
            }
            AnalyzerFailure::MalformedOutput(msg) => write!(f, "malformed analyzer output: {}", msg),
            AnalyzerFailure::Timeout(deadline) => {
                write!(f, "analyzer timed out after {:.1}s", deadline.as_secs_f64())
            }
        }
    }
}

/// Result of exactly one external analyzer attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerOutcome {
    /// Structured record the analyzer wrote to stdout
    Success(serde_json::Value),
    Failure(AnalyzerFailure),
}

impl AnalyzerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalyzerOutcome::Success(_))
    }
}

/// Where an analysis result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisSource {
    External,
    Fallback,
}

/// Threat level attached to a known breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreachSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BreachSeverity {
    /// Risk points added per breach of this severity
    pub fn weight(&self) -> u32 {
        match self {
            BreachSeverity::Critical => 40,
            BreachSeverity::High => 30,
            BreachSeverity::Medium => 20,
            BreachSeverity::Low => 10,
        }
    }
}

/// Output of the additive breach-risk scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreachRiskResult {
    /// Sum of breach weights, unbounded
    pub raw_score: u32,
    /// `raw_score` capped at 100
    pub score: u8,
    pub tier: RiskTier,
}
