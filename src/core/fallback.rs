//! Fallback Reports
//!
//! Shapes the heuristic path's output into what callers receive when the
//! external analyzer is unavailable:
//! - URL subjects: reputation report built from the scored signals
//! - Network ranges: a fixed, explicitly labeled device inventory plus
//!   count statistics (no score; nothing is probed)

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::models::{RiskTier, ScoreResult, SignalKind};
use crate::utils::constants::INTERNAL_DATABASE;

// ============================================
// URL Reputation Report
// ============================================

/// Reputation bucket derived from the raw (unclamped) score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReputationCategory {
    Clean,
    Suspicious,
    Malicious,
}

impl ReputationCategory {
    pub fn from_raw(raw_score: i32) -> Self {
        if raw_score > 70 {
            Self::Clean
        } else if raw_score > 40 {
            Self::Suspicious
        } else {
            Self::Malicious
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SslAnalysis {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReputation {
    pub score: i32,
    pub flags: Vec<String>,
    pub category: ReputationCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalwareCheck {
    pub detected: bool,
    pub databases_checked: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhishingAnalysis {
    pub detected: bool,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectHop {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectChain {
    pub chain: Vec<RedirectHop>,
    pub suspicious: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub suspicious: bool,
}

/// Heuristic URL report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlFallbackReport {
    pub url: String,
    /// Clamped reputation, 0..=100, higher is safer
    pub threat_score: u8,
    pub tier: RiskTier,
    pub risk_level: &'static str,
    pub ssl_analysis: SslAnalysis,
    pub domain_reputation: DomainReputation,
    pub malware_check: MalwareCheck,
    pub phishing_analysis: PhishingAnalysis,
    pub redirect_chain: RedirectChain,
    pub content_analysis: ContentAnalysis,
    pub score: ScoreResult,
}

impl UrlFallbackReport {
    pub fn build(url: &str, score: ScoreResult) -> Self {
        let flags = score.fired_names();
        let fired = |kind: SignalKind| score.fired().any(|s| s.kind == kind);

        let malware_detected = fired(SignalKind::MaliciousKeywords);
        let phishing_detected = fired(SignalKind::PhishingPattern);
        let phishing_patterns = score
            .fired()
            .filter(|s| s.kind == SignalKind::PhishingPattern)
            .map(|s| s.name.to_string())
            .collect();
        let https = Url::parse(url).map(|u| u.scheme() == "https").unwrap_or(false);

        Self {
            url: url.to_string(),
            threat_score: score.clamped_score,
            tier: score.tier,
            risk_level: score.tier.label(),
            ssl_analysis: SslAnalysis { valid: https },
            domain_reputation: DomainReputation {
                score: score.raw_score,
                category: ReputationCategory::from_raw(score.raw_score),
                flags: flags.clone(),
            },
            malware_check: MalwareCheck {
                detected: malware_detected,
                databases_checked: vec![INTERNAL_DATABASE.to_string()],
                confidence: if flags.is_empty() { 0.1 } else { 0.8 },
            },
            phishing_analysis: PhishingAnalysis {
                detected: phishing_detected,
                patterns: phishing_patterns,
            },
            redirect_chain: RedirectChain {
                chain: vec![RedirectHop { url: url.to_string() }],
                suspicious: false,
            },
            content_analysis: ContentAnalysis {
                suspicious: flags.len() > 2,
            },
            score,
        }
    }
}

// ============================================
// Network Inventory
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    Router,
    Computer,
    Mobile,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub ip: &'static str,
    pub hostname: &'static str,
    pub device_type: DeviceType,
    pub mac_address: &'static str,
    pub vendor: &'static str,
    pub open_ports: Vec<u16>,
    pub is_secure: bool,
    pub last_seen: DateTime<Utc>,
    pub geolocation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatistics {
    pub total_devices: usize,
    pub secure_devices: usize,
    pub unknown_devices: usize,
    pub scan_timestamp: DateTime<Utc>,
}

impl NetworkStatistics {
    pub fn from_devices(devices: &[Device], at: DateTime<Utc>) -> Self {
        Self {
            total_devices: devices.len(),
            secure_devices: devices.iter().filter(|d| d.is_secure).count(),
            unknown_devices: devices
                .iter()
                .filter(|d| d.device_type == DeviceType::Unknown)
                .count(),
            scan_timestamp: at,
        }
    }
}

/// Fixed device inventory reported for network ranges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInventory {
    pub network_range: String,
    pub devices: Vec<Device>,
    pub statistics: NetworkStatistics,
    pub scan_duration: String,
    /// Threats observed in the range; empty without packet-level access
    pub threats: Vec<String>,
    /// Always present: the inventory is illustrative, not a scan result
    pub limitation: &'static str,
}

const INVENTORY_LIMITATION: &str =
    "static device inventory; no packet-level scan was performed for this range";

impl NetworkInventory {
    /// `elapsed` is the time spent on the failed external attempt
    pub fn build(range: &str, elapsed: Duration) -> Self {
        let now = Utc::now();
        let devices = vec![
            Device {
                ip: "192.168.1.1",
                hostname: "Router-Gateway",
                device_type: DeviceType::Router,
                mac_address: "00:1A:2B:3C:4D:5E",
                vendor: "Cisco",
                open_ports: vec![80, 443, 22],
                is_secure: true,
                last_seen: now,
                geolocation: None,
            },
            Device {
                ip: "192.168.1.100",
                hostname: "Unknown-Device",
                device_type: DeviceType::Unknown,
                mac_address: "AA:BB:CC:DD:EE:FF",
                vendor: "Unknown",
                open_ports: vec![23, 80, 135],
                is_secure: false,
                last_seen: now,
                geolocation: None,
            },
        ];
        let statistics = NetworkStatistics::from_devices(&devices, now);

        Self {
            network_range: range.to_string(),
            devices,
            statistics,
            scan_duration: format!("{:.1} seconds", elapsed.as_secs_f64()),
            threats: Vec::new(),
            limitation: INVENTORY_LIMITATION,
        }
    }
}
