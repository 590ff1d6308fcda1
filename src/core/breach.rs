//! Breach checker
//!
//! Looks an address up in the built-in breach catalog and rates the exposure
//! with the additive breach-risk scorer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::scoring::breach_risk_score;
use crate::models::{BreachSeverity, RiskTier};

/// One known breach
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreachRecord {
    pub name: &'static str,
    pub date: &'static str,
    pub data_types: Vec<&'static str>,
    pub threat_level: BreachSeverity,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskTier,
    pub score: u8,
    pub description: String,
}

/// Result of a breach lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreachReport {
    pub email: String,
    pub is_compromised: bool,
    pub breach_count: usize,
    pub breaches: Vec<BreachRecord>,
    pub risk_assessment: RiskAssessment,
    pub check_timestamp: DateTime<Utc>,
    pub recommendations: Vec<&'static str>,
}

const COMPROMISED_ADVICE: [&str; 3] = [
    "Change passwords for all accounts associated with this email",
    "Enable two-factor authentication where possible",
    "Monitor your accounts for suspicious activity",
];

const SAFE_ADVICE: [&str; 1] = ["Your email appears to be safe from known breaches."];

/// Address → breaches, keyed by lowercase address
#[derive(Debug, Clone, Default)]
pub struct BreachCatalog {
    entries: HashMap<String, Vec<BreachRecord>>,
}

impl BreachCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog shipped with the service
    pub fn builtin() -> Self {
        Self::new()
            .with_breach(
                "test@example.com",
                BreachRecord {
                    name: "DataCorp Breach 2023",
                    date: "2023-08-15",
                    data_types: vec!["Email addresses", "Passwords", "Names", "Phone numbers"],
                    threat_level: BreachSeverity::High,
                    description: "Major data breach affecting 2.5 million users",
                },
            )
            .with_breach(
                "test@example.com",
                BreachRecord {
                    name: "SocialNet Leak 2022",
                    date: "2022-03-10",
                    data_types: vec!["Email addresses", "Profile data", "Messages"],
                    threat_level: BreachSeverity::Medium,
                    description: "Social media platform data exposure",
                },
            )
            .with_breach(
                "admin@test.com",
                BreachRecord {
                    name: "TechCorp Incident 2024",
                    date: "2024-01-20",
                    data_types: vec!["Email addresses", "Encrypted passwords", "User preferences"],
                    threat_level: BreachSeverity::Low,
                    description: "Limited exposure of user account data",
                },
            )
    }

    pub fn with_breach(mut self, email: &str, record: BreachRecord) -> Self {
        self.entries
            .entry(email.trim().to_lowercase())
            .or_default()
            .push(record);
        self
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, email: &str) -> &[BreachRecord] {
        self.entries
            .get(&email.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn check(&self, email: &str) -> BreachReport {
        let breaches = self.lookup(email).to_vec();
        let risk = breach_risk_score(breaches.iter().map(|b| b.threat_level));
        let is_compromised = !breaches.is_empty();

        BreachReport {
            email: email.to_string(),
            is_compromised,
            breach_count: breaches.len(),
            risk_assessment: RiskAssessment {
                level: risk.tier,
                score: risk.score,
                description: format!(
                    "Risk level: {} based on {} breach(es)",
                    risk.tier.as_str(),
                    breaches.len()
                ),
            },
            breaches,
            check_timestamp: Utc::now(),
            recommendations: if is_compromised {
                COMPROMISED_ADVICE.to_vec()
            } else {
                SAFE_ADVICE.to_vec()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_breaches_rate_medium() {
        let report = BreachCatalog::builtin().check("Test@Example.com");
        assert!(report.is_compromised);
        assert_eq!(report.breach_count, 2);
        assert_eq!(report.risk_assessment.score, 50);
        assert_eq!(report.risk_assessment.level, RiskTier::Medium);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.email, "Test@Example.com");
    }

    #[test]
    fn test_single_low_breach() {
        let report = BreachCatalog::builtin().check("admin@test.com");
        assert_eq!(report.risk_assessment.score, 10);
        assert_eq!(report.risk_assessment.level, RiskTier::Low);
        assert_eq!(report.risk_assessment.description, "Risk level: Low based on 1 breach(es)");
    }

    #[test]
    fn test_unknown_address_is_clean() {
        let report = BreachCatalog::builtin().check("nobody@nowhere.org");
        assert!(!report.is_compromised);
        assert_eq!(report.breach_count, 0);
        assert_eq!(report.risk_assessment.score, 0);
        assert_eq!(report.risk_assessment.level, RiskTier::Low);
        assert_eq!(report.recommendations, SAFE_ADVICE.to_vec());
    }
}
