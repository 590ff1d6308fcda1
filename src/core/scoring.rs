//! Heuristic Scorer
//!
//! Two scorers with opposite directions:
//! - `reputation_score`: starts at 100 and deducts fired signal penalties.
//!   A HIGH score means LOW risk.
//! - `breach_risk_score`: starts at 0 and adds per-breach weights.
//!   A HIGH score means HIGH risk.
//!
//! They only share the threshold ladder helper. Both are total.

use crate::models::{BreachRiskResult, BreachSeverity, RiskTier, ScoreResult, Signal};

/// Starting reputation before deductions
const FULL_REPUTATION: i32 = 100;

/// Reputation ladder, inclusive lower bounds, highest first
const REPUTATION_LADDER: [(i64, RiskTier); 3] = [
    (80, RiskTier::Low),
    (60, RiskTier::Medium),
    (40, RiskTier::High),
];

/// Breach-risk ladder, inclusive lower bounds, highest first
const BREACH_LADDER: [(i64, RiskTier); 3] = [
    (80, RiskTier::Critical),
    (60, RiskTier::High),
    (30, RiskTier::Medium),
];

/// Walk an ordered threshold ladder; the first rung the score reaches wins
pub fn ladder<T: Copy>(score: i64, rungs: &[(i64, T)], floor: T) -> T {
    rungs
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, tier)| *tier)
        .unwrap_or(floor)
}

/// Score a URL from its evaluated signals
pub fn reputation_score(signals: Vec<Signal>) -> ScoreResult {
    let deducted: i64 = signals
        .iter()
        .filter(|s| s.detected)
        .map(|s| i64::from(s.penalty))
        .sum();

    let raw = i64::from(FULL_REPUTATION) - deducted;
    let raw_score = raw.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    let clamped_score = raw.clamp(0, 100) as u8;
    let tier = ladder(i64::from(clamped_score), &REPUTATION_LADDER, RiskTier::Critical);

    ScoreResult {
        raw_score,
        clamped_score,
        tier,
        signals,
    }
}

/// Score an account from the severities of the breaches it appears in
pub fn breach_risk_score(severities: impl IntoIterator<Item = BreachSeverity>) -> BreachRiskResult {
    let raw_score = severities
        .into_iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.weight()));
    let tier = ladder(i64::from(raw_score), &BREACH_LADDER, RiskTier::Low);

    BreachRiskResult {
        raw_score,
        score: raw_score.min(100) as u8,
        tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalKind;

    fn signals(fired: &[SignalKind]) -> Vec<Signal> {
        SignalKind::ALL
            .iter()
            .map(|&k| Signal::new(k, fired.contains(&k)))
            .collect()
    }

    #[test]
    fn test_ladder_boundaries_are_inclusive() {
        assert_eq!(ladder(80, &REPUTATION_LADDER, RiskTier::Critical), RiskTier::Low);
        assert_eq!(ladder(79, &REPUTATION_LADDER, RiskTier::Critical), RiskTier::Medium);
        assert_eq!(ladder(60, &REPUTATION_LADDER, RiskTier::Critical), RiskTier::Medium);
        assert_eq!(ladder(40, &REPUTATION_LADDER, RiskTier::Critical), RiskTier::High);
        assert_eq!(ladder(39, &REPUTATION_LADDER, RiskTier::Critical), RiskTier::Critical);
    }

    #[test]
    fn test_clean_reputation() {
        let result = reputation_score(signals(&[]));
        assert_eq!(result.raw_score, 100);
        assert_eq!(result.clamped_score, 100);
        assert_eq!(result.tier, RiskTier::Low);
    }

    #[test]
    fn test_deductions_sum_without_dedup() {
        // 100 - 20 - 15 = 65
        let result = reputation_score(signals(&[SignalKind::InsecureProtocol, SignalKind::MultiDash]));
        assert_eq!(result.raw_score, 65);
        assert_eq!(result.tier, RiskTier::Medium);
        assert_eq!(result.fired_names(), vec!["Multi-Dash", "Insecure Protocol"]);
    }

    #[test]
    fn test_every_signal_clamps_to_zero() {
        let result = reputation_score(signals(&SignalKind::ALL));
        assert!(result.raw_score < 0);
        assert_eq!(result.clamped_score, 0);
        assert_eq!(result.tier, RiskTier::Critical);
    }

    #[test]
    fn test_undetected_penalties_ignored() {
        let result = reputation_score(signals(&[SignalKind::MaliciousKeywords]));
        assert_eq!(result.raw_score, 60);
        assert_eq!(result.tier, RiskTier::Medium);
    }

    #[test]
    fn test_breach_high_plus_medium_is_medium() {
        let result = breach_risk_score([BreachSeverity::High, BreachSeverity::Medium]);
        assert_eq!(result.raw_score, 50);
        assert_eq!(result.score, 50);
        assert_eq!(result.tier, RiskTier::Medium);
    }

    #[test]
    fn test_breach_ladder() {
        assert_eq!(breach_risk_score(Vec::<BreachSeverity>::new()).tier, RiskTier::Low);
        assert_eq!(breach_risk_score([BreachSeverity::Low]).tier, RiskTier::Low);
        assert_eq!(breach_risk_score([BreachSeverity::High]).tier, RiskTier::Medium);
        assert_eq!(
            breach_risk_score([BreachSeverity::Critical, BreachSeverity::Medium]).tier,
            RiskTier::High
        );
        assert_eq!(
            breach_risk_score([BreachSeverity::Critical, BreachSeverity::Critical]).tier,
            RiskTier::Critical
        );
    }

    #[test]
    fn test_breach_score_capped() {
        let result = breach_risk_score([BreachSeverity::Critical; 4]);
        assert_eq!(result.raw_score, 160);
        assert_eq!(result.score, 100);
        assert_eq!(result.tier, RiskTier::Critical);
    }
}
