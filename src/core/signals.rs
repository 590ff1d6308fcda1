//! Signal Evaluator
//!
//! Pure URL suspicion rules. Every enabled rule is evaluated independently
//! and reported whether it fired or not, in a fixed order, so identical input
//! always yields an identical signal sequence.

use regex::Regex;
use url::{Host, Url};

use crate::models::{AnalysisKind, Signal, SignalKind};

lazy_static::lazy_static! {
    static ref RE_SHORTENER: Regex =
        Regex::new(r"(?i)(^|\.)(bit\.ly|tinyurl\.com|t\.co|goo\.gl)$").unwrap();
    static ref RE_SUSPICIOUS_TLD: Regex =
        Regex::new(r"(?i)[a-z0-9]+-[a-z0-9]+-[a-z0-9]+\.(tk|ml|ga|cf)$").unwrap();
    static ref RE_MALICIOUS_KEYWORDS: Regex =
        Regex::new(r"(?i)phishing|malware|virus|trojan|scam|fake").unwrap();
    static ref RE_PHISHING: Regex =
        Regex::new(r"(?i)secure.*login|verify.*account|suspended.*account").unwrap();
    static ref RE_LONG_DIGITS: Regex = Regex::new(r"[0-9]{10,}").unwrap();
    static ref RE_MULTI_DASH: Regex = Regex::new(r"-{3,}").unwrap();
}

/// Schemes that count as encrypted transport
const ENCRYPTED_SCHEMES: [&str; 2] = ["https", "wss"];

const MAX_DOMAIN_LEN: usize = 30;
const MAX_HOST_LABELS: usize = 4;

/// Parts of a URL the rules look at
struct UrlParts<'a> {
    full: &'a str,
    scheme: String,
    host: String,
    is_ipv4: bool,
}

impl<'a> UrlParts<'a> {
    /// Unparsable input yields an empty host, so only full-text rules can fire
    fn split(full: &'a str) -> Self {
        match Url::parse(full) {
            Ok(url) => Self {
                full,
                scheme: url.scheme().to_string(),
                host: url.host_str().unwrap_or_default().to_string(),
                is_ipv4: matches!(url.host(), Some(Host::Ipv4(_))),
            },
            Err(_) => Self {
                full,
                scheme: String::new(),
                host: String::new(),
                is_ipv4: false,
            },
        }
    }
}

/// Evaluates the enabled subset of URL signals
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    enabled: Vec<SignalKind>,
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self::new(SignalKind::ALL.to_vec())
    }
}

impl SignalEvaluator {
    /// Evaluation order follows `SignalKind::ALL` whatever order `enabled` is in
    pub fn new(enabled: Vec<SignalKind>) -> Self {
        let enabled = SignalKind::ALL
            .iter()
            .copied()
            .filter(|k| enabled.contains(k))
            .collect();
        Self { enabled }
    }

    /// Evaluate every enabled signal for a subject
    ///
    /// Network ranges have no heuristic without packet access, so they
    /// produce no signals.
    pub fn evaluate(&self, subject: &str, kind: AnalysisKind) -> Vec<Signal> {
        match kind {
            AnalysisKind::Url => {
                let parts = UrlParts::split(subject);
                self.enabled
                    .iter()
                    .map(|&k| Signal::new(k, detect(k, &parts)))
                    .collect()
            }
            AnalysisKind::NetworkRange => Vec::new(),
        }
    }
}

fn detect(kind: SignalKind, url: &UrlParts<'_>) -> bool {
    match kind {
        SignalKind::UrlShortener => RE_SHORTENER.is_match(&url.host),
        SignalKind::IpAddressHost => url.is_ipv4,
        SignalKind::SuspiciousTld => RE_SUSPICIOUS_TLD.is_match(&url.host),
        SignalKind::MaliciousKeywords => RE_MALICIOUS_KEYWORDS.is_match(url.full),
        SignalKind::PhishingPattern => RE_PHISHING.is_match(url.full),
        SignalKind::LongDigitRun => RE_LONG_DIGITS.is_match(url.full),
        SignalKind::MultiDash => RE_MULTI_DASH.is_match(url.full),
        SignalKind::InsecureProtocol => !ENCRYPTED_SCHEMES.contains(&url.scheme.as_str()),
        SignalKind::LongDomain => url.host.len() > MAX_DOMAIN_LEN,
        SignalKind::ExcessSubdomains => url.host.split('.').count() > MAX_HOST_LABELS,
    }
}
