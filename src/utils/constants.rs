//! Constants Module - Single Source of Truth
//!
//! Defaults for deadlines, limits and analyzer commands live here so the
//! configuration layer and the tests agree on the same numbers.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "threatscope";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// EXTERNAL ANALYZER
// ============================================

/// Wall-clock budget for URL analysis (seconds)
pub const DEFAULT_URL_DEADLINE_SECS: u64 = 30;

/// Wall-clock budget for network analysis (seconds); sweeps are heavier
pub const DEFAULT_NETWORK_DEADLINE_SECS: u64 = 60;

/// Concurrent analyzer processes allowed per host
pub const DEFAULT_MAX_CONCURRENT_SPAWNS: usize = 16;

/// Per-stream capture cap for analyzer output (bytes)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Default URL analyzer command line
pub const DEFAULT_URL_ANALYZER: &str = "python3 scripts/url_threat_scanner_service.py";

/// Default network analyzer command line
pub const DEFAULT_NETWORK_ANALYZER: &str = "python3 scripts/network_scanner_service.py";

// ============================================
// FALLBACK
// ============================================

/// Network range used when the caller does not supply one
pub const DEFAULT_NETWORK_RANGE: &str = "192.168.1.0/24";

/// Note attached to every degraded response
pub const FALLBACK_NOTE: &str = "external analysis unavailable";

/// Database label reported by the heuristic malware check
pub const INTERNAL_DATABASE: &str = "Internal Analysis";

// ============================================
// SERVER
// ============================================

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8080;

/// Requests allowed per client per rate-limit window
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Rate-limit window (seconds)
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
