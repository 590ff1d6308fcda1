//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::AppError;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.public_message(),
        }
    }
}

// ============================================
// Analysis
// ============================================

/// Body of `POST /v1/analyze/url`
#[derive(Debug, Default, Deserialize)]
pub struct UrlAnalysisRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of `POST /v1/analyze/network`
#[derive(Debug, Default, Deserialize)]
pub struct NetworkAnalysisRequest {
    #[serde(default, rename = "networkRange", alias = "network_range")]
    pub network_range: Option<String>,
}

// ============================================
// Breach Check
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct BreachCheckRequest {
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub counters: TelemetryStats,
    /// Analyzer processes that could start right now
    pub available_spawn_slots: usize,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
