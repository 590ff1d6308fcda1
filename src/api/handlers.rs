//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::middleware::RateLimiter;
use super::types::*;
use crate::core::breach::{BreachCatalog, BreachReport};
use crate::core::orchestrator::{AnalysisResponse, Orchestrator};
use crate::models::{AnalysisRequest, AppError, EngineConfig};
use crate::utils::constants::APP_VERSION;
use crate::utils::telemetry::TelemetryCollector;

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared application state
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub breaches: BreachCatalog,
    pub telemetry: Arc<TelemetryCollector>,
    pub rate_limiter: Arc<RateLimiter>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let telemetry = Arc::new(TelemetryCollector::new());

        Self {
            orchestrator: Orchestrator::new(config, telemetry.clone()),
            breaches: BreachCatalog::builtin(),
            telemetry,
            rate_limiter: Arc::new(RateLimiter::default()),
            start_time: Instant::now(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn reject(err: AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warn!(code = err.code_str(), error = %err, "Request rejected");
    (status, Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))))
}

/// Unwrap a JSON body, mapping malformed bodies to 400
fn body<T>(payload: Result<Json<T>, JsonRejection>, start: Instant) -> Result<T, (StatusCode, Json<ApiResponse<()>>)> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        reject(
            AppError::bad_request(format!("Invalid JSON body: {}", rejection.body_text())),
            start,
        )
    })
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// URL Analysis
// ============================================

pub async fn analyze_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UrlAnalysisRequest>, JsonRejection>,
) -> ApiResult<AnalysisResponse> {
    let start = Instant::now();
    let req = body(payload, start)?;

    let request = AnalysisRequest::url(req.url.as_deref().unwrap_or_default())
        .map_err(|e| reject(e, start))?;

    info!("🔍 URL analysis requested");
    let response = state.orchestrator.handle(&request).await;

    Ok(Json(ApiResponse::success(response, elapsed_ms(start))))
}

// ============================================
// Network Analysis
// ============================================

pub async fn analyze_network(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NetworkAnalysisRequest>, JsonRejection>,
) -> ApiResult<AnalysisResponse> {
    let start = Instant::now();
    let req = body(payload, start)?;

    let request = AnalysisRequest::network(req.network_range.as_deref());
    info!(range = %request.subject(), "🌐 Network analysis requested");
    let response = state.orchestrator.handle(&request).await;

    Ok(Json(ApiResponse::success(response, elapsed_ms(start))))
}

// ============================================
// Breach Check
// ============================================

pub async fn check_breach(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BreachCheckRequest>, JsonRejection>,
) -> ApiResult<BreachReport> {
    let start = Instant::now();
    let req = body(payload, start)?;

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| reject(AppError::bad_request("Email is required"), start))?;

    let report = state.breaches.check(email);
    state.telemetry.record_breach_check();
    info!(
        breaches = report.breach_count,
        level = report.risk_assessment.level.as_str(),
        "🔐 Breach check complete"
    );

    Ok(Json(ApiResponse::success(report, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        counters: state.telemetry.get_stats(),
        available_spawn_slots: state.orchestrator.available_spawn_slots(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}
