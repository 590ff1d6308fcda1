//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs can be grepped per cause.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - API_xxx: Request gateway errors
//! - CFG_xxx: Configuration errors
//! - ANALYZER_xxx: External analyzer failures (logged, never returned)

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Message safe to hand back to a caller
    ///
    /// Client errors keep their message; anything server-side collapses into
    /// a generic text so no process diagnostics leak out.
    pub fn public_message(&self) -> String {
        if self.code.http_status() < 500 {
            self.message.clone()
        } else {
            "Internal server error".to_string()
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format (missing subject, unparsable URL)
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Unknown signal id in the disabled-signal list
    ConfigUnknownSignal,

    // ============================================
    // External Analyzer Errors
    // ============================================
    /// Analyzer could not be started
    AnalyzerSpawnFailed,
    /// Analyzer exited with a non-zero code
    AnalyzerNonZeroExit,
    /// Analyzer stdout was not a structured record
    AnalyzerMalformedOutput,
    /// Analyzer exceeded its deadline
    AnalyzerTimeout,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "INTERNAL_ERROR",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigUnknownSignal => "CFG_UNKNOWN_SIGNAL",

            Self::AnalyzerSpawnFailed => "ANALYZER_SPAWN_FAILED",
            Self::AnalyzerNonZeroExit => "ANALYZER_NON_ZERO_EXIT",
            Self::AnalyzerMalformedOutput => "ANALYZER_MALFORMED_OUTPUT",
            Self::AnalyzerTimeout => "ANALYZER_TIMEOUT",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest => 400,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Whether the orchestrator absorbs this error into a fallback response
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AnalyzerSpawnFailed
                | Self::AnalyzerNonZeroExit
                | Self::AnalyzerMalformedOutput
                | Self::AnalyzerTimeout
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }

    /// Client exceeded its request window
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ErrorCode::ApiRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", retry_after_secs),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;
