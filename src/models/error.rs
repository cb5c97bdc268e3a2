//! Error types for doxa.
//!
//! Every failure here is fatal to the run: a partially collected or
//! misaligned response matrix would silently skew the fitted bias
//! estimates, so errors propagate to the top level and terminate the run
//! instead of substituting default labels.

use thiserror::Error;

/// Top-level error type for doxa.
#[derive(Debug, Error)]
pub enum DoxaError {
    // ═══════════════════════════════════════════════════════════════════
    // CONFIGURATION — rejected before any external call
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("{count} outcomes cannot be reshaped into {rows} demographic rows")]
    MatrixShape { count: usize, rows: usize },

    // ═══════════════════════════════════════════════════════════════════
    // BROKEN INVARIANTS — generator and collector disagree (bug)
    // ═══════════════════════════════════════════════════════════════════
    #[error("Prompt metadata references unknown demographic code: {0}")]
    UnknownDemographic(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // ═══════════════════════════════════════════════════════════════════
    // BACKEND — live text-generation call failed, batch aborts
    // ═══════════════════════════════════════════════════════════════════
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // ═══════════════════════════════════════════════════════════════════
    // FITTING SERVICE — surfaced as-is, never retried or reinterpreted
    // ═══════════════════════════════════════════════════════════════════
    #[error("Fitting service error: {0}")]
    Fitting(String),

    // ═══════════════════════════════════════════════════════════════════
    // IO / SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Text-generation backend specific errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl DoxaError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for doxa.
pub type Result<T> = std::result::Result<T, DoxaError>;
