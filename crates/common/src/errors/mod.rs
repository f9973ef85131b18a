//! Error types for ClaimForge
//!
//! The engine expresses domain failures (missing evidence, failed checks)
//! inside the emitted record. The errors here cover everything else:
//! - Configuration loading
//! - Malformed input that cannot even be turned into a record
//! - Records received from outside that violate the wire contract
//! - Worker task failures and timeouts

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    InvalidInput,
    DuplicatePage,

    // Record contract errors (2xxx)
    InvalidRecord,
    MissingField,
    CalibrationViolation,

    // Execution errors (3xxx)
    TaskFailed,
    Timeout,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Input (1xxx)
            ErrorCode::InvalidInput => 1001,
            ErrorCode::DuplicatePage => 1002,

            // Record (2xxx)
            ErrorCode::InvalidRecord => 2001,
            ErrorCode::MissingField => 2002,
            ErrorCode::CalibrationViolation => 2003,

            // Execution (3xxx)
            ErrorCode::TaskFailed => 3001,
            ErrorCode::Timeout => 3002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    // Input errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Duplicate page number in slice: {page}")]
    DuplicatePage { page: u32 },

    // Record contract errors
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Certainty category '{category}' does not match score {score:.4}")]
    CalibrationViolation { category: String, score: f64 },

    // Execution errors
    #[error("Worker task failed: {message}")]
    TaskFailed { message: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidInput { .. } => ErrorCode::InvalidInput,
            EngineError::DuplicatePage { .. } => ErrorCode::DuplicatePage,
            EngineError::InvalidRecord { .. } => ErrorCode::InvalidRecord,
            EngineError::MissingField { .. } => ErrorCode::MissingField,
            EngineError::CalibrationViolation { .. } => ErrorCode::CalibrationViolation,
            EngineError::TaskFailed { .. } => ErrorCode::TaskFailed,
            EngineError::Timeout { .. } => ErrorCode::Timeout,
            EngineError::Internal { .. } => ErrorCode::InternalError,
            EngineError::Configuration(_) => ErrorCode::ConfigurationError,
            EngineError::Serialization(_) => ErrorCode::SerializationError,
            EngineError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Input defects are answered with a `not_found` record rather than escalated
    pub fn is_input_defect(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput { .. } | EngineError::DuplicatePage { .. }
        )
    }
}
