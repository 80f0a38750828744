//! Error types for Tip Steward.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while importing hours reports
//! and calculating tip distributions.

use thiserror::Error;

use crate::models::EngineKind;

/// The main error type for Tip Steward.
///
/// # Example
///
/// ```
/// use tip_steward::error::StewardError;
///
/// let error = StewardError::ConfigNotFound {
///     path: "/missing/tip-steward.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/tip-steward.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum StewardError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value was present but unusable.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The configuration key.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A distribution request contained inconsistent data.
    #[error("Invalid distribution field '{field}': {message}")]
    InvalidDistribution {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The uploaded image could not be decoded or re-encoded.
    #[error("Invalid image: {message}")]
    InvalidImage {
        /// A description of the decoding failure.
        message: String,
    },

    /// The OCR engine cannot be used (missing credentials, missing binary).
    #[error("{engine} OCR is unavailable: {message}")]
    OcrUnavailable {
        /// The engine that is unavailable.
        engine: EngineKind,
        /// Why the engine cannot be used.
        message: String,
    },

    /// The OCR engine was reached but the recognition failed.
    #[error("{engine} OCR failed: {message}")]
    OcrFailed {
        /// The engine that failed.
        engine: EngineKind,
        /// A description of the failure.
        message: String,
    },

    /// The OCR engine did not finish in time.
    #[error("{engine} OCR timed out: {message}")]
    OcrTimeout {
        /// The engine that timed out.
        engine: EngineKind,
        /// A description of the limit that was hit.
        message: String,
    },
}

/// A type alias for Results that return StewardError.
pub type StewardResult<T> = Result<T, StewardError>;
