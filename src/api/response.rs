//! Response types for the Tip Steward API.
//!
//! This module defines the success bodies of the OCR and health endpoints
//! and the error response structures shared by all handlers.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::StewardError;
use crate::models::{EngineKind, PartnerHours};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an error for an upload without an image part.
    pub fn missing_image() -> Self {
        Self::with_details(
            "MISSING_IMAGE",
            "No image uploaded",
            "Send the report photo as a multipart file field named 'image'",
        )
    }

    /// Creates an error for an upload that is not a supported image.
    pub fn unsupported_file(content_type: &str) -> Self {
        Self::with_details(
            "UNSUPPORTED_FILE",
            format!("Unsupported file type: {}", content_type),
            "Only PNG and JPEG images are accepted",
        )
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Pairs an error body with a status code.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<StewardError> for ApiErrorResponse {
    fn from(error: StewardError) -> Self {
        let message = error.to_string();
        match error {
            StewardError::ConfigNotFound { .. }
            | StewardError::ConfigParseError { .. }
            | StewardError::InvalidConfig { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            StewardError::InvalidDistribution { field, .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_DISTRIBUTION",
                    message,
                    format!("Check the '{}' value and try again", field),
                ),
            ),
            StewardError::InvalidImage { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_IMAGE",
                    "The uploaded image could not be read",
                    message,
                ),
            ),
            StewardError::OcrUnavailable { .. } => ApiErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::with_details("OCR_UNAVAILABLE", "OCR is unavailable", message),
            ),
            StewardError::OcrFailed { .. } => ApiErrorResponse::new(
                StatusCode::BAD_GATEWAY,
                ApiError::with_details("OCR_FAILED", "OCR failed", message),
            ),
            StewardError::OcrTimeout { .. } => ApiErrorResponse::new(
                StatusCode::GATEWAY_TIMEOUT,
                ApiError::with_details("OCR_TIMEOUT", "OCR timed out", message),
            ),
        }
    }
}

/// Body of a successful `POST /api/ocr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    /// The text the engine recognized.
    pub extracted_text: String,
    /// Partner records parsed from the text.
    pub partner_hours: Vec<PartnerHours>,
    /// The engine whose result was used.
    pub engine: EngineKind,
    /// Confidence on a 0-100 scale.
    pub confidence: u8,
}

/// Body of a successful `POST /api/ocr/text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponse {
    /// The raw recognized text.
    pub extracted_text: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Crate version.
    pub version: String,
}
