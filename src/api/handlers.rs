//! HTTP request handlers for the Tip Steward API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{DistributionInput, calculate_distribution};
use crate::ocr::{EngineStrategy, NO_PARTNER_DATA_MESSAGE, is_supported_image};

use super::request::{CalculateDistributionRequest, OcrQuery};
use super::response::{ApiError, ApiErrorResponse, HealthResponse, OcrResponse, TextResponse};
use super::state::AppState;

/// Name of the multipart field carrying the report photo.
const IMAGE_FIELD: &str = "image";

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config().server.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/ocr", post(ocr_handler))
        .route("/api/ocr/text", post(ocr_text_handler))
        .route("/api/distributions/calculate", post(calculate_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

/// Handler for GET /api/health.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler for POST /api/ocr.
///
/// Runs OCR on the uploaded report photo and returns the partner hours
/// found in it.
async fn ocr_handler(
    State(state): State<AppState>,
    Query(query): Query<OcrQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing OCR request");

    let image = match read_image(multipart, correlation_id).await {
        Ok(image) => image,
        Err(err) => return err.into_response(),
    };

    let strategy = query
        .engine
        .as_deref()
        .filter(|engine| !engine.trim().is_empty())
        .map(EngineStrategy::normalize);

    let start_time = Instant::now();
    let result = state.ocr().analyze_image(&image, strategy).await;
    let duration = start_time.elapsed();

    if !result.has_partners() {
        let details = result
            .error
            .unwrap_or_else(|| NO_PARTNER_DATA_MESSAGE.to_string());
        warn!(
            correlation_id = %correlation_id,
            engine = %result.engine,
            confidence = result.confidence,
            error = %details,
            duration_us = duration.as_micros() as u64,
            "No partner data extracted"
        );
        return ApiErrorResponse::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::with_details("NO_PARTNER_DATA", NO_PARTNER_DATA_MESSAGE, details),
        )
        .into_response();
    }

    info!(
        correlation_id = %correlation_id,
        engine = %result.engine,
        partners = result.partner_data.len(),
        confidence = result.confidence,
        duration_us = duration.as_micros() as u64,
        "OCR completed successfully"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(OcrResponse {
            extracted_text: result.text.unwrap_or_default(),
            partner_hours: result.partner_data,
            engine: result.engine,
            confidence: result.confidence,
        }),
    )
        .into_response()
}

/// Handler for POST /api/ocr/text.
///
/// Returns the raw recognized text without report parsing.
async fn ocr_text_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing text extraction request");

    let image = match read_image(multipart, correlation_id).await {
        Ok(image) => image,
        Err(err) => return err.into_response(),
    };

    match state.ocr().extract_text(&image).await {
        Ok(text) => {
            info!(
                correlation_id = %correlation_id,
                characters = text.len(),
                "Text extraction completed"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(TextResponse {
                    extracted_text: text,
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Text extraction failed");
            ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "NO_TEXT",
                    "No text could be extracted from the image",
                    err.to_string(),
                ),
            )
            .into_response()
        }
    }
}

/// Handler for POST /api/distributions/calculate.
///
/// Accepts partner hours and a tip pool and returns each partner's payout.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateDistributionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing distribution request");

    // Handle JSON parsing errors
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    // Get the body text which contains the detailed error from serde
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return ApiErrorResponse::new(StatusCode::BAD_REQUEST, error).into_response();
        }
    };

    let input: DistributionInput = request.into();
    let partners = input.partners.len();

    let start_time = Instant::now();
    match calculate_distribution(&input, &state.config().denominations) {
        Ok(result) => {
            let duration = start_time.elapsed();
            info!(
                correlation_id = %correlation_id,
                partners,
                total_amount = %result.total_amount,
                hourly_rate = %result.hourly_rate,
                total_rounded = %result.total_rounded,
                duration_us = duration.as_micros() as u64,
                "Distribution calculated successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(result),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Distribution calculation failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Pulls the report photo out of a multipart upload.
///
/// The part named `image` is preferred; otherwise the first file part is
/// used. Parts with a non-image content type are rejected, as are parts
/// without a content type that do not look like PNG or JPEG data.
async fn read_image(
    multipart: Result<Multipart, MultipartRejection>,
    correlation_id: Uuid,
) -> Result<Vec<u8>, ApiErrorResponse> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!(
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "Multipart rejection"
        );
        ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::with_details(
                "INVALID_MULTIPART",
                "Request must be multipart/form-data",
                rejection.body_text(),
            ),
        )
    })?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| multipart_error(err, correlation_id))?;

        let Some(field) = field else {
            warn!(correlation_id = %correlation_id, "Upload has no image part");
            return Err(ApiErrorResponse::new(StatusCode::BAD_REQUEST, ApiError::missing_image()));
        };

        if field.name() != Some(IMAGE_FIELD) && field.file_name().is_none() {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        if let Some(content_type) = &content_type {
            if !content_type.starts_with("image/") {
                warn!(
                    correlation_id = %correlation_id,
                    content_type = %content_type,
                    "Unsupported upload type"
                );
                return Err(ApiErrorResponse::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    ApiError::unsupported_file(content_type),
                ));
            }
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|err| multipart_error(err, correlation_id))?;

        if bytes.is_empty() {
            return Err(ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("EMPTY_IMAGE", "The uploaded image is empty"),
            ));
        }

        if content_type.is_none() && !is_supported_image(&bytes) {
            return Err(ApiErrorResponse::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ApiError::unsupported_file("unknown"),
            ));
        }

        info!(correlation_id = %correlation_id, bytes = bytes.len(), "Received upload");
        return Ok(bytes.to_vec());
    }
}

fn multipart_error(err: MultipartError, correlation_id: Uuid) -> ApiErrorResponse {
    let status = err.status();
    let body_text = err.body_text();
    warn!(
        correlation_id = %correlation_id,
        status = %status,
        error = %body_text,
        "Multipart read failed"
    );

    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "PAYLOAD_TOO_LARGE"
    } else {
        "INVALID_MULTIPART"
    };
    ApiErrorResponse::new(
        status,
        ApiError::with_details(code, "Failed to read the upload", body_text),
    )
}
