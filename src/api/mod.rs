//! HTTP API module for Tip Steward.
//!
//! This module provides the REST API endpoints for importing partner hours
//! from report photos and calculating tip distributions.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculateDistributionRequest, OcrQuery};
pub use response::{ApiError, ApiErrorResponse, HealthResponse, OcrResponse, TextResponse};
pub use state::AppState;
