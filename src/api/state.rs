//! Application state for the Tip Steward API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::StewardResult;
use crate::ocr::OcrService;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded configuration and the OCR service with its engines.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    ocr: Arc<OcrService>,
}

impl AppState {
    /// Creates a new application state from its parts.
    pub fn new(config: AppConfig, ocr: OcrService) -> Self {
        Self {
            config: Arc::new(config),
            ocr: Arc::new(ocr),
        }
    }

    /// Creates the state with the engines described by `config`.
    pub fn from_config(config: AppConfig) -> StewardResult<Self> {
        let ocr = OcrService::from_config(&config.ocr)?;
        Ok(Self::new(config, ocr))
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the OCR service.
    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }
}
