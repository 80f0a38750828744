//! Configuration types for Tip Steward.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every field has a
//! default, so an empty file (or no file at all) yields a usable config.

use std::time::Duration;

use serde::Deserialize;

use crate::calculation::DEFAULT_DENOMINATIONS;

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// OCR engine settings.
    pub ocr: OcrConfig,
    /// Bill denominations available for payouts, in whole currency units.
    pub denominations: Vec<u32>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ocr: OcrConfig::default(),
            denominations: DEFAULT_DENOMINATIONS.to_vec(),
            log_format: LogFormat::Compact,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:5000`.
    pub bind: String,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// OCR settings shared by all engines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine strategy used when a request does not name one
    /// (`auto`, `azure`, `tesseract`, or a legacy alias).
    pub engine: String,
    /// Azure Document Intelligence settings.
    pub azure: AzureConfig,
    /// Local Tesseract settings.
    pub tesseract: TesseractConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: "auto".to_string(),
            azure: AzureConfig::default(),
            tesseract: TesseractConfig::default(),
        }
    }
}

/// Azure Document Intelligence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://myres.cognitiveservices.azure.com`.
    pub endpoint: Option<String>,
    /// Subscription key.
    pub api_key: Option<String>,
    /// Analysis model.
    pub model_id: String,
    /// REST API version.
    pub api_version: String,
    /// Delay before each poll of the analysis operation, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of polls before giving up.
    pub max_polls: u32,
    /// Retries of the analyze submission on transient failures.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds; doubles each retry.
    pub retry_initial_delay_ms: u64,
    /// Timeout of each individual HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl AzureConfig {
    /// Returns the fixed delay between polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the delay before the first retry.
    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether both endpoint and key are set to non-empty values.
    pub fn has_credentials(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.endpoint) && present(&self.api_key)
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model_id: "prebuilt-read".to_string(),
            api_version: "2024-02-29-preview".to_string(),
            poll_interval_ms: 1000,
            max_polls: 12,
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// Local Tesseract settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Path or name of the `tesseract` executable.
    pub binary: String,
    /// Recognition language(s), e.g. `eng`.
    pub language: String,
    /// Page segmentation mode; 6 treats the image as a uniform block of text.
    pub page_segmentation_mode: u8,
    /// Maximum run time of one recognition, in seconds.
    pub timeout_secs: u64,
    /// Whether to clean up the image before recognition.
    pub preprocess: bool,
}

impl TesseractConfig {
    /// Returns the maximum run time of one recognition.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            timeout_secs: 30,
            preprocess: true,
        }
    }
}

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    Compact,
    /// One JSON object per event.
    Json,
}
