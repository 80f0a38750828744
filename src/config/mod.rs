//! Configuration loading and management for Tip Steward.
//!
//! This module provides functionality to load the service configuration from
//! an optional YAML file layered with environment variables: server binding,
//! OCR engine selection and credentials, and the bill denominations used
//! for cash payouts.
//!
//! # Example
//!
//! ```no_run
//! use tip_steward::config::ConfigLoader;
//!
//! let config = ConfigLoader::from_env().unwrap();
//! println!("OCR strategy: {}", config.config().ocr.engine);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, AzureConfig, LogFormat, OcrConfig, ServerConfig, TesseractConfig};
