//! OCR engines and the service that chooses between them.
//!
//! - [`AzureDocumentIntelligence`]: cloud layout analysis (primary)
//! - [`TesseractCli`]: local command-line OCR (fallback)
//! - [`OcrService`]: strategy selection and report parsing

mod azure;
mod engine;
mod preprocess;
mod retry;
mod service;
mod tesseract;

pub use azure::AzureDocumentIntelligence;
pub use engine::OcrEngine;
pub use preprocess::{MAX_LONG_SIDE, MIN_SHORT_SIDE, is_supported_image, prepare_for_ocr};
pub use retry::{Attempt, Backoff};
pub use service::{
    AUTO_ACCEPT_CONFIDENCE, EngineStrategy, NO_PARTNER_DATA_MESSAGE, NO_TEXT_MESSAGE, OcrService,
};
pub use tesseract::{TesseractCli, parse_tsv};
