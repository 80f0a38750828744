//! The OCR engine abstraction.

use async_trait::async_trait;

use crate::error::StewardResult;
use crate::models::{EngineKind, RecognizedText};

/// A backend that turns image bytes into text.
///
/// Implementations only recognize text; parsing the report and deciding
/// which engine to trust happens in [`OcrService`](super::OcrService).
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Recognizes the text in an encoded image (PNG, JPEG, ...).
    async fn recognize(&self, image: &[u8]) -> StewardResult<RecognizedText>;
}
