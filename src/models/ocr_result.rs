//! OCR result models.
//!
//! These values are transient: they live for the duration of one upload
//! request and are never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PartnerHours;

/// The OCR engine that produced a result.
///
/// # Example
///
/// ```
/// use tip_steward::models::EngineKind;
///
/// assert_eq!(EngineKind::Azure.to_string(), "azure");
/// assert_eq!(EngineKind::Tesseract.as_str(), "tesseract");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Azure Document Intelligence (cloud).
    Azure,
    /// Tesseract command-line OCR (local).
    Tesseract,
}

impl EngineKind {
    /// The wire name of the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Azure => "azure",
            EngineKind::Tesseract => "tesseract",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text returned by an OCR engine before any report parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText {
    /// The recognized text, lines separated by `\n`.
    pub text: String,
    /// Engine-reported confidence on a 0-100 scale, when it reports one.
    pub confidence: Option<u8>,
}

/// The outcome of one OCR attempt, successful or not.
///
/// Engine failures are carried in `error` rather than propagated, so the
/// selection logic can compare attempts side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrServiceResult {
    /// Recognized text, absent when the engine produced nothing.
    pub text: Option<String>,
    /// Partner records parsed from the text.
    pub partner_data: Vec<PartnerHours>,
    /// Confidence on a 0-100 scale.
    pub confidence: u8,
    /// The engine that produced this result.
    pub engine: EngineKind,
    /// Why the attempt did not yield partner data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrServiceResult {
    /// A failed attempt with no text.
    pub fn failure(engine: EngineKind, error: impl Into<String>) -> Self {
        Self {
            text: None,
            partner_data: Vec::new(),
            confidence: 0,
            engine,
            error: Some(error.into()),
        }
    }

    /// Whether the attempt produced at least one partner record.
    pub fn has_partners(&self) -> bool {
        !self.partner_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_no_text_and_zero_confidence() {
        let result = OcrServiceResult::failure(EngineKind::Azure, "boom");
        assert!(result.text.is_none());
        assert!(!result.has_partners());
        assert_eq!(result.confidence, 0);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_engine_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EngineKind::Tesseract).unwrap();
        assert_eq!(json, "\"tesseract\"");
    }
}
