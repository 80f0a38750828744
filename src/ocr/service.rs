//! Engine selection and report extraction.
//!
//! [`OcrService`] owns a primary (cloud) and a fallback (local) engine and
//! turns an uploaded image into an [`OcrServiceResult`]. Engine failures are
//! folded into the result so callers always get a value to inspect.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::OcrConfig;
use crate::error::{StewardError, StewardResult};
use crate::models::{EngineKind, OcrServiceResult};
use crate::parsing::parse_hours_report;

use super::azure::AzureDocumentIntelligence;
use super::engine::OcrEngine;
use super::tesseract::TesseractCli;

/// Minimum primary confidence accepted in auto mode without trying the
/// fallback engine.
pub const AUTO_ACCEPT_CONFIDENCE: u8 = 15;

/// Error reported when an upload yields no partner records.
pub const NO_PARTNER_DATA_MESSAGE: &str = "Could not extract partner information from the image. \
     Please ensure the image is clear and shows the Tip Distribution Report table.";

/// Error reported when no engine returns any text.
pub const NO_TEXT_MESSAGE: &str = "No text could be extracted from the image";

/// Which engine(s) a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStrategy {
    /// Cloud first, local fallback when the cloud result is weak.
    Auto,
    /// Cloud engine only.
    Azure,
    /// Local engine only.
    Tesseract,
}

impl EngineStrategy {
    /// Maps a configured or requested engine name to a strategy.
    ///
    /// Names are case-insensitive. Legacy cloud engine names map to
    /// [`EngineStrategy::Azure`] with a warning; unknown names also map to
    /// Azure, logged as an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tip_steward::ocr::EngineStrategy;
    ///
    /// assert_eq!(EngineStrategy::normalize(" Local "), EngineStrategy::Tesseract);
    /// assert_eq!(EngineStrategy::normalize("mindee"), EngineStrategy::Azure);
    /// assert_eq!(EngineStrategy::normalize("AUTO"), EngineStrategy::Auto);
    /// ```
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "auto" => EngineStrategy::Auto,
            "azure" => EngineStrategy::Azure,
            "azure_document_intelligence" | "azure-document-intelligence" | "mindee" | "deepseek"
            | "cloud" => {
                warn!(engine = raw, "Normalizing legacy OCR engine name to 'azure'");
                EngineStrategy::Azure
            }
            "tesseract" | "local" => EngineStrategy::Tesseract,
            _ => {
                error!(engine = raw, "Unrecognized OCR engine, defaulting to 'azure'");
                EngineStrategy::Azure
            }
        }
    }

    /// The canonical name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStrategy::Auto => "auto",
            EngineStrategy::Azure => "azure",
            EngineStrategy::Tesseract => "tesseract",
        }
    }
}

impl fmt::Display for EngineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineStrategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

/// Runs OCR engines according to an [`EngineStrategy`].
pub struct OcrService {
    primary: Arc<dyn OcrEngine>,
    fallback: Arc<dyn OcrEngine>,
    default_strategy: EngineStrategy,
}

impl OcrService {
    /// Creates a service from explicit engines.
    pub fn new(
        primary: Arc<dyn OcrEngine>,
        fallback: Arc<dyn OcrEngine>,
        default_strategy: EngineStrategy,
    ) -> Self {
        Self {
            primary,
            fallback,
            default_strategy,
        }
    }

    /// Builds the Azure and Tesseract engines from configuration.
    pub fn from_config(config: &OcrConfig) -> StewardResult<Self> {
        if !config.azure.has_credentials() {
            warn!("Azure Document Intelligence credentials are not configured; cloud OCR will fail");
        }

        let primary = AzureDocumentIntelligence::new(config.azure.clone())?;
        let fallback = TesseractCli::new(config.tesseract.clone());

        Ok(Self::new(
            Arc::new(primary),
            Arc::new(fallback),
            EngineStrategy::normalize(&config.engine),
        ))
    }

    /// The strategy used when a request does not name one.
    pub fn default_strategy(&self) -> EngineStrategy {
        self.default_strategy
    }

    /// Runs OCR and report parsing; never fails.
    pub async fn analyze(&self, image: &[u8], strategy: Option<EngineStrategy>) -> OcrServiceResult {
        let strategy = strategy.unwrap_or(self.default_strategy);
        info!(strategy = %strategy, bytes = image.len(), "Starting OCR analysis");

        match strategy {
            EngineStrategy::Azure => self.try_engine(self.primary.as_ref(), image).await,
            EngineStrategy::Tesseract => self.try_engine(self.fallback.as_ref(), image).await,
            EngineStrategy::Auto => self.auto(image).await,
        }
    }

    /// Like [`OcrService::analyze`], but guarantees an error message when
    /// no partner records were extracted.
    pub async fn analyze_image(
        &self,
        image: &[u8],
        strategy: Option<EngineStrategy>,
    ) -> OcrServiceResult {
        let mut result = self.analyze(image, strategy).await;
        if !result.has_partners() && result.error.is_none() {
            result.error = Some(NO_PARTNER_DATA_MESSAGE.to_string());
        }
        result
    }

    /// Returns raw text from the primary engine, or the fallback when the
    /// primary yields nothing.
    pub async fn extract_text(&self, image: &[u8]) -> StewardResult<String> {
        for engine in [&self.primary, &self.fallback] {
            match engine.recognize(image).await {
                Ok(recognized) if !recognized.text.trim().is_empty() => {
                    return Ok(recognized.text.trim().to_string());
                }
                Ok(_) => warn!(engine = %engine.kind(), "OCR engine returned no text"),
                Err(e) => warn!(engine = %engine.kind(), error = %e, "Text extraction failed"),
            }
        }

        Err(StewardError::OcrFailed {
            engine: self.fallback.kind(),
            message: NO_TEXT_MESSAGE.to_string(),
        })
    }

    async fn auto(&self, image: &[u8]) -> OcrServiceResult {
        let primary = self.try_engine(self.primary.as_ref(), image).await;
        if primary.has_partners() && primary.confidence >= AUTO_ACCEPT_CONFIDENCE {
            info!(confidence = primary.confidence, "Auto mode accepted primary engine");
            return primary;
        }

        info!(
            confidence = primary.confidence,
            "Auto mode primary result weak, trying fallback engine"
        );
        let fallback = self.try_engine(self.fallback.as_ref(), image).await;

        if fallback.confidence > primary.confidence {
            info!(confidence = fallback.confidence, "Auto mode chose fallback engine");
            fallback
        } else {
            info!(confidence = primary.confidence, "Auto mode kept primary engine");
            primary
        }
    }

    async fn try_engine(&self, engine: &dyn OcrEngine, image: &[u8]) -> OcrServiceResult {
        let kind = engine.kind();
        let start = Instant::now();

        let recognized = match engine.recognize(image).await {
            Ok(recognized) => recognized,
            Err(e) => {
                warn!(engine = %kind, error = %e, "OCR attempt failed");
                return OcrServiceResult::failure(
                    kind,
                    format!("{} exception: {}", display_name(kind), failure_detail(&e)),
                );
            }
        };

        let text = recognized.text.trim().to_string();
        if text.is_empty() {
            return OcrServiceResult::failure(
                kind,
                format!("{} OCR returned no text", display_name(kind)),
            );
        }

        let report = parse_hours_report(&text);
        let confidence = match kind {
            EngineKind::Azure => report.confidence,
            EngineKind::Tesseract => {
                combine_confidence(recognized.confidence.unwrap_or(0), report.confidence)
            }
        };

        info!(
            engine = %kind,
            partners = report.partners.len(),
            confidence,
            duration_us = start.elapsed().as_micros() as u64,
            "OCR attempt complete"
        );

        let error = report.partners.is_empty().then(|| {
            format!("No partners found in {} OCR text", display_name(kind))
        });

        OcrServiceResult {
            text: Some(text),
            partner_data: report.partners,
            confidence,
            engine: kind,
            error,
        }
    }
}

fn display_name(kind: EngineKind) -> &'static str {
    match kind {
        EngineKind::Azure => "Azure",
        EngineKind::Tesseract => "Tesseract",
    }
}

/// The engine's own description of a failure, without the variant prefix.
fn failure_detail(error: &StewardError) -> String {
    match error {
        StewardError::OcrFailed { message, .. }
        | StewardError::OcrUnavailable { message, .. }
        | StewardError::OcrTimeout { message, .. }
        | StewardError::InvalidImage { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Averages engine and parser confidence, rounding half up.
fn combine_confidence(ocr: u8, parse: u8) -> u8 {
    let sum = u16::from(ocr) + u16::from(parse);
    ((sum + 1) / 2).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecognizedText;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    const REPORT: &str = "\
Tip Distribution Report
Home Store: 69600
Time Period: 10/07/2024 - 10/13/2024
Home Store | Partner Name | Partner Number | Total Tippable Hours
69600 | Johnson, Avery | US1234567 | 32.50
69600 | Rivera, Blake | US2345678 | 18.25
69600 | Nguyen, Casey | US3456789 | 40.00
Total Tippable Hours: 90.75
Executed By: Store Manager";

    struct FakeEngine {
        kind: EngineKind,
        outcome: Result<RecognizedText, String>,
        calls: AtomicU32,
    }

    impl FakeEngine {
        fn text(kind: EngineKind, text: &str, confidence: Option<u8>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: Ok(RecognizedText {
                    text: text.to_string(),
                    confidence,
                }),
                calls: AtomicU32::new(0),
            })
        }

        fn failing(kind: EngineKind, message: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: Err(message.to_string()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OcrEngine for FakeEngine {
        fn kind(&self) -> EngineKind {
            self.kind
        }

        async fn recognize(&self, _image: &[u8]) -> StewardResult<RecognizedText> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map_err(|message| StewardError::OcrFailed {
                engine: self.kind,
                message,
            })
        }
    }

    fn service(primary: Arc<FakeEngine>, fallback: Arc<FakeEngine>) -> OcrService {
        OcrService::new(primary, fallback, EngineStrategy::Auto)
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(EngineStrategy::normalize("azure"), EngineStrategy::Azure);
        assert_eq!(
            EngineStrategy::normalize("Azure-Document-Intelligence"),
            EngineStrategy::Azure
        );
        assert_eq!(EngineStrategy::normalize("deepseek"), EngineStrategy::Azure);
        assert_eq!(EngineStrategy::normalize("cloud"), EngineStrategy::Azure);
        assert_eq!(EngineStrategy::normalize("tesseract"), EngineStrategy::Tesseract);
        assert_eq!(EngineStrategy::normalize("something-else"), EngineStrategy::Azure);
        assert_eq!("local".parse::<EngineStrategy>().unwrap(), EngineStrategy::Tesseract);
    }

    #[test]
    fn test_combine_confidence_rounds_half_up() {
        assert_eq!(combine_confidence(90, 100), 95);
        assert_eq!(combine_confidence(0, 85), 43);
        assert_eq!(combine_confidence(100, 100), 100);
    }

    #[tokio::test]
    async fn test_auto_accepts_confident_primary() {
        let primary = FakeEngine::text(EngineKind::Azure, REPORT, Some(99));
        let fallback = FakeEngine::text(EngineKind::Tesseract, REPORT, Some(99));
        let ocr = service(primary.clone(), fallback.clone());

        let result = ocr.analyze(b"img", None).await;

        assert_eq!(result.engine, EngineKind::Azure);
        assert_eq!(result.partner_data.len(), 3);
        assert!(result.error.is_none());
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_auto_falls_back_when_primary_fails() {
        let primary = FakeEngine::failing(EngineKind::Azure, "credentials are not configured");
        let fallback = FakeEngine::text(EngineKind::Tesseract, REPORT, Some(80));
        let ocr = service(primary.clone(), fallback.clone());

        let result = ocr.analyze(b"img", None).await;

        assert_eq!(result.engine, EngineKind::Tesseract);
        assert_eq!(result.partner_data.len(), 3);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_auto_keeps_primary_on_tie() {
        let primary = FakeEngine::failing(EngineKind::Azure, "timed out");
        let fallback = FakeEngine::failing(EngineKind::Tesseract, "not installed");
        let ocr = service(primary, fallback.clone());

        let result = ocr.analyze(b"img", None).await;

        assert_eq!(fallback.calls(), 1);
        assert_eq!(result.engine, EngineKind::Azure);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.error.as_deref(), Some("Azure exception: timed out"));
    }

    #[tokio::test]
    async fn test_explicit_strategy_uses_one_engine() {
        let primary = FakeEngine::text(EngineKind::Azure, REPORT, None);
        let fallback = FakeEngine::text(EngineKind::Tesseract, REPORT, Some(90));
        let ocr = service(primary.clone(), fallback.clone());

        let result = ocr.analyze(b"img", Some(EngineStrategy::Tesseract)).await;

        assert_eq!(result.engine, EngineKind::Tesseract);
        assert_eq!(primary.calls(), 0);
        // parser confidence 100 averaged with the engine's 90
        assert_eq!(result.confidence, 95);
    }

    #[tokio::test]
    async fn test_text_without_partners_reports_engine() {
        let primary = FakeEngine::text(EngineKind::Azure, "Weekly schedule\nNothing here", None);
        let fallback = FakeEngine::failing(EngineKind::Tesseract, "not installed");
        let ocr = service(primary, fallback);

        let result = ocr.analyze(b"img", Some(EngineStrategy::Azure)).await;

        assert!(!result.has_partners());
        assert!(result.text.is_some());
        assert_eq!(result.error.as_deref(), Some("No partners found in Azure OCR text"));
    }

    #[tokio::test]
    async fn test_analyze_image_keeps_engine_error() {
        let primary = FakeEngine::text(EngineKind::Azure, "   ", None);
        let fallback = FakeEngine::text(EngineKind::Tesseract, "", None);
        let ocr = service(primary, fallback);

        let result = ocr.analyze_image(b"img", Some(EngineStrategy::Azure)).await;
        assert!(!result.has_partners());
        assert_eq!(result.error.as_deref(), Some("Azure OCR returned no text"));
    }

    #[tokio::test]
    async fn test_empty_local_result_reports_no_text() {
        let primary = FakeEngine::failing(EngineKind::Azure, "not configured");
        let fallback = FakeEngine::text(EngineKind::Tesseract, "", Some(0));
        let ocr = service(primary, fallback);

        let result = ocr.analyze(b"img", Some(EngineStrategy::Tesseract)).await;
        assert_eq!(result.error.as_deref(), Some("Tesseract OCR returned no text"));
    }

    #[tokio::test]
    async fn test_extract_text_falls_back() {
        let primary = FakeEngine::failing(EngineKind::Azure, "down");
        let fallback = FakeEngine::text(EngineKind::Tesseract, "  hello  ", Some(70));
        let ocr = service(primary, fallback);

        assert_eq!(ocr.extract_text(b"img").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_extract_text_reports_when_nothing_read() {
        let primary = FakeEngine::text(EngineKind::Azure, "", None);
        let fallback = FakeEngine::failing(EngineKind::Tesseract, "down");
        let ocr = service(primary, fallback);

        let err = ocr.extract_text(b"img").await.unwrap_err();
        assert!(err.to_string().contains(NO_TEXT_MESSAGE));
    }
}
