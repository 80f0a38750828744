//! Local OCR through the `tesseract` command-line tool.
//!
//! The image is piped to `tesseract stdin stdout ... tsv` and the TSV word
//! table is folded back into lines, which also yields per-word confidences
//! that plain text output does not carry.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::TesseractConfig;
use crate::error::{StewardError, StewardResult};
use crate::models::{EngineKind, RecognizedText};

use super::engine::OcrEngine;
use super::preprocess::prepare_for_ocr;

/// TSV level of a single recognized word.
const WORD_LEVEL: &str = "5";

/// Tesseract invoked as a child process.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    config: TesseractConfig,
}

impl TesseractCli {
    /// Creates a runner for the configured binary.
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    async fn run(&self, image: Vec<u8>) -> StewardResult<String> {
        let psm = self.config.page_segmentation_mode.to_string();
        let mut child = tokio::process::Command::new(&self.config.binary)
            .args(["stdin", "stdout", "-l", self.config.language.as_str(), "--psm", psm.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StewardError::OcrUnavailable {
                    engine: EngineKind::Tesseract,
                    message: format!("'{}' was not found on PATH", self.config.binary),
                },
                _ => failed(format!("failed to start '{}': {}", self.config.binary, e)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&image).await {
                    debug!(error = %e, "Tesseract closed stdin early");
                }
            });
        }

        let result = tokio::time::timeout(self.config.timeout(), child.wait_with_output()).await;

        match result {
            Err(_) => Err(StewardError::OcrTimeout {
                engine: EngineKind::Tesseract,
                message: format!("no result after {}s", self.config.timeout_secs),
            }),
            Ok(Err(e)) => Err(failed(format!("failed to read output: {}", e))),
            Ok(Ok(out)) => {
                if out.status.success() {
                    Ok(String::from_utf8_lossy(&out.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    Err(failed(format!("exited with {}: {}", out.status, stderr.trim())))
                }
            }
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    async fn recognize(&self, image: &[u8]) -> StewardResult<RecognizedText> {
        let input = if self.config.preprocess {
            let bytes = image.to_vec();
            tokio::task::spawn_blocking(move || prepare_for_ocr(&bytes))
                .await
                .map_err(|e| failed(format!("preprocessing task failed: {}", e)))??
        } else {
            image.to_vec()
        };

        let tsv = self.run(input).await?;
        let recognized = parse_tsv(&tsv);

        if recognized.text.is_empty() {
            warn!("Tesseract recognized no text");
            return Ok(recognized);
        }

        info!(
            characters = recognized.text.len(),
            confidence = ?recognized.confidence,
            "Tesseract recognition complete"
        );
        Ok(recognized)
    }
}

fn failed(message: impl Into<String>) -> StewardError {
    StewardError::OcrFailed {
        engine: EngineKind::Tesseract,
        message: message.into(),
    }
}

/// Rebuilds text lines from Tesseract TSV output.
///
/// Words are grouped by page, block, paragraph and line number. Confidence
/// is the mean of the word confidences, ignoring the `-1` Tesseract reports
/// for non-word rows.
pub fn parse_tsv(tsv: &str) -> RecognizedText {
    let mut lines: Vec<((&str, &str, &str, &str), Vec<&str>)> = Vec::new();
    let mut confidence_sum = 0.0_f64;
    let mut word_count = 0_u32;

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != WORD_LEVEL {
            continue;
        }

        let word = columns[11].trim();
        if word.is_empty() {
            continue;
        }

        if let Ok(conf) = columns[10].trim().parse::<f64>() {
            if conf >= 0.0 {
                confidence_sum += conf;
                word_count += 1;
            }
        }

        let key = (columns[1], columns[2], columns[3], columns[4]);
        match lines.last_mut() {
            Some((last_key, words)) if *last_key == key => words.push(word),
            _ => lines.push((key, vec![word])),
        }
    }

    let text = lines
        .iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    let confidence = (word_count > 0)
        .then(|| (confidence_sum / f64::from(word_count)).round().clamp(0.0, 100.0) as u8);

    RecognizedText { text, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = vec![HEADER];
        out.extend_from_slice(rows);
        out.join("\n")
    }

    #[test]
    fn test_words_are_grouped_into_lines() {
        let input = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t10\t300\t20\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.5\tAvery",
            "5\t1\t1\t1\t1\t2\t80\t10\t90\t20\t93.5\tJohnson",
            "5\t1\t1\t1\t1\t3\t180\t10\t40\t20\t90\t32.5",
            "5\t1\t1\t1\t2\t1\t10\t40\t60\t20\t88\tBlake",
            "5\t1\t1\t1\t2\t2\t80\t40\t70\t20\t92\tRivera",
        ]);

        let result = parse_tsv(&input);
        assert_eq!(result.text, "Avery Johnson 32.5\nBlake Rivera");
        assert_eq!(result.confidence, Some(92));
    }

    #[test]
    fn test_negative_confidences_are_ignored() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t-1\t|",
            "5\t1\t1\t1\t1\t2\t0\t0\t10\t10\t80\tTotal",
        ]);

        let result = parse_tsv(&input);
        assert_eq!(result.text, "| Total");
        assert_eq!(result.confidence, Some(80));
    }

    #[test]
    fn test_blank_words_and_short_rows_are_skipped() {
        let input = tsv(&["5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t95\t   ", "garbage row"]);

        let result = parse_tsv(&input);
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = TesseractCli::new(TesseractConfig {
            binary: "tip-steward-no-such-tesseract".to_string(),
            preprocess: false,
            ..TesseractConfig::default()
        });

        let err = engine.recognize(b"image").await.unwrap_err();
        assert!(matches!(
            err,
            StewardError::OcrUnavailable {
                engine: EngineKind::Tesseract,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_upload_fails_before_spawning() {
        let engine = TesseractCli::new(TesseractConfig {
            binary: "tip-steward-no-such-tesseract".to_string(),
            ..TesseractConfig::default()
        });

        let err = engine.recognize(b"not an image").await.unwrap_err();
        assert!(matches!(err, StewardError::InvalidImage { .. }));
    }
}
