//! Azure Document Intelligence client.
//!
//! Analysis is asynchronous on the service side: the image is submitted to
//! the `:analyze` endpoint, which answers `202 Accepted` with an
//! `operation-location` header, and the operation is then polled at a fixed
//! interval until it succeeds, fails, or the poll budget runs out.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AzureConfig;
use crate::error::{StewardError, StewardResult};
use crate::models::{EngineKind, RecognizedText};

use super::engine::OcrEngine;
use super::retry::{Attempt, Backoff};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "operation-location";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    status: Option<String>,
    analyze_result: Option<AnalyzeResult>,
    error: Option<ServiceError>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeResult {
    content: Option<String>,
    paragraphs: Option<Vec<Paragraph>>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ServiceError>,
}

/// Cloud OCR through the Azure Document Intelligence REST API.
#[derive(Debug, Clone)]
pub struct AzureDocumentIntelligence {
    client: reqwest::Client,
    config: AzureConfig,
}

impl AzureDocumentIntelligence {
    /// Creates a client with its own connection pool.
    pub fn new(config: AzureConfig) -> StewardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StewardError::OcrUnavailable {
                engine: EngineKind::Azure,
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a client sharing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, config: AzureConfig) -> Self {
        Self { client, config }
    }

    fn credentials(&self) -> StewardResult<(&str, &str)> {
        match (self.config.endpoint.as_deref(), self.config.api_key.as_deref()) {
            (Some(endpoint), Some(key)) if !endpoint.trim().is_empty() && !key.trim().is_empty() => {
                Ok((endpoint.trim(), key.trim()))
            }
            _ => Err(StewardError::OcrUnavailable {
                engine: EngineKind::Azure,
                message: "Azure Document Intelligence credentials are not configured".to_string(),
            }),
        }
    }

    /// Submits the image and returns the absolute operation URL to poll.
    async fn submit(&self, endpoint: &str, key: &str, image: &[u8]) -> StewardResult<Url> {
        let url = analyze_url(endpoint, &self.config.model_id, &self.config.api_version);
        let backoff = Backoff::new(self.config.max_retries, self.config.retry_initial_delay());

        let location = backoff
            .run(|attempt| {
                let url = url.clone();
                async move {
                    debug!(attempt, url = %url, "Submitting image for analysis");
                    let sent = self
                        .client
                        .post(&url)
                        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                        .header(SUBSCRIPTION_KEY_HEADER, key)
                        .body(image.to_vec())
                        .send()
                        .await;
                    let response = match sent {
                        Ok(response) => response,
                        Err(e) => {
                            return Err(Attempt::Retry(failed(format!(
                                "analyze request failed: {}",
                                e
                            ))));
                        }
                    };

                    let status = response.status();
                    if status != StatusCode::ACCEPTED {
                        let message = error_message(response)
                            .await
                            .unwrap_or_else(|| format!("analyze call failed ({})", status));
                        let err = failed(message);
                        return Err(if is_transient(status) {
                            Attempt::Retry(err)
                        } else {
                            Attempt::Abort(err)
                        });
                    }

                    response
                        .headers()
                        .get(OPERATION_LOCATION_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            Attempt::Abort(failed("service did not return an operation location"))
                        })
                }
            })
            .await?;

        resolve_location(endpoint, &location)
    }

    /// Polls the operation until it reaches a terminal state.
    async fn poll(&self, operation: &Url, key: &str) -> StewardResult<AnalyzeResult> {
        let max_polls = self.config.max_polls;

        for attempt in 1..=max_polls {
            tokio::time::sleep(self.config.poll_interval()).await;

            let response = self
                .client
                .get(operation.clone())
                .header(SUBSCRIPTION_KEY_HEADER, key)
                .send()
                .await
                .map_err(|e| failed(format!("polling request failed: {}", e)))?;

            let status = response.status();
            let body: Option<AnalyzeResponse> = response.json().await.ok();

            if !status.is_success() {
                let message = body
                    .and_then(|b| b.error)
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| format!("polling failed ({})", status));
                return Err(failed(message));
            }

            let body = body.unwrap_or_default();
            match body.status.as_deref() {
                Some("succeeded") => {
                    debug!(attempt, "Analysis succeeded");
                    return Ok(body.analyze_result.unwrap_or_default());
                }
                Some("failed") => {
                    let message = body
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "analysis failed".to_string());
                    return Err(failed(message));
                }
                other => {
                    debug!(attempt, status = ?other, "Analysis still running");
                }
            }
        }

        Err(StewardError::OcrTimeout {
            engine: EngineKind::Azure,
            message: format!("analysis did not complete after {} polls", max_polls),
        })
    }
}

#[async_trait]
impl OcrEngine for AzureDocumentIntelligence {
    fn kind(&self) -> EngineKind {
        EngineKind::Azure
    }

    async fn recognize(&self, image: &[u8]) -> StewardResult<RecognizedText> {
        let (endpoint, key) = self.credentials()?;

        let operation = self.submit(endpoint, key, image).await?;
        let result = self.poll(&operation, key).await?;

        let text = result.content.as_deref().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            warn!("Azure analysis returned no text content");
            return Err(failed("returned no text content"));
        }

        let confidence = calculate_confidence(&result);
        info!(
            characters = text.len(),
            confidence, "Azure Document Intelligence analysis complete"
        );

        Ok(RecognizedText {
            text,
            confidence: Some(confidence),
        })
    }
}

fn failed(message: impl Into<String>) -> StewardError {
    StewardError::OcrFailed {
        engine: EngineKind::Azure,
        message: message.into(),
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

async fn error_message(response: reqwest::Response) -> Option<String> {
    response
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
}

fn analyze_url(endpoint: &str, model_id: &str, api_version: &str) -> String {
    format!(
        "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
        endpoint.trim_end_matches('/'),
        model_id,
        api_version
    )
}

/// Resolves an `operation-location` header against the resource endpoint.
///
/// Absolute locations are used as-is; relative ones are appended to the
/// endpoint, keeping any path prefix the endpoint carries.
fn resolve_location(endpoint: &str, location: &str) -> StewardResult<Url> {
    let invalid = |e: url::ParseError| failed(format!("invalid operation location '{}': {}", location, e));

    if location.starts_with("http://") || location.starts_with("https://") {
        return Url::parse(location).map_err(invalid);
    }

    let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/'))).map_err(invalid)?;
    base.join(location.trim_start_matches('/')).map_err(invalid)
}

/// Scores the analysis from the paragraph confidences.
///
/// Without paragraphs the score defaults to 75, and to 80 when paragraphs
/// exist but carry no confidence. Scores on a 0-1 scale are scaled to 0-100.
fn calculate_confidence(result: &AnalyzeResult) -> u8 {
    let paragraphs = match result.paragraphs.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return 75,
    };

    let confidences: Vec<f64> = paragraphs.iter().filter_map(|p| p.confidence).collect();
    if confidences.is_empty() {
        return 80;
    }

    let average = confidences.iter().sum::<f64>() / confidences.len() as f64;
    let scaled = if average <= 1.0 { average * 100.0 } else { average };
    scaled.round().clamp(0.0, 100.0) as u8
}
