//! Analysis client: talks to the external résumé analysis service.
//!
//! The service is flaky under load, so every call goes through a
//! `RetryPolicy`: exponential backoff (1s, 2s, 4s, ...) bounded by both a
//! maximum attempt count and a maximum total wait, as configured by the user.
//!
//! Handlers depend on the `AnalysisBackend` trait, carried in `AppState` as
//! `Arc<dyn AnalysisBackend>`, so tests can swap in a stub.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::analysis::{
    parse_analysis, parse_cover_letters, Analysis, AnalysisEnvelope, CoverLetters,
};

const ANALYZE_PATH: &str = "/api/analyze";
const COVER_LETTER_PATH: &str = "/api/generate-cover-letter";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analysis service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not parse analysis payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Analysis service unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Input shared by analysis and cover-letter generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub job_description: String,
    pub resume_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_elapsed: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` when the budget is spent.
    /// `attempts_made` counts attempts already sent (at least 1).
    pub fn next_delay(&self, attempts_made: u32, elapsed: Duration) -> Option<Duration> {
        if attempts_made >= self.max_attempts {
            return None;
        }
        let delay = BASE_DELAY.saturating_mul(2u32.saturating_pow(attempts_made.saturating_sub(1)));
        (elapsed.saturating_add(delay) <= self.max_elapsed).then_some(delay)
    }
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, AnalysisError>;

    async fn generate_cover_letter(
        &self,
        request: &AnalysisRequest,
    ) -> Result<CoverLetters, AnalysisError>;
}

/// FastAPI error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ServiceError {
    detail: String,
}

#[derive(Clone)]
pub struct HttpAnalysisBackend {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// POSTs `request` as JSON and returns the raw response body.
    /// Retries on 429, 5xx and transport errors within the retry policy.
    async fn post_with_retry(
        &self,
        path: &str,
        request: &AnalysisRequest,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}{path}", self.base_url);
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let last_error = match self.client.post(&url).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!("Analysis service call to {path} succeeded after {attempts} attempt(s)");
                        return Ok(response.text().await?);
                    }

                    let body = response.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ServiceError>(&body)
                        .map(|e| e.detail)
                        .unwrap_or(body);
                    let error = AnalysisError::Api {
                        status: status.as_u16(),
                        message,
                    };
                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) => AnalysisError::Http(e),
            };

            match self.retry.next_delay(attempts, started.elapsed()) {
                Some(delay) => {
                    warn!(
                        "Analysis call attempt {} failed ({}), retrying after {}ms...",
                        attempts,
                        last_error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(AnalysisError::Exhausted {
                        attempts,
                        last: last_error.to_string(),
                    })
                }
            }
        }
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, AnalysisError> {
        let body = self.post_with_retry(ANALYZE_PATH, request).await?;
        let envelope: AnalysisEnvelope = serde_json::from_str(&body)?;
        let report = parse_analysis(&envelope.analysis)?;

        info!(
            "Analysis received: {} suggestions, {} skill gaps, {} ATS keywords",
            report.suggestions.len(),
            report.skills_gap.len(),
            report.ats_keywords.len()
        );

        Ok(Analysis {
            analysis_id: envelope
                .analysis_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            report,
            created_at: Utc::now(),
        })
    }

    async fn generate_cover_letter(
        &self,
        request: &AnalysisRequest,
    ) -> Result<CoverLetters, AnalysisError> {
        let body = self.post_with_retry(COVER_LETTER_PATH, request).await?;
        let mut letters = parse_cover_letters(&body);
        if letters.cover_letter_id.is_none() {
            letters.cover_letter_id = Some(Uuid::new_v4().to_string());
        }
        Ok(letters)
    }
}
