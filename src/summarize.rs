//! Abstractive summary of the top-ranked comments.
//!
//! Delegates to a hosted `t5-small` summarization model with bounded,
//! deterministic generation. Failures never propagate: the caller gets the
//! fixed [`SUMMARY_UNAVAILABLE`] text instead.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SummarizerConfig;

pub const SUMMARY_UNAVAILABLE: &str = "Summary not available.";

const API_TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("nothing to summarize")]
    EmptyInput,

    #[error("summarization request timed out after {0:?}")]
    Timeout(Duration),

    #[error("summarization request failed: {0}")]
    Http(reqwest::Error),

    #[error("summarization provider error: {0}")]
    Provider(String),
}

pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    /// `true` when `text` is the fixed unavailable notice
    pub fallback: bool,
}

impl Summary {
    pub fn unavailable() -> Self {
        Self {
            text: SUMMARY_UNAVAILABLE.to_string(),
            fallback: true,
        }
    }
}

/// Summarize `text`, returning the unavailable notice on any failure.
pub fn summarize_or_fallback(summarizer: &dyn Summarizer, text: &str) -> Summary {
    if text.trim().is_empty() {
        log::warn!("no comments to summarize");
        return Summary::unavailable();
    }

    match summarizer.summarize(text) {
        Ok(summary) if !summary.trim().is_empty() => Summary {
            text: summary.trim().to_string(),
            fallback: false,
        },
        Ok(_) => {
            log::warn!("summarizer returned an empty summary");
            Summary::unavailable()
        }
        Err(err) => {
            log::warn!("summarization failed: {err}");
            Summary::unavailable()
        }
    }
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

/// Client for a Hugging Face style inference endpoint.
pub struct HostedSummarizer {
    client: Client,
    url: String,
    max_length: u32,
    min_length: u32,
    timeout: Duration,
}

impl HostedSummarizer {
    pub fn new(config: &SummarizerConfig, api_token: Option<&str>) -> Result<Self, SummarizeError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| SummarizeError::Provider(format!("invalid api token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(SummarizeError::Http)?;

        let url = format!(
            "{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            url,
            max_length: config.max_length,
            min_length: config.min_length,
            timeout,
        })
    }

    pub fn from_env(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        let token = std::env::var(API_TOKEN_ENV).ok();
        if token.is_none() {
            log::warn!("{API_TOKEN_ENV} is missing; using anonymous inference (rate limits apply)");
        }
        Self::new(config, token.as_deref())
    }

    fn map_err(&self, err: reqwest::Error) -> SummarizeError {
        if err.is_timeout() {
            SummarizeError::Timeout(self.timeout)
        } else {
            SummarizeError::Http(err)
        }
    }

    fn parse_response(resp: Value) -> Result<String, SummarizeError> {
        if let Some(message) = resp.get("error").and_then(|v| v.as_str()) {
            return Err(SummarizeError::Provider(message.to_string()));
        }

        let outputs: Vec<SummaryOutput> = serde_json::from_value(resp)
            .map_err(|e| SummarizeError::Provider(format!("unexpected payload: {e}")))?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| SummarizeError::Provider("no summary returned".to_string()))
    }
}

impl Summarizer for HostedSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let body = SummaryRequest {
            inputs: text,
            parameters: GenerationParameters {
                max_length: self.max_length,
                min_length: self.min_length,
                do_sample: false,
            },
        };

        log::info!("summarizing {} chars via {}", text.len(), self.url);
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| self.map_err(e))?;

        let status = resp.status();
        let payload: Value = resp.json().map_err(|e| self.map_err(e))?;
        if !status.is_success() && payload.get("error").is_none() {
            return Err(SummarizeError::Provider(format!("status {status}")));
        }

        Self::parse_response(payload)
    }
}
