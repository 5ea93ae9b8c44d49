use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("invalid api key header: {0}")]
    InvalidApiKey(String),

    #[error("chat completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("chat completion request failed: {0}")]
    Http(reqwest::Error),

    #[error("chat completion returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat completion returned no choices")]
    EmptyResponse,
}

pub trait ChatModel: Send + Sync {
    /// Send `prompt` as the single user message and return the completion text.
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat completion client (Groq by default).
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| LlmError::InvalidApiKey(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout,
        })
    }

    pub fn from_env(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| LlmError::MissingApiKey(API_KEY_ENV))?;
        Self::new(config, &api_key)
    }

    fn map_err(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(err)
        }
    }
}

impl ChatModel for ChatClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        log::info!("requesting completion from {} ({})", self.endpoint, self.model);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| self.map_err(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = resp.json().map_err(|e| self.map_err(e))?;
        parsed.into_content()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
