//! Translation to English with a fail-open policy.
//!
//! The provider is Google's public `translate_a/single` endpoint with automatic
//! source detection. Any provider failure returns the input unchanged, tagged
//! with `translated: false` so callers can tell a fallback from a real
//! English passthrough.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::TranslationConfig;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation is disabled")]
    Disabled,

    #[error("translation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation request failed: {0}")]
    Http(reqwest::Error),

    #[error("translation provider returned status {0}")]
    Status(u16),

    #[error("unexpected translation payload: {0}")]
    Malformed(String),
}

/// Provider output for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    /// Language code detected by the provider, when reported
    pub source_language: Option<String>,
}

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> Result<Translation, TranslateError>;
}

/// Text after the translation stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translated {
    /// Cleaned source text handed to the provider
    pub cleaned: String,
    pub text: String,
    /// `false` when the provider failed and `text` is the untouched input
    pub translated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
}

impl Translated {
    pub fn fallback(text: &str) -> Self {
        Self {
            cleaned: text.to_string(),
            text: text.to_string(),
            translated: false,
            source_language: None,
        }
    }
}

/// Translate `text` to English, degrading to the input on any failure.
pub fn to_english(translator: &dyn Translator, text: &str) -> Translated {
    if text.trim().is_empty() {
        return Translated {
            cleaned: text.to_string(),
            text: text.to_string(),
            translated: true,
            source_language: None,
        };
    }

    match translator.translate(text) {
        Ok(translation) => Translated {
            cleaned: text.to_string(),
            text: translation.text,
            translated: true,
            source_language: translation.source_language,
        },
        Err(TranslateError::Disabled) => Translated::fallback(text),
        Err(err) => {
            log::warn!("translation failed, keeping original text: {err}");
            Translated::fallback(text)
        }
    }
}

pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    target: String,
    timeout: Duration,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, target: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TranslateError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            target: target.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslateError> {
        Self::new(
            &config.endpoint,
            &config.target,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn map_err(&self, err: reqwest::Error) -> TranslateError {
        if err.is_timeout() {
            TranslateError::Timeout(self.timeout)
        } else {
            TranslateError::Http(err)
        }
    }

    /// Extract the translated text and detected language from the provider payload.
    ///
    /// The payload is a nested array: `[[[chunk, original, ...], ...], null, "fr", ...]`.
    fn parse_response(resp: &Value) -> Result<Translation, TranslateError> {
        let chunks = resp
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| TranslateError::Malformed("missing sentence list".to_string()))?;

        let text: String = chunks
            .iter()
            .filter_map(|chunk| chunk.get(0).and_then(|v| v.as_str()))
            .collect();

        if text.is_empty() {
            return Err(TranslateError::Malformed("empty translation".to_string()));
        }

        let source_language = resp.get(2).and_then(|v| v.as_str()).map(str::to_owned);

        Ok(Translation {
            text,
            source_language,
        })
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        log::debug!("translating {} chars to {}", text.len(), self.target);

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.target.as_str()),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .map_err(|e| self.map_err(e))?;

        if !resp.status().is_success() {
            return Err(TranslateError::Status(resp.status().as_u16()));
        }

        let payload: Value = resp.json().map_err(|e| self.map_err(e))?;
        Self::parse_response(&payload)
    }
}

/// Stand-in provider used when translation is turned off in the config.
pub struct DisabledTranslator;

impl Translator for DisabledTranslator {
    fn translate(&self, _text: &str) -> Result<Translation, TranslateError> {
        Err(TranslateError::Disabled)
    }
}

pub fn from_config(config: &TranslationConfig) -> Result<Box<dyn Translator>, TranslateError> {
    if config.enabled {
        Ok(Box::new(GoogleTranslator::from_config(config)?))
    } else {
        log::info!("translation disabled, texts are used as-is");
        Ok(Box::new(DisabledTranslator))
    }
}
