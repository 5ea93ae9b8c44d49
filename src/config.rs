use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::storage::{self, StorageManager};

const CONFIG_FILE: &str = "config.yaml";

/// Number of ranked comments kept for the summary and the prompt
const DEFAULT_TOP_K: usize = 5;

const DEFAULT_ENCODER_DIR: &str = "models/distilbert-base-uncased";
/// Hard limit of the DistilBERT position embeddings
const MAX_ENCODER_LENGTH: usize = 512;

const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const DEFAULT_TRANSLATE_TARGET: &str = "en";
const DEFAULT_TRANSLATE_TIMEOUT_SECS: u64 = 10;

const DEFAULT_SUMMARIZER_ENDPOINT: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_SUMMARIZER_MODEL: &str = "t5-small";
const DEFAULT_SUMMARY_MAX_LENGTH: u32 = 100;
const DEFAULT_SUMMARY_MIN_LENGTH: u32 = 30;
const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 60;

const DEFAULT_LLM_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Local sentence encoder used for similarity scoring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Directory with the ONNX export and tokenizer files.
    /// Relative paths are resolved against the base directory.
    #[serde(default = "default_encoder_dir")]
    pub model_dir: String,

    /// Tokens kept per text before truncation
    #[serde(default = "default_encoder_max_length")]
    pub max_length: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_dir: default_encoder_dir(),
            max_length: MAX_ENCODER_LENGTH,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// When disabled, every text passes through untranslated
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_translate_target")]
    pub target: String,

    #[serde(default = "default_translate_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_translate_endpoint(),
            target: default_translate_target(),
            timeout_secs: DEFAULT_TRANSLATE_TIMEOUT_SECS,
        }
    }
}

/// Hosted sequence-to-sequence summarization model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Upper bound on generated tokens
    #[serde(default = "default_summary_max_length")]
    pub max_length: u32,

    /// Lower bound on generated tokens
    #[serde(default = "default_summary_min_length")]
    pub min_length: u32,

    #[serde(default = "default_summarizer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_summarizer_endpoint(),
            model: default_summarizer_model(),
            max_length: DEFAULT_SUMMARY_MAX_LENGTH,
            min_length: DEFAULT_SUMMARY_MIN_LENGTH,
            timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
        }
    }
}

/// Chat-completion endpoint (OpenAI-compatible) used for description generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_encoder_dir() -> String {
    DEFAULT_ENCODER_DIR.to_string()
}

fn default_encoder_max_length() -> usize {
    MAX_ENCODER_LENGTH
}

fn default_translate_endpoint() -> String {
    DEFAULT_TRANSLATE_ENDPOINT.to_string()
}

fn default_translate_target() -> String {
    DEFAULT_TRANSLATE_TARGET.to_string()
}

fn default_translate_timeout_secs() -> u64 {
    DEFAULT_TRANSLATE_TIMEOUT_SECS
}

fn default_summarizer_endpoint() -> String {
    DEFAULT_SUMMARIZER_ENDPOINT.to_string()
}

fn default_summarizer_model() -> String {
    DEFAULT_SUMMARIZER_MODEL.to_string()
}

fn default_summary_max_length() -> u32 {
    DEFAULT_SUMMARY_MAX_LENGTH
}

fn default_summary_min_length() -> u32 {
    DEFAULT_SUMMARY_MIN_LENGTH
}

fn default_summarizer_timeout_secs() -> u64 {
    DEFAULT_SUMMARIZER_TIMEOUT_SECS
}

fn default_llm_endpoint() -> String {
    DEFAULT_LLM_ENDPOINT.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_llm_timeout_secs() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

fn top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            encoder: EncoderConfig::default(),
            translation: TranslationConfig::default(),
            summarizer: SummarizerConfig::default(),
            llm: LlmConfig::default(),
            base_path: String::new(),
        }
    }
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.top_k == 0 {
            bail!("top_k must be greater than 0");
        }

        if !(1..=MAX_ENCODER_LENGTH).contains(&self.encoder.max_length) {
            bail!(
                "encoder.max_length must be between 1 and {MAX_ENCODER_LENGTH}, got {}",
                self.encoder.max_length
            );
        }

        let sum = &self.summarizer;
        if sum.min_length > sum.max_length {
            bail!(
                "summarizer.min_length ({}) must not exceed summarizer.max_length ({})",
                sum.min_length,
                sum.max_length
            );
        }

        if self.translation.timeout_secs == 0 {
            bail!("translation.timeout_secs must be greater than 0");
        }
        if sum.timeout_secs == 0 {
            bail!("summarizer.timeout_secs must be greater than 0");
        }
        if self.llm.timeout_secs == 0 {
            bail!("llm.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        let store = storage::BackendLocal::new(base_path)
            .with_context(|| format!("failed to open base directory {base_path}"))?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str =
            String::from_utf8(store.read(CONFIG_FILE)?).context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    /// Encoder directory with relative paths anchored at the base directory.
    pub fn encoder_dir(&self) -> PathBuf {
        let dir = PathBuf::from(&self.encoder.model_dir);
        if dir.is_absolute() {
            dir
        } else {
            PathBuf::from(&self.base_path).join(dir)
        }
    }
}
