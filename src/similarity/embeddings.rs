//! Sentence encoder wrapper for fastembed.
//!
//! Loads `distilbert-base-uncased` from a local ONNX export:
//! - First-position ([CLS]) pooling over the last hidden state
//! - Truncation at 512 tokens
//! - Output re-normalized to unit L2 norm

use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Files expected inside the encoder directory
const ONNX_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";
const SPECIAL_TOKENS_FILE: &str = "special_tokens_map.json";
const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Missing model file {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

/// Anything that turns one text span into a unit-norm vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Scale `v` to unit L2 norm. A zero vector is returned unchanged.
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    if norm < f32::EPSILON {
        return v;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    v
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct Encoder {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl Encoder {
    /// Load the encoder from `model_dir`. Any failure here is fatal for the caller.
    pub fn load(model_dir: &Path, max_length: usize) -> Result<Self, EmbeddingError> {
        log::info!("loading encoder from {}", model_dir.display());

        let onnx_file = read_model_file(model_dir, ONNX_FILE)?;
        let tokenizer_files = TokenizerFiles {
            tokenizer_file: read_model_file(model_dir, TOKENIZER_FILE)?,
            config_file: read_model_file(model_dir, CONFIG_FILE)?,
            special_tokens_map_file: read_model_file(model_dir, SPECIAL_TOKENS_FILE)?,
            tokenizer_config_file: read_model_file(model_dir, TOKENIZER_CONFIG_FILE)?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_file, tokenizer_files).with_pooling(Pooling::Cls);
        let options = InitOptionsUserDefined::new().with_max_length(max_length);

        let mut model = TextEmbedding::try_new_from_user_defined(user_model, options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;
        log::info!("encoder ready ({dimensions} dimensions)");

        Ok(Self {
            model: Mutex::new(model),
            dimensions,
        })
    }

    /// Get the embedding dimensions for this model
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Probe the model to determine embedding dimensions.
    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }
}

impl Embedder for Encoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(l2_normalize)
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }
}

fn read_model_file(dir: &Path, name: &str) -> Result<Vec<u8>, EmbeddingError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(EmbeddingError::MissingFile(path));
    }
    std::fs::read(&path).map_err(|e| EmbeddingError::InitFailed(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_norm() {
        let v = l2_normalize(vec![3.0, 4.0, 0.0]);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_stays_zero() {
        let v = l2_normalize(vec![0.0; 4]);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_l2_normalize_already_unit() {
        let v = l2_normalize(vec![0.0, 1.0]);
        assert_eq!(v, vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_model_dir_fails_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Encoder::load(&tmp.path().join("nope"), 512);
        assert!(matches!(result, Err(EmbeddingError::MissingFile(_))));
    }

    #[test]
    fn test_missing_tokenizer_reported_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(ONNX_FILE), b"not really onnx").unwrap();

        match Encoder::load(tmp.path(), 512) {
            Err(EmbeddingError::MissingFile(path)) => {
                assert!(path.ends_with(TOKENIZER_FILE));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load should fail without tokenizer files"),
        }
    }

    // Needs the distilbert ONNX export in STAYSMART_TEST_ENCODER_DIR
    #[test]
    #[ignore = "requires encoder model files"]
    fn test_embedding_has_unit_norm() {
        let dir = std::env::var("STAYSMART_TEST_ENCODER_DIR").unwrap();
        let encoder = Encoder::load(Path::new(&dir), 512).unwrap();
        assert_eq!(encoder.dimensions(), 768);

        for text in ["cozy apartment near the beach", "loved the view", "a"] {
            let embedding = encoder.embed(text).unwrap();
            assert!((l2_norm(&embedding) - 1.0).abs() < 1e-5);
        }
    }
}
