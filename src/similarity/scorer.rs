//! First-token embedding similarity between two texts.
//!
//! The score is the dot product of the two unit-normalized [CLS] vectors.
//! This is not a mean-pooled sentence similarity; scores from this model
//! family cluster high and discriminate weakly between unrelated texts.

use super::embeddings::{l2_normalize, EmbeddingError, Embedder};

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub struct SimilarityScorer<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> SimilarityScorer<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Similarity of two independent texts (two encoder passes).
    #[cfg(test)]
    pub fn score(&self, a: &str, b: &str) -> Result<f32, EmbeddingError> {
        let emb_a = self.embed(a)?;
        let emb_b = self.embed(b)?;
        Ok(dot(&emb_a, &emb_b))
    }

    /// Embed `anchor` once and score many texts against it.
    pub fn anchored(&self, anchor: &str) -> Result<AnchoredScorer<'_, 'a>, EmbeddingError> {
        Ok(AnchoredScorer {
            scorer: self,
            anchor: self.embed(anchor)?,
        })
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        // Embedder impls are not required to return unit vectors
        self.embedder.embed(text).map(l2_normalize)
    }
}

/// Scorer with a cached anchor embedding (one ranking session).
pub struct AnchoredScorer<'s, 'a> {
    scorer: &'s SimilarityScorer<'a>,
    anchor: Vec<f32>,
}

impl AnchoredScorer<'_, '_> {
    pub fn score(&self, text: &str) -> Result<f32, EmbeddingError> {
        let emb = self.scorer.embed(text)?;
        Ok(dot(&self.anchor, &emb))
    }
}
