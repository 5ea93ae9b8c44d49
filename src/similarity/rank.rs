use serde::Serialize;

use super::embeddings::EmbeddingError;
use super::scorer::SimilarityScorer;

/// Comment kept after ranking, with its similarity to the description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedComment {
    pub text: String,
    pub score: f32,
}

/// Score every comment against `description` and keep the `k` best.
///
/// The description is embedded once for the whole session.
pub fn rank(
    scorer: &SimilarityScorer<'_>,
    description: &str,
    comments: &[String],
    k: usize,
) -> Result<Vec<RankedComment>, EmbeddingError> {
    if comments.is_empty() {
        return Ok(vec![]);
    }

    let anchored = scorer.anchored(description)?;

    let mut scored = Vec::with_capacity(comments.len());
    for comment in comments {
        let score = anchored.score(comment)?;
        log::debug!("score {score:.3} for {comment:?}");
        scored.push(RankedComment {
            text: comment.clone(),
            score,
        });
    }

    Ok(top_k(scored, k))
}

/// Sort descending by score and truncate to `k`.
///
/// `sort_by` is stable, so equal scores keep their input order.
/// NaN scores rank below every real score.
pub fn top_k(mut scored: Vec<RankedComment>, k: usize) -> Vec<RankedComment> {
    scored.sort_by(|a, b| sort_key(b.score).total_cmp(&sort_key(a.score)));
    scored.truncate(k);
    scored
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
