//! Review enrichment pipeline for one listing.
//!
//! clean → translate → rank → summarize → compose prompt, strictly in order.
//! Services are built once by the caller and borrowed for every run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::{ChatModel, LlmError};
use crate::prompt::build_prompt;
use crate::similarity::{self, Embedder, EmbeddingError, RankedComment, SimilarityScorer};
use crate::summarize::{summarize_or_fallback, Summarizer, Summary};
use crate::text::clean_text;
use crate::translate::{to_english, Translated, Translator};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("similarity scoring failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("description generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub description: Translated,
    pub comments: Vec<Translated>,
    pub top_comments: Vec<RankedComment>,
    pub summary: Summary,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_description: Option<String>,
}

impl EnrichmentReport {
    /// Number of comments whose translation fell back to the original text.
    pub fn untranslated_count(&self) -> usize {
        self.comments.iter().filter(|c| !c.translated).count()
            + usize::from(!self.description.translated)
    }
}

pub struct Pipeline<'a> {
    translator: &'a dyn Translator,
    embedder: &'a dyn Embedder,
    summarizer: &'a dyn Summarizer,
    top_k: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        translator: &'a dyn Translator,
        embedder: &'a dyn Embedder,
        summarizer: &'a dyn Summarizer,
        top_k: usize,
    ) -> Self {
        Self {
            translator,
            embedder,
            summarizer,
            top_k,
        }
    }

    /// Run every stage on raw description and comment texts.
    pub fn run(&self, description: &str, comments: &[String]) -> Result<EnrichmentReport, PipelineError> {
        let _span = tracing::info_span!("enrich", comments = comments.len()).entered();

        let description = to_english(self.translator, &clean_text(description));
        let comments: Vec<Translated> = comments
            .iter()
            .map(|c| to_english(self.translator, &clean_text(c)))
            .collect();

        log::info!(
            "ranking {} comments (top {})",
            comments.len(),
            self.top_k
        );
        let comment_texts: Vec<String> = comments.iter().map(|c| c.text.clone()).collect();
        let scorer = SimilarityScorer::new(self.embedder);
        let top_comments =
            similarity::rank(&scorer, &description.text, &comment_texts, self.top_k)?;

        let combined = top_comments
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let summary = summarize_or_fallback(self.summarizer, &combined);

        let prompt = build_prompt(&description.text, &top_comments, &summary);

        let report = EnrichmentReport {
            id: rusty_ulid::generate_ulid_string(),
            created_at: Utc::now(),
            description,
            comments,
            top_comments,
            summary,
            prompt,
            generated_description: None,
        };

        let untranslated = report.untranslated_count();
        if untranslated > 0 {
            log::warn!("{untranslated} texts were kept untranslated");
        }

        Ok(report)
    }
}

/// Ask the chat model for a new description and attach it to the report.
pub fn generate(chat: &dyn ChatModel, report: &mut EnrichmentReport) -> Result<(), PipelineError> {
    let generated = chat.complete(&report.prompt)?;
    report.generated_description = Some(generated);
    Ok(())
}
