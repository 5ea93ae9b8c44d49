use std::collections::HashMap;
use std::sync::atomic::Ordering;

use super::fakes::{
    BagOfWordsEmbedder, BrokenSummarizer, DownChat, EchoChat, HeadSummarizer, IdentityTranslator,
    PhraseBookTranslator,
};
use crate::pipeline::{self, Pipeline, PipelineError};
use crate::summarize::SUMMARY_UNAVAILABLE;
use crate::text::clean_text;

const DESCRIPTION: &str = "Cozy apartment near the beach";

fn scenario_comments() -> Vec<String> {
    [
        "Great location but noisy at night",
        "Loved the view",
        "Too small for 4 guests",
        "Perfect for a couple",
        "Host was very responsive",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn end_to_end_scenario() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);
    let comments = scenario_comments();

    let report = pipeline.run(DESCRIPTION, &comments).unwrap();

    assert_eq!(report.description.text, "cozy apartment near the beach");
    assert_eq!(report.top_comments.len(), 5);
    for pair in report.top_comments.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    assert!(!report.summary.fallback);
    assert!(!report.summary.text.is_empty());

    assert!(report.prompt.contains("cozy apartment near the beach"));
    for comment in &comments {
        assert!(report.prompt.contains(&clean_text(comment)), "missing {comment:?}");
    }
    assert!(report.generated_description.is_none());
    assert_eq!(report.untranslated_count(), 0);
}

#[test]
fn description_embedded_once_per_run() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);

    pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 6);
}

#[test]
fn summary_input_is_ranked_comments_joined_by_spaces() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 1000 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 3);

    let report = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();

    let expected = report
        .top_comments
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(report.top_comments.len(), 3);
    assert_eq!(report.summary.text, expected);
}

#[test]
fn translation_failures_are_tagged_and_pipeline_continues() {
    let translator = PhraseBookTranslator(HashMap::from([
        ("appartement cosy, près de la plage!", "cozy apartment near the beach"),
        ("superbe vue!", "great view"),
    ]));
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&translator, &embedder, &summarizer, 5);

    let comments = vec!["Superbe   vue!".to_string(), "Hôte très réactif".to_string()];
    let report = pipeline
        .run("Appartement cosy, près de la plage!", &comments)
        .unwrap();

    // cleaned source text survives next to the translation
    assert_eq!(report.description.cleaned, "appartement cosy, près de la plage!");
    let cleaned: Vec<_> = report.comments.iter().map(|c| c.cleaned.as_str()).collect();
    assert_eq!(cleaned, vec!["superbe vue!", "hôte très réactif"]);

    assert!(report.description.translated);
    assert_eq!(report.description.text, "cozy apartment near the beach");
    assert_eq!(report.description.source_language.as_deref(), Some("fr"));

    let by_text: HashMap<_, _> = report
        .comments
        .iter()
        .map(|c| (c.text.as_str(), c.translated))
        .collect();
    assert_eq!(by_text.get("great view"), Some(&true));
    assert_eq!(by_text.get("hôte très réactif"), Some(&false));
    assert_eq!(report.untranslated_count(), 1);
    assert_eq!(report.top_comments.len(), 2);
}

#[test]
fn broken_summarizer_yields_sentinel() {
    let embedder = BagOfWordsEmbedder::default();
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &BrokenSummarizer, 5);

    let report = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();

    assert_eq!(report.summary.text, SUMMARY_UNAVAILABLE);
    assert!(report.summary.fallback);
    assert!(report.prompt.contains(SUMMARY_UNAVAILABLE));
}

#[test]
fn no_comments_still_produces_prompt() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);

    let report = pipeline.run(DESCRIPTION, &[]).unwrap();

    assert!(report.top_comments.is_empty());
    assert!(report.summary.fallback);
    assert!(report.prompt.contains("cozy apartment near the beach"));
}

#[test]
fn prompt_identical_across_runs() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);

    let first = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();
    let second = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();

    assert_eq!(first.prompt, second.prompt);
    assert_ne!(first.id, second.id);
}

#[test]
fn generation_attaches_completion() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);
    let mut report = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();

    pipeline::generate(&EchoChat, &mut report).unwrap();

    let expected = format!("generated from {} chars", report.prompt.len());
    assert_eq!(report.generated_description.as_deref(), Some(expected.as_str()));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["generated_description"], expected);
    assert_eq!(json["summary"]["fallback"], false);
}

#[test]
fn generation_errors_propagate() {
    let embedder = BagOfWordsEmbedder::default();
    let summarizer = HeadSummarizer { max_words: 30 };
    let pipeline = Pipeline::new(&IdentityTranslator, &embedder, &summarizer, 5);
    let mut report = pipeline.run(DESCRIPTION, &scenario_comments()).unwrap();

    let err = pipeline::generate(&DownChat, &mut report).unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
    assert!(report.generated_description.is_none());
}
