use crate::similarity::RankedComment;
use crate::summarize::Summary;

/// Build the generation prompt. Scores are left out; only comment text is listed.
pub fn build_prompt(description: &str, ranked: &[RankedComment], summary: &Summary) -> String {
    let comments = ranked
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Here is an initial description:\n{description}\n\n\
         Here are the {count} most similar comments:\n{comments}\n\n\
         Here is a summary of these comments:\n{summary}\n\n\
         Generate a new, more realistic description from these elements.",
        count = ranked.len(),
        summary = summary.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(texts: &[&str]) -> Vec<RankedComment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RankedComment {
                text: t.to_string(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    fn summary(text: &str) -> Summary {
        Summary {
            text: text.to_string(),
            fallback: false,
        }
    }

    #[test]
    fn test_exact_layout() {
        let prompt = build_prompt(
            "cozy apartment near the beach",
            &ranked(&["loved the view", "perfect for a couple"]),
            &summary("guests loved the view ."),
        );

        assert_eq!(
            prompt,
            "Here is an initial description:\ncozy apartment near the beach\n\n\
             Here are the 2 most similar comments:\nloved the view\nperfect for a couple\n\n\
             Here is a summary of these comments:\nguests loved the view .\n\n\
             Generate a new, more realistic description from these elements."
        );
    }

    #[test]
    fn test_scores_not_included() {
        let prompt = build_prompt("desc", &ranked(&["nice"]), &summary("s"));
        assert!(!prompt.contains("1.0"));
        assert!(!prompt.contains("0.9"));
    }

    #[test]
    fn test_deterministic() {
        let top = ranked(&["a", "b", "c", "d", "e"]);
        let s = summary("short summary");
        assert_eq!(build_prompt("d", &top, &s), build_prompt("d", &top, &s));
    }

    #[test]
    fn test_fallback_summary_is_embedded_verbatim() {
        let prompt = build_prompt("desc", &[], &Summary::unavailable());
        assert!(prompt.contains(crate::summarize::SUMMARY_UNAVAILABLE));
        assert!(prompt.contains("Here are the 0 most similar comments:\n\n"));
    }
}
