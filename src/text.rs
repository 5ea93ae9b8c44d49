//! Text cleaning applied to every description and comment before translation.
//!
//! 1. Collapse whitespace runs to a single space
//! 2. Drop every character that is not a word character, whitespace or `.,!?'`
//! 3. Collapse again (step 2 can leave double spaces behind)
//! 4. Trim and lowercase

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,!?']").unwrap());

/// Clean a text span. Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let stripped = DISALLOWED.replace_all(&collapsed, "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");

    collapsed.trim().to_lowercase()
}

/// Clean an untyped cell value. Anything that is not a string cleans to `""`.
pub fn clean_value(value: &Value) -> String {
    match value {
        Value::String(text) => clean_text(text),
        _ => String::new(),
    }
}
