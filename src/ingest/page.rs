use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::IngestError;

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const DESCRIPTION_SELECTOR: &str = r#"div[data-stid="content-markup"]"#;
const REVIEW_SELECTOR: &str = r#"span[itemprop="description"]"#;

/// Review snippets at or below this length are skipped
const MIN_COMMENT_CHARS: usize = 10;

/// Raw description and comments found on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub description: String,
    pub comments: Vec<String>,
}

/// Concatenated, individually trimmed text nodes of `element`.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn parse_listing_page(html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let description_selector = Selector::parse(DESCRIPTION_SELECTOR).unwrap();
    let review_selector = Selector::parse(REVIEW_SELECTOR).unwrap();

    let description = document
        .select(&description_selector)
        .next()
        .map(stripped_text)
        .unwrap_or_default();

    if description.is_empty() {
        log::warn!("no listing description found on page");
    }

    let comments: Vec<String> = document
        .select(&review_selector)
        .map(stripped_text)
        .filter(|t| t.chars().count() > MIN_COMMENT_CHARS)
        .collect();

    log::debug!("page has {} review snippets", comments.len());

    ListingPage {
        url: None,
        description,
        comments,
    }
}

/// Plain HTTP fetch of a listing page. Pages that render reviews client-side
/// will come back without comments; save the rendered HTML and use it instead.
pub fn fetch_listing_page(url: &str) -> Result<ListingPage, IngestError> {
    let parsed = url::Url::parse(url).map_err(|e| IngestError::InvalidUrl(format!("{url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(IngestError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT_DEFAULT)
        .timeout(FETCH_TIMEOUT)
        .build()?;

    log::info!("fetching {parsed}");
    let resp = client.get(parsed.as_str()).send()?;
    if !resp.status().is_success() {
        return Err(IngestError::Status(resp.status().as_u16()));
    }

    let mut page = parse_listing_page(&resp.text()?);
    page.url = Some(parsed.to_string());
    Ok(page)
}
