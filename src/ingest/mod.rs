//! Listing ingestion: a CSV export of many listings, or one listing page's HTML.

mod page;
mod table;

pub use page::{fetch_listing_page, parse_listing_page};
pub use table::ListingTable;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read csv {0}: {1}")]
    Csv(String, csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("page request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page request returned status {0}")]
    Status(u16),
}
