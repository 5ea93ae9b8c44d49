use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::IngestError;
use crate::text::clean_value;

const DESCRIPTION_COLUMN: &str = "description";
const COMMENT_COLUMN: &str = "comment";

/// One listing: a cleaned description and every comment row that shares it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub index: usize,
    pub description: String,
    pub comments: Vec<String>,
}

/// Rows of `description,comment` grouped into listings.
///
/// Listing indices follow the order in which each cleaned description first appears.
#[derive(Debug, Default)]
pub struct ListingTable {
    listings: Vec<Listing>,
}

impl ListingTable {
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::Csv(path.display().to_string(), e))?;
        Self::from_reader(reader, &path.display().to_string())
    }

    #[cfg(test)]
    pub fn from_csv_str(data: &str) -> Result<Self, IngestError> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        Self::from_reader(reader, "<memory>")
    }

    fn from_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
        source: &str,
    ) -> Result<Self, IngestError> {
        let headers = reader
            .headers()
            .map_err(|e| IngestError::Csv(source.to_string(), e))?
            .clone();

        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(IngestError::MissingColumn(name))
        };
        let desc_col = find(DESCRIPTION_COLUMN)?;
        let comment_col = find(COMMENT_COLUMN)?;

        let mut table = Self::default();
        let mut by_description: HashMap<String, usize> = HashMap::new();

        for record in reader.records() {
            let record = record.map_err(|e| IngestError::Csv(source.to_string(), e))?;

            // cells missing from short rows read as null
            let description = clean_value(&Value::from(record.get(desc_col)));
            let comment = clean_value(&Value::from(record.get(comment_col)));

            let idx = *by_description
                .entry(description.clone())
                .or_insert_with(|| {
                    table.listings.push(Listing {
                        index: table.listings.len(),
                        description,
                        comments: vec![],
                    });
                    table.listings.len() - 1
                });

            table.listings[idx].comments.push(comment);
        }

        log::info!(
            "loaded {} listings from {source}",
            table.listings.len()
        );

        Ok(table)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, index: usize) -> Option<&Listing> {
        self.listings.get(index)
    }

    /// Highest valid listing index, `None` for an empty table.
    pub fn max_index(&self) -> Option<usize> {
        self.listings.len().checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
description,comment
Cozy apartment near the beach,Great location but noisy at night
Loft in the old town,Très bien situé
  cozy apartment   near the beach ,Loved the view
Loft in the old town,\"Too small, for 4 guests\"
";

    #[test]
    fn test_groups_by_cleaned_description_in_first_seen_order() {
        let table = ListingTable::from_csv_str(SAMPLE).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.max_index(), Some(1));

        let first = table.get(0).unwrap();
        assert_eq!(first.description, "cozy apartment near the beach");
        assert_eq!(
            first.comments,
            vec!["great location but noisy at night", "loved the view"]
        );

        let second = table.get(1).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.comments, vec!["très bien situé", "too small, for 4 guests"]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let result = ListingTable::from_csv_str("description,review\na,b\n");
        assert!(matches!(result, Err(IngestError::MissingColumn("comment"))));
    }

    #[test]
    fn test_column_order_and_case_do_not_matter() {
        let table = ListingTable::from_csv_str("Comment,Description\nnice,Flat\n").unwrap();
        let listing = table.get(0).unwrap();
        assert_eq!(listing.description, "flat");
        assert_eq!(listing.comments, vec!["nice"]);
    }

    #[test]
    fn test_short_row_reads_empty_comment() {
        let table = ListingTable::from_csv_str("description,comment\nFlat\n").unwrap();
        assert_eq!(table.get(0).unwrap().comments, vec![""]);
    }

    #[test]
    fn test_empty_table() {
        let table = ListingTable::from_csv_str("description,comment\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.max_index(), None);
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("listings.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = ListingTable::load(&path).unwrap();
        assert_eq!(table.listings().len(), 2);
    }
}
