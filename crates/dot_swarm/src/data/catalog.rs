//! Read-only index over the dataset rows.
//!
//! Rows are grouped by `(measure, comparison)` so that resolving a marker is a
//! single lookup. Insertion order is preserved within each slice, which fixes the
//! order clusters are drawn in.
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::data::{csv, Row};
use crate::error::Result;

/// Immutable catalog of dataset rows.
#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    rows: Vec<Row>,
    index: HashMap<(String, String), Vec<usize>>,
    measures: Vec<String>,
}

impl DataCatalog {
    /// Builds a catalog over the given rows.
    pub fn new(rows: Vec<Row>) -> Self {
        let mut index: HashMap<(String, String), Vec<usize>> = HashMap::new();
        let mut measures: Vec<String> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if !measures.contains(&row.measure) {
                measures.push(row.measure.clone());
            }
            index
                .entry((row.measure.clone(), row.comparison.clone()))
                .or_default()
                .push(i);
        }
        Self {
            rows,
            index,
            measures,
        }
    }

    /// Parses CSV text into a catalog.
    pub fn from_csv_str(input: &str) -> Result<Self> {
        Ok(Self::new(csv::parse_rows(input)?))
    }

    /// Reads CSV from any reader into a catalog.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_csv_str(&text)
    }

    /// Reads a CSV file into a catalog.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text)
    }

    /// Rows matching the exact `(measure, comparison)` pair, in dataset order.
    pub fn rows_for<'a>(
        &'a self,
        measure: &str,
        comparison: &str,
    ) -> impl Iterator<Item = &'a Row> + 'a {
        self.index
            .get(&(measure.to_owned(), comparison.to_owned()))
            .into_iter()
            .flat_map(move |ids| ids.iter().map(move |&i| &self.rows[i]))
    }

    /// Returns `true` if any row exists for the pair.
    pub fn contains(&self, measure: &str, comparison: &str) -> bool {
        self.index
            .contains_key(&(measure.to_owned(), comparison.to_owned()))
    }

    /// Distinct measures in first-seen order.
    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    /// Distinct comparisons of a measure in first-seen order.
    pub fn comparisons(&self, measure: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in self.rows.iter().filter(|r| r.measure == measure) {
            if !out.contains(&row.comparison.as_str()) {
                out.push(&row.comparison);
            }
        }
        out
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DataCatalog {
        DataCatalog::new(vec![
            Row::new("m", "c", "A", 40.0),
            Row::new("m", "c", "B", 60.0),
            Row::new("m", "c2", "B", 60.0),
            Row::new("m", "c2", "C", 40.0),
            Row::new("n", "c", "A", 100.0),
        ])
    }

    #[test]
    fn rows_for_filters_by_exact_pair_in_order() {
        let cat = catalog();
        let groups: Vec<&str> = cat.rows_for("m", "c").map(|r| r.group.as_str()).collect();
        assert_eq!(groups, vec!["A", "B"]);
        let groups: Vec<&str> = cat.rows_for("m", "c2").map(|r| r.group.as_str()).collect();
        assert_eq!(groups, vec!["B", "C"]);
        assert_eq!(cat.rows_for("m", "missing").count(), 0);
    }

    #[test]
    fn measures_and_comparisons_keep_first_seen_order() {
        let cat = catalog();
        assert_eq!(cat.measures(), &["m".to_string(), "n".to_string()]);
        assert_eq!(cat.comparisons("m"), vec!["c", "c2"]);
        assert!(cat.contains("n", "c"));
        assert!(!cat.contains("n", "c2"));
        assert_eq!(cat.len(), 5);
    }

    #[test]
    fn from_reader_parses_csv() {
        let text = "measure,comparison,group,value\nm,c,A,40\nm,c,B,60\n";
        let cat = DataCatalog::from_reader(text.as_bytes()).unwrap();
        assert_eq!(cat.len(), 2);
        assert!(!cat.is_empty());
    }
}
