//! UMLS semantic type table and label resolution.
//!
//! The table maps a semantic type identifier (TUI, e.g. "T047") to its
//! human-readable label. It is loaded once, from the versioned copy bundled
//! with the crate by default, and never mutated afterwards.
//!
//! The file format is the MetaMap `SemanticTypes_<release>.txt` layout: one row
//! per type, pipe-delimited `abbreviation|tui|label`, no header.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

/// Release of the bundled table.
pub const BUNDLED_RELEASE: &str = "2018AB";

/// Remote location of the same release, used for optional refreshes.
pub const DEFAULT_TABLE_URL: &str = "https://lhncbc.nlm.nih.gov/ii/tools/MetaMap/Docs/SemanticTypes_2018AB.txt";

const BUNDLED_TABLE: &str = include_str!("../../resources/SemanticTypes_2018AB.txt");

/// Errors that can occur when loading or querying the semantic type table.
#[derive(Debug, Error)]
pub enum SemanticTypeError {
    /// A TUI matched zero or several rows of the table
    #[error("Semantic type '{tui}' matched {matches} rows, expected exactly one")]
    UnknownSemanticType { tui: String, matches: usize },

    /// Failed to read the table source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote refresh failed
    #[error("Fetch error: {0}")]
    Fetch(String),
}

/// Result type for semantic type operations.
pub type SemanticTypeResult<T> = Result<T, SemanticTypeError>;

/// One row of the semantic type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticType {
    /// Four-letter abbreviation (e.g. "dsyn")
    pub abbreviation: String,

    /// Type identifier (e.g. "T047")
    pub tui: String,

    /// Human-readable label (e.g. "Disease or Syndrome")
    pub label: String,
}

/// Read-only lookup from TUI to label.
///
/// Rows are kept as loaded, duplicates included, so that a lookup can tell a
/// missing type apart from an ambiguous one.
#[derive(Debug, Clone, Default)]
pub struct SemanticTypeTable {
    rows: Vec<SemanticType>,
}

impl SemanticTypeTable {
    /// Build a table from already parsed rows.
    pub fn new(rows: Vec<SemanticType>) -> Self {
        Self { rows }
    }

    /// The table bundled with the crate.
    pub fn bundled() -> SemanticTypeResult<Self> {
        let table = Self::from_reader(BUNDLED_TABLE.as_bytes())?;
        debug!("Loaded bundled semantic type table {} ({} types)", BUNDLED_RELEASE, table.len());
        Ok(table)
    }

    /// Load a table from a local file.
    pub fn from_path(path: impl AsRef<Path>) -> SemanticTypeResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} semantic types from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse a pipe-delimited table.
    pub fn from_reader<R: Read>(reader: R) -> SemanticTypeResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| SemanticTypeError::Parse(e.to_string()))?;
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            if record.len() != 3 {
                return Err(SemanticTypeError::Parse(format!(
                    "line {}: expected 3 fields, found {}",
                    line + 1,
                    record.len()
                )));
            }
            rows.push(SemanticType {
                abbreviation: record[0].trim().to_string(),
                tui: record[1].trim().to_string(),
                label: record[2].trim().to_string(),
            });
        }

        Ok(Self { rows })
    }

    /// Download a table, e.g. from [`DEFAULT_TABLE_URL`].
    pub async fn fetch(url: &str) -> SemanticTypeResult<Self> {
        info!("Fetching semantic type table from {}", url);
        let response = reqwest::get(url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SemanticTypeError::Fetch(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| SemanticTypeError::Fetch(e.to_string()))?;
        Self::from_reader(body.as_bytes())
    }

    /// Label of a single type.
    ///
    /// # Errors
    /// Returns `UnknownSemanticType` unless exactly one row carries `tui`.
    pub fn label_of(&self, tui: &str) -> SemanticTypeResult<&str> {
        let mut matches = self.rows.iter().filter(|row| row.tui == tui);
        match (matches.next(), matches.count()) {
            (Some(row), 0) => Ok(&row.label),
            (first, rest) => Err(SemanticTypeError::UnknownSemanticType {
                tui: tui.to_string(),
                matches: usize::from(first.is_some()) + rest,
            }),
        }
    }

    /// Resolve TUIs to their labels, comma-joined in input order.
    ///
    /// # Errors
    /// Fails on the first TUI that does not match exactly one row.
    pub fn resolve_labels<S: AsRef<str>>(&self, tuis: &[S]) -> SemanticTypeResult<String> {
        let labels = tuis
            .iter()
            .map(|tui| self.label_of(tui.as_ref()))
            .collect::<SemanticTypeResult<Vec<_>>>()?;
        Ok(labels.join(","))
    }

    pub fn rows(&self) -> &[SemanticType] {
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

    fn row(tui: &str, label: &str) -> SemanticType {
        SemanticType {
            abbreviation: "xxxx".to_string(),
            tui: tui.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_bundled_table() {
        let table = SemanticTypeTable::bundled().unwrap();
        assert_eq!(table.len(), 127);
        assert_eq!(table.label_of("T047").unwrap(), "Disease or Syndrome");
        assert_eq!(table.label_of("T116").unwrap(), "Amino Acid, Peptide, or Protein");
    }

    #[test]
    fn test_resolve_single_label() {
        let table = SemanticTypeTable::new(vec![row("T047", "Disease or Syndrome")]);
        assert_eq!(table.resolve_labels(&["T047"]).unwrap(), "Disease or Syndrome");
    }

    #[test]
    fn test_resolve_preserves_order_without_trailing_separator() {
        let table = SemanticTypeTable::bundled().unwrap();
        let labels = table.resolve_labels(&["T121", "T109"]).unwrap();
        assert_eq!(labels, "Pharmacologic Substance,Organic Chemical");
    }

    #[test]
    fn test_resolve_empty_input() {
        let table = SemanticTypeTable::bundled().unwrap();
        let empty: [&str; 0] = [];
        assert_eq!(table.resolve_labels(&empty).unwrap(), "");
    }

    #[test]
    fn test_unknown_type_fails() {
        let table = SemanticTypeTable::new(vec![row("T047", "Disease or Syndrome")]);
        match table.resolve_labels(&["T047", "T999"]) {
            Err(SemanticTypeError::UnknownSemanticType { tui, matches }) => {
                assert_eq!(tui, "T999");
                assert_eq!(matches, 0);
            }
            other => panic!("Expected UnknownSemanticType, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_rows_fail() {
        let table = SemanticTypeTable::new(vec![
            row("T047", "Disease or Syndrome"),
            row("T047", "Disease"),
        ]);
        match table.label_of("T047") {
            Err(SemanticTypeError::UnknownSemanticType { matches, .. }) => assert_eq!(matches, 2),
            other => panic!("Expected UnknownSemanticType, got {:?}", other),
        }
    }

    #[test]
    fn test_from_reader_rejects_malformed_rows() {
        let data = "dsyn|T047|Disease or Syndrome\nbroken row\n";
        let result = SemanticTypeTable::from_reader(data.as_bytes());
        assert!(matches!(result, Err(SemanticTypeError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.txt");
        std::fs::write(&path, "sosy|T184|Sign or Symptom\n").unwrap();

        let table = SemanticTypeTable::from_path(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.label_of("T184").unwrap(), "Sign or Symptom");
    }
}
