//! Delimited tables (TSV/CSV) with a header row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{SourceError, SourceResult, TextInput, TextSource};

/// Reads one input per table row from a text column and an optional id column.
///
/// Rows whose text cell is empty are skipped; an empty id cell leaves the id
/// unset.
#[derive(Debug, Clone)]
pub struct DelimitedTableSource {
    path: PathBuf,
    name: String,
    delimiter: u8,
    text_column: String,
    id_column: Option<String>,
}

impl DelimitedTableSource {
    /// Create a source; the delimiter is `,` for `.csv` files and tab otherwise.
    pub fn new(path: impl Into<PathBuf>, text_column: impl Into<String>) -> Self {
        let path = path.into();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
            _ => b'\t',
        };
        let name = path.display().to_string();
        Self {
            path,
            name,
            delimiter,
            text_column: text_column.into(),
            id_column: None,
        }
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = Some(id_column.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn column_index(headers: &csv::StringRecord, column: &str) -> SourceResult<usize> {
        headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| SourceError::MissingColumn(column.to_string()))
    }
}

#[async_trait]
impl TextSource for DelimitedTableSource {
    async fn fetch_inputs(&self) -> SourceResult<Vec<TextInput>> {
        let content = tokio::fs::read(&self.path).await?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(content.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| SourceError::Csv(e.to_string()))?
            .clone();
        let text_idx = Self::column_index(&headers, &self.text_column)?;
        let id_idx = self
            .id_column
            .as_deref()
            .map(|column| Self::column_index(&headers, column))
            .transpose()?;

        let mut inputs = Vec::new();
        let mut skipped = 0;
        for record in reader.records() {
            let record = record.map_err(|e| SourceError::Csv(e.to_string()))?;
            let text = record.get(text_idx).unwrap_or_default();
            if text.is_empty() {
                skipped += 1;
                continue;
            }
            let id = id_idx
                .and_then(|idx| record.get(idx))
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            inputs.push(TextInput {
                id,
                text: text.to_string(),
            });
        }

        if skipped > 0 {
            warn!("Skipped {} rows with empty '{}' in {}", skipped, self.text_column, self.name);
        }
        debug!("Read {} rows from {}", inputs.len(), self.name);
        Ok(inputs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
