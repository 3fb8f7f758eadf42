//! Writing annotation results.
//!
//! Results are written as delimited text with a header row in
//! [`LinkedEntity::COLUMNS`](crate::models::LinkedEntity::COLUMNS) order. Cells
//! containing the delimiter, quotes or newlines are quoted by the writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::EntityTable;

/// Subdirectory of the output root that holds per-model results.
pub const OUTPUT_SUBDIR: &str = "scispacy_ner";

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create or write the output file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode a row
    #[error("Encoding error: {0}")]
    Csv(String),
}

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

impl From<csv::Error> for OutputError {
    fn from(e: csv::Error) -> Self {
        OutputError::Csv(e.to_string())
    }
}

/// Path of the result file for `input` annotated with `model`.
///
/// `<root>/scispacy_ner/model_<model>/<input file name>_entities.tsv`
pub fn output_path(root: &Path, model: &str, input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());

    root.join(OUTPUT_SUBDIR)
        .join(format!("model_{}", model))
        .join(format!("{}_entities.tsv", file_name))
}

/// Write `table` with a header row, separating cells with `delimiter`.
pub fn write_delimited<W: Write>(
    table: &EntityTable,
    writer: W,
    delimiter: u8,
) -> OutputResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `table` as TSV to `path`, creating parent directories.
pub fn write_tsv(path: &Path, table: &EntityTable) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_delimited(table, std::io::BufWriter::new(file), b'\t')?;
    info!("Wrote {} records to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkedEntity, Mention};

    fn create_test_table() -> EntityTable {
        let mention = Mention::new("pain", "SYMPTOM", 0, 4);
        let mut record = LinkedEntity::unlinked("id1", "pain\tand fever", &mention);
        record.umls_synonyms = "Ache, Pain".to_string();
        EntityTable::from(vec![record])
    }

    #[test]
    fn test_output_path() {
        let path = output_path(
            Path::new("output"),
            "en_ner_bc5cdr_md",
            Path::new("data/notes.tsv"),
        );
        assert_eq!(
            path,
            PathBuf::from("output/scispacy_ner/model_en_ner_bc5cdr_md/notes.tsv_entities.tsv")
        );
    }

    #[test]
    fn test_header_and_quoting() {
        let mut buffer = Vec::new();
        write_delimited(&create_test_table(), &mut buffer, b'\t').unwrap();
        let written = String::from_utf8(buffer).unwrap();
        let mut lines = written.lines();

        assert_eq!(lines.next().unwrap(), LinkedEntity::COLUMNS.join("\t"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("id1\t\"pain\tand fever\"\tpain\tSYMPTOM"));
        assert!(row.ends_with("\tAche, Pain\t"));
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let mut buffer = Vec::new();
        write_delimited(&EntityTable::new(), &mut buffer, b',').unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_write_tsv_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "demo", Path::new("notes.txt"));

        write_tsv(&path, &create_test_table()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("input_id\tinput_text"));
    }
}
