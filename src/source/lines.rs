//! Plain text files, one input per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{SourceResult, TextInput, TextSource};

/// Reads a text file and yields each non-empty line.
#[derive(Debug, Clone)]
pub struct LineFileSource {
    path: PathBuf,
    name: String,
}

impl LineFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TextSource for LineFileSource {
    async fn fetch_inputs(&self) -> SourceResult<Vec<TextInput>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let inputs: Vec<TextInput> = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(TextInput::new)
            .collect();
        debug!("Read {} lines from {}", inputs.len(), self.name);
        Ok(inputs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_skips_empty_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Patient has diabetes.\n\nAsthma since childhood.\r\n").unwrap();

        let source = LineFileSource::new(&path);
        let inputs = source.fetch_inputs().await.unwrap();

        assert_eq!(
            inputs,
            vec![
                TextInput::new("Patient has diabetes."),
                TextInput::new("Asthma since childhood."),
            ]
        );
        assert_eq!(source.count_inputs().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = LineFileSource::new("/nonexistent/notes.txt");
        assert!(source.fetch_inputs().await.is_err());
    }
}
