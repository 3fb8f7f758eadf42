//! Text sources for batch annotation.
//!
//! A [`TextSource`] supplies the texts (and optional ids) that the pipeline
//! annotates one at a time in
//! [`AnnotationPipeline::extract_from_source`](crate::pipeline::AnnotationPipeline::extract_from_source).
//! Sources only read and split their input; they never touch the models.

pub mod lines;
pub mod table;

use async_trait::async_trait;
use thiserror::Error;

pub use lines::LineFileSource;
pub use table::DelimitedTableSource;

/// Errors that can occur when reading inputs from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited table could not be parsed
    #[error("Table error: {0}")]
    Csv(String),

    /// A requested column is not in the table header
    #[error("Column '{0}' not found in table header")]
    MissingColumn(String),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// One text to annotate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    /// Caller-provided id; the pipeline generates one when absent
    pub id: Option<String>,

    pub text: String,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }
}

/// Trait for batch input sources.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// All inputs of the source, in source order.
    async fn fetch_inputs(&self) -> SourceResult<Vec<TextInput>>;

    /// Number of inputs the source will yield.
    async fn count_inputs(&self) -> SourceResult<usize> {
        self.fetch_inputs().await.map(|inputs| inputs.len())
    }

    /// Human-readable name, for logging.
    fn name(&self) -> &str;
}

/// In-memory list of strings, each annotated without an id.
#[derive(Debug, Clone, Default)]
pub struct StringListSource {
    texts: Vec<String>,
}

impl StringListSource {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TextSource for StringListSource {
    async fn fetch_inputs(&self) -> SourceResult<Vec<TextInput>> {
        Ok(self.texts.iter().map(TextInput::new).collect())
    }

    async fn count_inputs(&self) -> SourceResult<usize> {
        Ok(self.texts.len())
    }

    fn name(&self) -> &str {
        "string list"
    }
}
