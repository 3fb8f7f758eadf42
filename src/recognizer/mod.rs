//! Entity recognizer abstraction and implementations.
//!
//! A recognizer turns normalized text into a sequence of [`Mention`]s. The
//! pipeline only depends on the [`EntityRecognizer`] trait, so a statistical
//! model served elsewhere, the bundled [`GazetteerRecognizer`], or a test double
//! can be swapped in without touching pipeline logic.

pub mod abbreviation;
pub mod gazetteer;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Mention;

pub use abbreviation::{find_abbreviations, Abbreviation};
pub use gazetteer::{GazetteerRecognizer, Lexicon, LexiconEntry};

/// Errors that can occur during entity recognition.
#[derive(Debug, Error)]
pub enum RecognizerError {
    /// The model is not loaded or cannot be reached
    #[error("Recognizer model unavailable: {0}")]
    ModelUnavailable(String),

    /// Failed to read model files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model files are not valid
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other unexpected errors
    #[error("Recognition failed: {0}")]
    Other(String),
}

/// Result type for recognizer operations.
pub type RecognizerResult<T> = Result<T, RecognizerError>;

/// Trait for named entity recognizers.
///
/// Implementations must be reentrant: one recognizer may serve concurrent
/// pipeline calls.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Find entity mentions in `text`.
    ///
    /// # Returns
    /// Mentions in text order, with byte offsets into `text`
    ///
    /// # Errors
    /// Returns `RecognizerError` if the model cannot process the text
    async fn recognize(&self, text: &str) -> RecognizerResult<Vec<Mention>>;

    /// Name of the model configuration this recognizer was built from.
    fn model_name(&self) -> &str;

    /// Whether the model is loaded and able to serve requests.
    fn is_ready(&self) -> bool {
        true
    }
}
