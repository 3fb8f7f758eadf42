//! Text normalization ahead of entity recognition.
//!
//! Case-sensitive recognizers do noticeably better on text with natural
//! capitalization, so raw input is truecased before recognition. The
//! [`TextNormalizer`] trait keeps the pipeline independent of how that is done.

pub mod truecase;

use async_trait::async_trait;
use thiserror::Error;

pub use truecase::TrueCaser;

/// Errors that can occur while loading a normalizer model.
///
/// Normalization itself never fails; only construction can.
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// Failed to read the model file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The model file is not valid
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for normalizer construction.
pub type NormalizerResult<T> = Result<T, NormalizerError>;

/// Converts raw input text into the form handed to the recognizer.
#[async_trait]
pub trait TextNormalizer: Send + Sync {
    /// Normalize `text`.
    ///
    /// Implementations fall back to returning the input unchanged when they
    /// cannot improve it.
    async fn normalize(&self, text: &str) -> String;
}

/// Normalizer that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

#[async_trait]
impl TextNormalizer for IdentityNormalizer {
    async fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_normalizer() {
        let normalizer = IdentityNormalizer;
        assert_eq!(normalizer.normalize("patient HAS dm").await, "patient HAS dm");
    }
}
