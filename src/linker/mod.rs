//! Concept linker abstraction and implementations.
//!
//! A linker maps a [`Mention`] to ranked [`ConceptCandidate`]s from a controlled
//! vocabulary and exposes the details (canonical name, definition, semantic
//! types, synonyms) of every concept it can return.
//!
//! The bundled [`KnowledgeBaseLinker`] generates candidates with character
//! trigram TF-IDF similarity over the aliases of a UMLS knowledge base.

pub mod knowledge_base;
pub mod tfidf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ConceptCandidate, ConceptDetails, Mention};

pub use knowledge_base::{KnowledgeBase, KnowledgeBaseLinker};

/// Errors that can occur during concept linking.
#[derive(Debug, Error)]
pub enum LinkerError {
    /// The index or knowledge base is not loaded or cannot be reached
    #[error("Linker index unavailable: {0}")]
    ModelUnavailable(String),

    /// Failed to read knowledge base files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge base files are not valid
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other unexpected errors
    #[error("Linking failed: {0}")]
    Other(String),
}

/// Result type for linker operations.
pub type LinkerResult<T> = Result<T, LinkerError>;

/// Linker options.
///
/// Defaults match the configuration the annotation pipeline is tuned for:
/// abbreviations resolved, no definition filtering, one concept per mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Link an abbreviation through its long form when one was detected
    pub resolve_abbreviations: bool,

    /// Name of the vocabulary the linker is bound to
    pub linker_name: String,

    /// Drop concepts without a definition unless they score highly
    pub filter_for_definitions: bool,

    /// Score a concept without definition needs when definition filtering is on
    pub no_definition_threshold: f64,

    /// Maximum number of candidates returned per mention
    pub max_entities_per_mention: usize,

    /// Minimum similarity for a candidate
    pub threshold: f64,

    /// Number of nearest aliases considered per mention
    pub k: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            resolve_abbreviations: true,
            linker_name: "umls".to_string(),
            filter_for_definitions: false,
            no_definition_threshold: 0.85,
            max_entities_per_mention: 1,
            threshold: 0.7,
            k: 30,
        }
    }
}

/// Trait for concept linkers.
///
/// Implementations must be reentrant: one linker may serve concurrent pipeline
/// calls.
#[async_trait]
pub trait ConceptLinker: Send + Sync {
    /// Rank candidate concepts for a mention, best first.
    ///
    /// An empty result means the mention could not be linked; that is not an
    /// error.
    async fn link(&self, mention: &Mention) -> LinkerResult<Vec<ConceptCandidate>>;

    /// Details of a concept returned by [`link`](Self::link).
    fn details_of(&self, concept_id: &str) -> Option<&ConceptDetails>;

    /// Options the linker runs with.
    fn config(&self) -> &LinkerConfig;

    /// Whether the index is loaded and able to serve requests.
    fn is_ready(&self) -> bool {
        true
    }
}
