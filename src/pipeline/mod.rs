//! Entity annotation pipeline.
//!
//! This module orchestrates single-text annotation: truecase the text, find
//! mentions, link each mention to vocabulary concepts, resolve the concepts'
//! semantic type labels and assemble one [`LinkedEntity`] per
//! (mention, candidate) pair.
//!
//! # Usage
//!
//! ```ignore
//! use umls_ner::linker::{KnowledgeBase, KnowledgeBaseLinker, LinkerConfig};
//! use umls_ner::normalizer::TrueCaser;
//! use umls_ner::pipeline::AnnotationPipeline;
//! use umls_ner::recognizer::GazetteerRecognizer;
//! use umls_ner::semantic_types::SemanticTypeTable;
//!
//! let recognizer = GazetteerRecognizer::from_path("models/en_demo.json")?;
//! let kb = KnowledgeBase::from_path("kb/umls_demo.jsonl")?;
//! let linker = KnowledgeBaseLinker::new(kb, LinkerConfig::default());
//! let pipeline = AnnotationPipeline::new(
//!     TrueCaser::default(),
//!     recognizer,
//!     linker,
//!     SemanticTypeTable::bundled()?,
//! );
//!
//! let records = pipeline.extract("patient has diabetes.", None, false).await?;
//! for record in &records {
//!     println!("{} -> {} ({})", record.entity, record.umls_label, record.umls_cui);
//! }
//! ```
//!
//! Missing links, empty text and texts without entities are expected outcomes:
//! they are logged at debug level and produce empty results, never errors.
//!
//! A pipeline holds only read-only state after construction and can be shared
//! across tasks, provided its recognizer and linker are reentrant.

use indicatif::ProgressBar;
use thiserror::Error;
use tracing::{debug, info};

use crate::identifier::{IdGenerator, ShortIdGenerator};
use crate::linker::{ConceptLinker, LinkerError};
use crate::models::{ConceptCandidate, EntityTable, LinkedEntity, Mention};
use crate::normalizer::TextNormalizer;
use crate::recognizer::{EntityRecognizer, RecognizerError};
use crate::semantic_types::{SemanticTypeError, SemanticTypeTable};
use crate::source::{SourceError, TextInput, TextSource};

/// Errors that can occur during annotation.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The recognizer or the linker is not initialized or cannot be reached
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A concept's semantic type has no (or more than one) table row
    #[error(transparent)]
    UnknownSemanticType(#[from] SemanticTypeError),

    /// The linker returned a concept it has no details for
    #[error("Linker returned unknown concept: {0}")]
    UnknownConcept(String),

    /// Entity recognition failed
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Concept linking failed
    #[error("Linking error: {0}")]
    Linking(String),

    /// A batch source could not be read
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Result type for annotation operations.
pub type AnnotationResult<T> = Result<T, AnnotationError>;

impl From<RecognizerError> for AnnotationError {
    fn from(e: RecognizerError) -> Self {
        match e {
            RecognizerError::ModelUnavailable(msg) => {
                AnnotationError::ModelUnavailable(format!("recognizer: {}", msg))
            }
            other => AnnotationError::Recognition(other.to_string()),
        }
    }
}

impl From<LinkerError> for AnnotationError {
    fn from(e: LinkerError) -> Self {
        match e {
            LinkerError::ModelUnavailable(msg) => {
                AnnotationError::ModelUnavailable(format!("linker: {}", msg))
            }
            other => AnnotationError::Linking(other.to_string()),
        }
    }
}

/// Statistics from a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of inputs annotated
    pub inputs: usize,

    /// Inputs that produced at least one record
    pub with_entities: usize,

    /// Total records produced
    pub records: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one annotated input and the number of records it produced.
    pub fn record_input(&mut self, records: usize) {
        self.inputs += 1;
        self.records += records;
        if records > 0 {
            self.with_entities += 1;
        }
    }
}

/// Annotation pipeline coordinator.
///
/// Owns the normalizer, recognizer, linker and semantic type table, all
/// configured once at construction. Several independently configured
/// pipelines can coexist.
pub struct AnnotationPipeline<N, R, L>
where
    N: TextNormalizer,
    R: EntityRecognizer,
    L: ConceptLinker,
{
    normalizer: N,
    recognizer: R,
    linker: L,
    semantic_types: SemanticTypeTable,

    /// Source of ids for inputs that come without one
    id_generator: Box<dyn IdGenerator>,
}

impl<N, R, L> AnnotationPipeline<N, R, L>
where
    N: TextNormalizer,
    R: EntityRecognizer,
    L: ConceptLinker,
{
    /// Create a pipeline that generates random short ids.
    pub fn new(normalizer: N, recognizer: R, linker: L, semantic_types: SemanticTypeTable) -> Self {
        info!(
            "Annotation pipeline ready: model={}, linker={}, semantic types={}",
            recognizer.model_name(),
            linker.config().linker_name,
            semantic_types.len()
        );
        Self {
            normalizer,
            recognizer,
            linker,
            semantic_types,
            id_generator: Box::new(ShortIdGenerator::default()),
        }
    }

    /// Replace the id generator, e.g. with a deterministic one.
    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn linker(&self) -> &L {
        &self.linker
    }

    pub fn semantic_types(&self) -> &SemanticTypeTable {
        &self.semantic_types
    }

    fn ensure_ready(&self) -> AnnotationResult<()> {
        if !self.recognizer.is_ready() {
            return Err(AnnotationError::ModelUnavailable(format!(
                "recognizer '{}' is not initialized",
                self.recognizer.model_name()
            )));
        }
        if !self.linker.is_ready() {
            return Err(AnnotationError::ModelUnavailable(format!(
                "linker '{}' is not initialized",
                self.linker.config().linker_name
            )));
        }
        Ok(())
    }

    /// Extract and link the entities of one text.
    ///
    /// # Arguments
    /// * `text` - The raw input text
    /// * `id` - Input id; a fresh one is generated when `None` or empty
    /// * `include_unlinked` - Also emit a record for mentions without concepts
    ///
    /// # Returns
    /// Records in mention order, and in linker rank order within a mention
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if the recognizer or linker is not
    /// initialized, `UnknownSemanticType` if a concept's type cannot be
    /// resolved, and propagates any other collaborator failure
    pub async fn extract(
        &self,
        text: &str,
        id: Option<&str>,
        include_unlinked: bool,
    ) -> AnnotationResult<Vec<LinkedEntity>> {
        self.ensure_ready()?;

        if text.trim().is_empty() {
            debug!("Skipping empty input text");
            return Ok(Vec::new());
        }

        let input_id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.id_generator.generate(),
        };

        let truecased = self.normalizer.normalize(text).await;
        let mentions = self.recognizer.recognize(&truecased).await?;
        if mentions.is_empty() {
            debug!("No named entities found in text: {}", text);
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for mention in &mentions {
            let candidates = self.linker.link(mention).await?;
            if candidates.is_empty() {
                debug!("No UMLS mappings found for entity: {}", mention.text);
                if include_unlinked {
                    records.push(LinkedEntity::unlinked(&input_id, text, mention));
                }
                continue;
            }

            for candidate in &candidates {
                records.push(self.assemble(&input_id, text, mention, candidate)?);
            }
        }

        Ok(records)
    }

    /// Same as [`extract`](Self::extract), arranged as a table.
    pub async fn extract_table(
        &self,
        text: &str,
        id: Option<&str>,
        include_unlinked: bool,
    ) -> AnnotationResult<EntityTable> {
        self.extract(text, id, include_unlinked).await.map(EntityTable::from)
    }

    /// Annotate every input of a source, concatenating the records.
    ///
    /// Inputs are processed in source order; the first failing input aborts
    /// the run.
    pub async fn extract_from_source<S>(
        &self,
        source: &S,
        include_unlinked: bool,
        progress: Option<&ProgressBar>,
    ) -> AnnotationResult<(Vec<LinkedEntity>, BatchStats)>
    where
        S: TextSource + ?Sized,
    {
        let inputs = source.fetch_inputs().await?;
        info!("Processing {} inputs from {}...", inputs.len(), source.name());

        self.extract_inputs(&inputs, include_unlinked, progress).await
    }

    /// Annotate inputs that were already fetched from a source.
    pub async fn extract_inputs(
        &self,
        inputs: &[TextInput],
        include_unlinked: bool,
        progress: Option<&ProgressBar>,
    ) -> AnnotationResult<(Vec<LinkedEntity>, BatchStats)> {
        let mut records = Vec::new();
        let mut stats = BatchStats::new();
        for input in inputs {
            let extracted = self
                .extract(&input.text, input.id.as_deref(), include_unlinked)
                .await?;
            stats.record_input(extracted.len());
            records.extend(extracted);

            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        Ok((records, stats))
    }

    fn assemble(
        &self,
        input_id: &str,
        input_text: &str,
        mention: &Mention,
        candidate: &ConceptCandidate,
    ) -> AnnotationResult<LinkedEntity> {
        let details = self
            .linker
            .details_of(&candidate.concept_id)
            .ok_or_else(|| AnnotationError::UnknownConcept(candidate.concept_id.clone()))?;
        let labels = self.semantic_types.resolve_labels(&details.types)?;

        Ok(LinkedEntity::linked(
            input_id,
            input_text,
            mention,
            details,
            labels,
            candidate.score,
        ))
    }
}
