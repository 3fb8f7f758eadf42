//! UMLS NER - Biomedical entity extraction and concept linking.
//!
//! This library finds biomedical entity mentions in free text and links each
//! one to concepts of the UMLS controlled vocabulary, producing flat records
//! that carry the concept id, canonical name, definition, synonyms, semantic
//! types and a similarity score.
//!
//! # Architecture
//!
//! The system is organized into several key modules:
//!
//! - **models**: Core data structures (Mention, ConceptDetails, LinkedEntity, etc.)
//! - **normalizer**: Truecasing of raw text ahead of recognition
//! - **recognizer**: Entity recognition (lexicon matcher, abbreviation detection)
//! - **linker**: Concept linking over a UMLS knowledge base (trigram TF-IDF)
//! - **semantic_types**: UMLS semantic type table and label resolution
//! - **identifier**: Short id generation for inputs without an id
//! - **pipeline**: The annotation pipeline tying the above together
//! - **source**: Batch inputs (string lists, line files, TSV/CSV tables)
//! - **output**: TSV result files
//!
//! # Workflow
//!
//! 1. Truecase the input text
//! 2. Recognize entity mentions in the truecased text
//! 3. Link every mention to ranked vocabulary concepts
//! 4. Resolve each concept's semantic type ids to labels
//! 5. Emit one record per (mention, concept) pair
//!
//! # Example
//!
//! ```ignore
//! use umls_ner::{
//!     linker::{KnowledgeBase, KnowledgeBaseLinker, LinkerConfig},
//!     normalizer::TrueCaser,
//!     pipeline::AnnotationPipeline,
//!     recognizer::GazetteerRecognizer,
//!     semantic_types::SemanticTypeTable,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Set up components
//!     let recognizer = GazetteerRecognizer::from_path("lexicon.json")?;
//!     let kb = KnowledgeBase::from_path("kb.jsonl")?;
//!     let linker = KnowledgeBaseLinker::new(kb, LinkerConfig::default());
//!     let pipeline = AnnotationPipeline::new(
//!         TrueCaser::default(),
//!         recognizer,
//!         linker,
//!         SemanticTypeTable::bundled()?,
//!     );
//!
//!     // Annotate
//!     let records = pipeline.extract("Patient has diabetes.", Some("p1"), false).await?;
//!     for record in records {
//!         println!("{}: {} {}", record.entity, record.umls_cui, record.score_text());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Public modules
pub mod identifier;
pub mod linker;
pub mod models;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod recognizer;
pub mod semantic_types;
pub mod source;

// Re-export commonly used types at the crate root
pub use linker::{ConceptLinker, LinkerConfig};
pub use models::{ConceptCandidate, ConceptDetails, EntityTable, LinkedEntity, Mention};
pub use normalizer::TextNormalizer;
pub use pipeline::{AnnotationError, AnnotationPipeline, BatchStats};
pub use recognizer::EntityRecognizer;
pub use semantic_types::SemanticTypeTable;
pub use source::{TextInput, TextSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default recognizer model name
pub const DEFAULT_MODEL: &str = "en_core_sci_scibert";
