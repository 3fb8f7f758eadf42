//! Core data models for the annotation pipeline.
//!
//! This module contains the data structures shared across the crate: the
//! mentions produced by a recognizer, the candidates and concept details produced
//! by a linker, and the flat [`LinkedEntity`] record that is the unit of output.

use serde::{Deserialize, Serialize};

/// An entity span found by a recognizer.
///
/// Offsets are byte positions into the text that was handed to the recognizer
/// (the normalized text, not the caller's original input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Surface text of the mention
    pub text: String,

    /// Coarse entity type assigned by the recognizer (e.g. "DISEASE", "ENTITY")
    pub label: String,

    /// Start byte offset (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Expanded form when the mention is an abbreviation defined in the same text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_form: Option<String>,
}

impl Mention {
    /// Create a mention without an abbreviation expansion.
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            start,
            end,
            long_form: None,
        }
    }

    /// Attach the long form this abbreviation stands for.
    pub fn with_long_form(mut self, long_form: impl Into<String>) -> Self {
        self.long_form = Some(long_form.into());
        self
    }
}

/// One ranked link result for a mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCandidate {
    /// Vocabulary concept identifier (a UMLS CUI such as "C0011849")
    pub concept_id: String,

    /// Raw similarity score reported by the linker
    pub score: f64,
}

impl ConceptCandidate {
    pub fn new(concept_id: impl Into<String>, score: f64) -> Self {
        Self {
            concept_id: concept_id.into(),
            score,
        }
    }
}

/// Descriptive metadata of a concept in the linker's knowledge base.
///
/// Field names follow the JSON lines layout of the UMLS knowledge base files,
/// so a KB line deserializes straight into this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDetails {
    pub concept_id: String,

    pub canonical_name: String,

    /// Free-text definition, absent for many concepts
    #[serde(default)]
    pub definition: Option<String>,

    /// Semantic type identifiers (TUIs), in vocabulary order
    #[serde(default)]
    pub types: Vec<String>,

    /// Synonyms of the concept
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Round a linker score to three decimal places.
///
/// Rounds the exact binary value once, so `0.0045` (stored just below the tie)
/// becomes `0.004`.
pub fn round_score(score: f64) -> f64 {
    format!("{:.3}", score).parse().unwrap_or(score)
}

/// The flat output record of the pipeline.
///
/// A record is either one mention linked to one concept candidate, or one
/// unlinked mention (only produced when the caller asks for unlinked entities).
/// Unlinked records carry empty strings in every concept-derived field and no
/// mapping score.
///
/// The field order is the column order of every tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub input_id: String,
    pub input_text: String,
    pub entity: String,
    pub entity_type: String,
    pub umls_cui: String,
    pub umls_label: String,
    pub umls_semantic_type_ids: String,
    pub umls_semantic_type_labels: String,
    pub umls_definition: String,
    pub umls_synonyms: String,
    pub umls_mapping_score: Option<f64>,
}

impl LinkedEntity {
    /// Column names, in output order.
    pub const COLUMNS: [&'static str; 11] = [
        "input_id",
        "input_text",
        "entity",
        "entity_type",
        "umls_cui",
        "umls_label",
        "umls_semantic_type_ids",
        "umls_semantic_type_labels",
        "umls_definition",
        "umls_synonyms",
        "umls_mapping_score",
    ];

    /// Build a record for a mention linked to a concept.
    ///
    /// `semantic_type_labels` must already be resolved, in the same order as
    /// `details.types`. The score is rounded to three decimals here.
    pub fn linked(
        input_id: &str,
        input_text: &str,
        mention: &Mention,
        details: &ConceptDetails,
        semantic_type_labels: String,
        score: f64,
    ) -> Self {
        Self {
            input_id: input_id.to_string(),
            input_text: input_text.to_string(),
            entity: mention.text.clone(),
            entity_type: mention.label.clone(),
            umls_cui: details.concept_id.clone(),
            umls_label: details.canonical_name.clone(),
            umls_semantic_type_ids: details.types.join(","),
            umls_semantic_type_labels: semantic_type_labels,
            umls_definition: details.definition.clone().unwrap_or_default(),
            umls_synonyms: details.aliases.join(", "),
            umls_mapping_score: Some(round_score(score)),
        }
    }

    /// Build a record for a mention that has no linked concept.
    pub fn unlinked(input_id: &str, input_text: &str, mention: &Mention) -> Self {
        Self {
            input_id: input_id.to_string(),
            input_text: input_text.to_string(),
            entity: mention.text.clone(),
            entity_type: mention.label.clone(),
            umls_cui: String::new(),
            umls_label: String::new(),
            umls_semantic_type_ids: String::new(),
            umls_semantic_type_labels: String::new(),
            umls_definition: String::new(),
            umls_synonyms: String::new(),
            umls_mapping_score: None,
        }
    }

    /// Whether this record carries a concept link.
    pub fn is_linked(&self) -> bool {
        self.umls_mapping_score.is_some()
    }

    /// The mapping score as it appears in tabular output ("" when unlinked).
    pub fn score_text(&self) -> String {
        match self.umls_mapping_score {
            Some(score) if score.fract() == 0.0 => format!("{:.1}", score),
            Some(score) => score.to_string(),
            None => String::new(),
        }
    }

    /// Flattened `(column, value)` pairs in column order.
    pub fn fields(&self) -> [(&'static str, String); 11] {
        let row = self.to_row();
        let mut values = row.into_iter();
        Self::COLUMNS.map(|column| (column, values.next().unwrap_or_default()))
    }

    /// Field values in column order.
    pub fn to_row(&self) -> [String; 11] {
        [
            self.input_id.clone(),
            self.input_text.clone(),
            self.entity.clone(),
            self.entity_type.clone(),
            self.umls_cui.clone(),
            self.umls_label.clone(),
            self.umls_semantic_type_ids.clone(),
            self.umls_semantic_type_labels.clone(),
            self.umls_definition.clone(),
            self.umls_synonyms.clone(),
            self.score_text(),
        ]
    }
}

/// Records arranged as a table with the fixed [`LinkedEntity::COLUMNS`] order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTable {
    records: Vec<LinkedEntity>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &LinkedEntity::COLUMNS
    }

    /// Flattened rows, in record order.
    pub fn rows(&self) -> impl Iterator<Item = [String; 11]> + '_ {
        self.records.iter().map(LinkedEntity::to_row)
    }

    pub fn records(&self) -> &[LinkedEntity] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LinkedEntity> {
        self.records
    }

    /// Append records after the existing rows.
    pub fn extend(&mut self, records: impl IntoIterator<Item = LinkedEntity>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<LinkedEntity>> for EntityTable {
    fn from(records: Vec<LinkedEntity>) -> Self {
        Self { records }
    }
}
