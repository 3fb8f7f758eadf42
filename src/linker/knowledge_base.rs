//! UMLS knowledge base and the linker built on it.
//!
//! The knowledge base is read from JSON lines, one concept per line:
//!
//! ```text
//! {"concept_id": "C0011849", "canonical_name": "Diabetes Mellitus",
//!  "aliases": ["DM", "Diabetes"], "types": ["T047"], "definition": "..."}
//! ```
//!
//! Every alias and canonical name is indexed. A mention is scored against the
//! aliases, each concept keeps the score of its best alias, and the ranked
//! concepts are filtered according to the [`LinkerConfig`].

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::tfidf::TrigramIndex;
use super::{ConceptLinker, LinkerConfig, LinkerError, LinkerResult};
use crate::models::{ConceptCandidate, ConceptDetails, Mention};

/// Concepts of a controlled vocabulary, addressable by concept id.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    concepts: Vec<ConceptDetails>,
    by_id: HashMap<String, usize>,
}

impl KnowledgeBase {
    /// Build a knowledge base; a repeated concept id keeps its first entry.
    pub fn new(concepts: Vec<ConceptDetails>) -> Self {
        let mut kept = Vec::with_capacity(concepts.len());
        let mut by_id = HashMap::new();

        for concept in concepts {
            if by_id.contains_key(&concept.concept_id) {
                warn!("Duplicate concept {} ignored", concept.concept_id);
                continue;
            }
            by_id.insert(concept.concept_id.clone(), kept.len());
            kept.push(concept);
        }

        Self { concepts: kept, by_id }
    }

    /// Parse JSON lines; blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> LinkerResult<Self> {
        let mut concepts = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let concept: ConceptDetails = serde_json::from_str(&line)
                .map_err(|e| LinkerError::Parse(format!("line {}: {}", line_no + 1, e)))?;
            concepts.push(concept);
        }
        Ok(Self::new(concepts))
    }

    /// Load a JSON lines file.
    pub fn from_path(path: impl AsRef<Path>) -> LinkerResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let kb = Self::from_reader(std::io::BufReader::new(file))?;
        info!("Loaded {} concepts from {}", kb.len(), path.display());
        Ok(kb)
    }

    pub fn get(&self, concept_id: &str) -> Option<&ConceptDetails> {
        self.by_id.get(concept_id).map(|&idx| &self.concepts[idx])
    }

    pub fn concepts(&self) -> &[ConceptDetails] {
        &self.concepts
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// Linker scoring mentions against knowledge base aliases.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseLinker {
    kb: KnowledgeBase,
    config: LinkerConfig,
    index: TrigramIndex,

    /// Owning concept (position in the KB) of each indexed alias
    alias_concepts: Vec<usize>,
}

impl KnowledgeBaseLinker {
    /// Index the aliases of `kb`.
    pub fn new(kb: KnowledgeBase, config: LinkerConfig) -> Self {
        let mut aliases = Vec::new();
        let mut alias_concepts = Vec::new();

        for (idx, concept) in kb.concepts().iter().enumerate() {
            let mut seen = HashSet::new();
            for alias in std::iter::once(&concept.canonical_name).chain(concept.aliases.iter()) {
                if alias.trim().is_empty() || !seen.insert(alias.to_lowercase()) {
                    continue;
                }
                aliases.push(alias.as_str());
                alias_concepts.push(idx);
            }
        }

        let index = TrigramIndex::build(&aliases);
        debug!(
            "Indexed {} aliases of {} concepts for linker '{}'",
            aliases.len(),
            kb.len(),
            config.linker_name
        );

        Self {
            kb,
            config,
            index,
            alias_concepts,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    fn query_text<'a>(&self, mention: &'a Mention) -> &'a str {
        match &mention.long_form {
            Some(long_form) if self.config.resolve_abbreviations => long_form,
            _ => &mention.text,
        }
    }

    fn rank(&self, query: &str) -> Vec<ConceptCandidate> {
        let mut best: HashMap<usize, f64> = HashMap::new();
        for (alias, score) in self.index.nearest(query, self.config.k) {
            let concept = self.alias_concepts[alias];
            let entry = best.entry(concept).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }

        let mut ranked: Vec<(&ConceptDetails, f64)> = best
            .into_iter()
            .filter(|(_, score)| *score >= self.config.threshold)
            .map(|(idx, score)| (&self.kb.concepts()[idx], score))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.concept_id.cmp(&b.0.concept_id))
        });

        ranked
            .into_iter()
            .filter(|(concept, score)| {
                !self.config.filter_for_definitions
                    || concept.definition.as_deref().is_some_and(|d| !d.is_empty())
                    || *score >= self.config.no_definition_threshold
            })
            .take(self.config.max_entities_per_mention)
            .map(|(concept, score)| ConceptCandidate::new(concept.concept_id.clone(), score))
            .collect()
    }
}

#[async_trait]
impl ConceptLinker for KnowledgeBaseLinker {
    async fn link(&self, mention: &Mention) -> LinkerResult<Vec<ConceptCandidate>> {
        if !self.is_ready() {
            return Err(LinkerError::ModelUnavailable(format!(
                "knowledge base for '{}' is empty",
                self.config.linker_name
            )));
        }
        Ok(self.rank(self.query_text(mention)))
    }

    fn details_of(&self, concept_id: &str) -> Option<&ConceptDetails> {
        self.kb.get(concept_id)
    }

    fn config(&self) -> &LinkerConfig {
        &self.config
    }

    fn is_ready(&self) -> bool {
        !self.index.is_empty()
    }
}
