//! Lexicon-based entity recognizer.
//!
//! Terms from a lexicon are matched case-insensitively over word tokens,
//! greedily taking the longest match and never overlapping. With abbreviation
//! detection on, short forms defined in the text (`diabetes mellitus (DM)`) are
//! recognized wherever they occur and carry their long form for the linker.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{find_abbreviations, EntityRecognizer, RecognizerError, RecognizerResult};
use crate::models::Mention;

/// One term of a lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub label: String,
}

/// Lexicon file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    /// Model name reported by the recognizer
    #[serde(default)]
    pub name: Option<String>,

    pub entries: Vec<LexiconEntry>,
}

/// A word token with its byte span.
#[derive(Debug, Clone)]
struct Token<'a> {
    text: &'a str,
    lower: String,
    start: usize,
    end: usize,
}

/// Recognizer matching lexicon terms.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    model_name: String,

    /// Lowercased term tokens to label; the first entry for a term wins
    terms: HashMap<Vec<String>, String>,

    /// Longest term, in tokens
    max_term_tokens: usize,

    detect_abbreviations: bool,

    word: Regex,
}

impl GazetteerRecognizer {
    /// Create a recognizer from lexicon entries.
    pub fn new(model_name: impl Into<String>, entries: Vec<LexiconEntry>) -> Self {
        let word = Regex::new(r"\w+").expect("valid word pattern");
        let mut terms = HashMap::new();
        let mut max_term_tokens = 0;

        for entry in entries {
            let key: Vec<String> = word
                .find_iter(&entry.term)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            if key.is_empty() {
                continue;
            }
            max_term_tokens = max_term_tokens.max(key.len());
            terms.entry(key).or_insert(entry.label);
        }

        Self {
            model_name: model_name.into(),
            terms,
            max_term_tokens,
            detect_abbreviations: true,
            word,
        }
    }

    /// Load a lexicon stored as JSON.
    ///
    /// When the file carries no `name`, the file stem becomes the model name.
    pub fn from_path(path: impl AsRef<Path>) -> RecognizerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let lexicon: Lexicon = serde_json::from_str(&content)
            .map_err(|e| RecognizerError::Parse(format!("{}: {}", path.display(), e)))?;

        let name = lexicon.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "gazetteer".to_string())
        });
        let recognizer = Self::new(name, lexicon.entries);
        info!(
            "Loaded lexicon '{}' with {} terms from {}",
            recognizer.model_name,
            recognizer.len(),
            path.display()
        );
        Ok(recognizer)
    }

    /// Enable or disable abbreviation detection (enabled by default).
    pub fn with_abbreviations(mut self, enabled: bool) -> Self {
        self.detect_abbreviations = enabled;
        self
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        self.word
            .find_iter(text)
            .map(|m| Token {
                text: m.as_str(),
                lower: m.as_str().to_lowercase(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    fn lookup(&self, tokens: &[Token<'_>]) -> Option<&String> {
        let key: Vec<String> = tokens.iter().map(|t| t.lower.clone()).collect();
        self.terms.get(&key)
    }

    /// Terms may span whitespace and hyphens, but not other punctuation.
    fn contiguous(text: &str, tokens: &[Token<'_>]) -> bool {
        tokens.windows(2).all(|pair| {
            text[pair[0].end..pair[1].start]
                .chars()
                .all(|c| c.is_whitespace() || c == '-')
        })
    }

    fn match_terms(&self, text: &str, tokens: &[Token<'_>]) -> Vec<Mention> {
        let mut mentions = Vec::new();
        let mut i = 0;

        'outer: while i < tokens.len() {
            let longest = self.max_term_tokens.min(tokens.len() - i);
            for len in (1..=longest).rev() {
                let window = &tokens[i..i + len];
                if !Self::contiguous(text, window) {
                    continue;
                }
                if let Some(label) = self.lookup(window) {
                    let start = window[0].start;
                    let end = window[len - 1].end;
                    mentions.push(Mention::new(&text[start..end], label.clone(), start, end));
                    i += len;
                    continue 'outer;
                }
            }
            i += 1;
        }

        mentions
    }

    fn label_of_phrase(&self, phrase: &str) -> Option<&String> {
        let tokens = self.tokenize(phrase);
        if tokens.is_empty() {
            return None;
        }
        self.lookup(&tokens)
    }

    /// Attach long forms to matched short forms and add short forms the
    /// lexicon does not know about but whose long form it does.
    fn apply_abbreviations(&self, text: &str, tokens: &[Token<'_>], mentions: &mut Vec<Mention>) {
        let abbreviations = find_abbreviations(text);
        if abbreviations.is_empty() {
            return;
        }
        debug!("Detected {} abbreviation definitions", abbreviations.len());

        for abbreviation in &abbreviations {
            for mention in mentions.iter_mut() {
                if mention.text == abbreviation.short_form {
                    mention.long_form = Some(abbreviation.long_form.clone());
                }
            }

            let Some(label) = self.label_of_phrase(&abbreviation.long_form) else {
                continue;
            };
            for token in tokens.iter().filter(|t| t.text == abbreviation.short_form) {
                let covered = mentions
                    .iter()
                    .any(|m| m.start < token.end && token.start < m.end);
                if !covered {
                    mentions.push(
                        Mention::new(token.text, label.clone(), token.start, token.end)
                            .with_long_form(abbreviation.long_form.clone()),
                    );
                }
            }
        }

        mentions.sort_by_key(|m| m.start);
    }
}

#[async_trait]
impl EntityRecognizer for GazetteerRecognizer {
    async fn recognize(&self, text: &str) -> RecognizerResult<Vec<Mention>> {
        if !self.is_ready() {
            return Err(RecognizerError::ModelUnavailable(format!(
                "lexicon '{}' has no terms",
                self.model_name
            )));
        }

        let tokens = self.tokenize(text);
        let mut mentions = self.match_terms(text, &tokens);
        if self.detect_abbreviations {
            self.apply_abbreviations(text, &tokens, &mut mentions);
        }
        Ok(mentions)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(term: &str, label: &str) -> LexiconEntry {
        LexiconEntry {
            term: term.to_string(),
            label: label.to_string(),
        }
    }

    fn create_test_recognizer() -> GazetteerRecognizer {
        GazetteerRecognizer::new(
            "test-lexicon",
            vec![
                entry("diabetes", "DISEASE"),
                entry("diabetes mellitus", "DISEASE"),
                entry("type 2 diabetes mellitus", "DISEASE"),
                entry("metformin", "CHEMICAL"),
                entry("kidney", "ANATOMY"),
                entry("chronic kidney disease", "DISEASE"),
            ],
        )
    }

    #[tokio::test]
    async fn test_single_term() {
        let recognizer = create_test_recognizer();
        let mentions = recognizer.recognize("Patient has diabetes.").await.unwrap();

        assert_eq!(mentions, vec![Mention::new("diabetes", "DISEASE", 12, 20)]);
    }

    #[tokio::test]
    async fn test_longest_match_wins() {
        let recognizer = create_test_recognizer();
        let mentions = recognizer
            .recognize("History of Type 2 Diabetes Mellitus treated with Metformin")
            .await
            .unwrap();

        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Type 2 Diabetes Mellitus", "Metformin"]);
        assert_eq!(mentions[1].label, "CHEMICAL");
    }

    #[tokio::test]
    async fn test_terms_do_not_span_punctuation() {
        let recognizer = create_test_recognizer();
        let mentions = recognizer.recognize("chronic kidney, disease").await.unwrap();

        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["kidney"]);
    }

    #[tokio::test]
    async fn test_no_mentions() {
        let recognizer = create_test_recognizer();
        assert!(recognizer.recognize("The weather is fine.").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abbreviation_mentions() {
        let recognizer = create_test_recognizer();
        let text = "Chronic kidney disease (CKD) progressed. CKD stage 4.";
        let mentions = recognizer.recognize(text).await.unwrap();

        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Chronic kidney disease", "CKD", "CKD"]);
        assert!(mentions[0].long_form.is_none());
        assert_eq!(mentions[1].long_form.as_deref(), Some("Chronic kidney disease"));
        assert_eq!(mentions[2].label, "DISEASE");
    }

    #[tokio::test]
    async fn test_abbreviations_disabled() {
        let recognizer = create_test_recognizer().with_abbreviations(false);
        let mentions = recognizer
            .recognize("Chronic kidney disease (CKD) progressed.")
            .await
            .unwrap();
        assert_eq!(mentions.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_lexicon_is_unavailable() {
        let recognizer = GazetteerRecognizer::new("empty", vec![]);
        assert!(!recognizer.is_ready());
        assert!(matches!(
            recognizer.recognize("diabetes").await,
            Err(RecognizerError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_from_path_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en_demo.json");
        std::fs::write(&path, r#"{"entries": [{"term": "asthma", "label": "DISEASE"}]}"#).unwrap();

        let recognizer = GazetteerRecognizer::from_path(&path).unwrap();
        assert_eq!(recognizer.model_name(), "en_demo");
        assert_eq!(recognizer.len(), 1);
    }
}
