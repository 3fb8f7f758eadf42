//! Dictionary-based truecaser.
//!
//! Each word is looked up (lowercased) in a casing dictionary and replaced by
//! its preferred form, e.g. "dna" -> "DNA" or "parkinson" -> "Parkinson".
//! Sentence-initial words missing from the dictionary get an uppercase first
//! letter; all other words are left alone. Only word characters are ever
//! rewritten, so whitespace and punctuation come through unchanged.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{NormalizerError, NormalizerResult, TextNormalizer};

/// Truecaser backed by a `lowercase word -> preferred form` dictionary.
#[derive(Debug, Clone)]
pub struct TrueCaser {
    casing: HashMap<String, String>,
    word: Regex,
}

impl TrueCaser {
    /// Create a truecaser from a casing dictionary.
    ///
    /// Keys are lowercased; when two keys collide the later entry wins.
    pub fn new(casing: HashMap<String, String>) -> Self {
        let casing = casing
            .into_iter()
            .map(|(word, form)| (word.to_lowercase(), form))
            .collect();
        Self {
            casing,
            word: Regex::new(r"\w+").expect("valid word pattern"),
        }
    }

    /// Build the dictionary from preferred word forms.
    ///
    /// The first form seen for a given lowercase word is kept.
    pub fn from_forms<I, S>(forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut casing = HashMap::new();
        for form in forms {
            let form = form.into();
            casing.entry(form.to_lowercase()).or_insert(form);
        }
        Self::new(casing)
    }

    /// Load a casing dictionary stored as a JSON object.
    pub fn from_path(path: impl AsRef<Path>) -> NormalizerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let casing: HashMap<String, String> = serde_json::from_str(&content)
            .map_err(|e| NormalizerError::Parse(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded casing dictionary with {} words from {}", casing.len(), path.display());
        Ok(Self::new(casing))
    }

    /// Number of words in the dictionary.
    pub fn len(&self) -> usize {
        self.casing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casing.is_empty()
    }

    /// Truecase `text` synchronously.
    pub fn truecase(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut sentence_start = true;

        for word in self.word.find_iter(text) {
            let gap = &text[last..word.start()];
            if gap.contains(['.', '!', '?']) {
                sentence_start = true;
            }
            output.push_str(gap);

            let token = word.as_str();
            match self.casing.get(&token.to_lowercase()) {
                Some(form) if sentence_start => output.push_str(&capitalize(form)),
                Some(form) => output.push_str(form),
                None if sentence_start => output.push_str(&capitalize(token)),
                None => output.push_str(token),
            }

            sentence_start = false;
            last = word.end();
        }

        output.push_str(&text[last..]);
        output
    }
}

impl Default for TrueCaser {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl TextNormalizer for TrueCaser {
    async fn normalize(&self, text: &str) -> String {
        self.truecase(text)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biomedical_caser() -> TrueCaser {
        TrueCaser::from_forms(["DNA", "Parkinson", "BRCA1", "mRNA"])
    }

    #[test]
    fn test_sentence_initial_capitalization() {
        let caser = TrueCaser::default();
        assert_eq!(caser.truecase("patient has diabetes."), "Patient has diabetes.");
        assert_eq!(
            caser.truecase("first sentence. second one! third? yes"),
            "First sentence. Second one! Third? Yes"
        );
    }

    #[test]
    fn test_dictionary_forms() {
        let caser = biomedical_caser();
        assert_eq!(
            caser.truecase("the patient has parkinson disease and brca1 mutations in dna"),
            "The patient has Parkinson disease and BRCA1 mutations in DNA"
        );
    }

    #[test]
    fn test_dictionary_form_at_sentence_start() {
        let caser = biomedical_caser();
        assert_eq!(caser.truecase("mrna levels rose."), "MRNA levels rose.");
    }

    #[test]
    fn test_preserves_layout() {
        let caser = TrueCaser::default();
        let text = "  two  spaces,\ttab (parens)";
        let truecased = caser.truecase(text);
        assert_eq!(truecased.len(), text.len());
        assert_eq!(truecased, "  Two  spaces,\ttab (parens)");
    }

    #[test]
    fn test_keeps_unknown_mixed_case() {
        let caser = TrueCaser::default();
        assert_eq!(caser.truecase("Aspirin and IL6 levels"), "Aspirin and IL6 levels");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(TrueCaser::default().truecase(""), "");
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casing.json");
        std::fs::write(&path, r#"{"dna": "DNA", "rna": "RNA"}"#).unwrap();

        let caser = TrueCaser::from_path(&path).unwrap();
        assert_eq!(caser.len(), 2);
        assert_eq!(caser.truecase("dna and rna"), "DNA and RNA");
    }

    #[test]
    fn test_from_path_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casing.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(TrueCaser::from_path(&path), Err(NormalizerError::Parse(_))));
    }
}
