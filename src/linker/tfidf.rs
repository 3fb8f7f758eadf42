//! Character trigram TF-IDF index.
//!
//! Strings are lowercased, split on whitespace, and each word is padded with a
//! space on both sides before taking character trigrams, so "dm" yields
//! `" dm"` and `"dm "`. Trigram weights are term frequency times smoothed
//! inverse document frequency, and every vector is L2-normalized, which makes
//! the dot product of two vectors their cosine similarity.

use std::collections::HashMap;

/// Trigram counts of a string.
pub fn char_trigrams(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text.to_lowercase().split_whitespace() {
        let padded: Vec<char> = format!(" {} ", word).chars().collect();
        for window in padded.windows(3) {
            *counts.entry(window.iter().collect::<String>()).or_insert(0) += 1;
        }
    }
    counts
}

/// Inverted index over a fixed set of documents.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    /// Smoothed IDF per trigram
    idf: HashMap<String, f64>,

    /// Trigram -> (document, normalized weight)
    postings: HashMap<String, Vec<(usize, f64)>>,

    documents: usize,
}

impl TrigramIndex {
    /// Index `documents`; document ids are their positions.
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|d| char_trigrams(d.as_ref()))
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for trigrams in &counts {
            for trigram in trigrams.keys() {
                *document_frequency.entry(trigram.as_str()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(trigram, df)| (trigram.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let mut postings: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
        for (doc, trigrams) in counts.iter().enumerate() {
            for (trigram, weight) in weigh(trigrams, &idf) {
                postings.entry(trigram).or_default().push((doc, weight));
            }
        }

        Self {
            idf,
            postings,
            documents: documents.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// The `k` most similar documents to `query`, best first.
    ///
    /// Documents sharing no trigram with the query are never returned. Ties
    /// are broken by document id.
    pub fn nearest(&self, query: &str, k: usize) -> Vec<(usize, f64)> {
        let query_weights = weigh(&char_trigrams(query), &self.idf);

        let mut scores: HashMap<usize, f64> = HashMap::new();
        for (trigram, query_weight) in &query_weights {
            if let Some(postings) = self.postings.get(trigram) {
                for (doc, weight) in postings {
                    *scores.entry(*doc).or_insert(0.0) += query_weight * weight;
                }
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

/// L2-normalized TF-IDF weights; trigrams without an IDF are dropped.
fn weigh(counts: &HashMap<String, usize>, idf: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let weights: Vec<(String, f64)> = counts
        .iter()
        .filter_map(|(trigram, tf)| idf.get(trigram).map(|idf| (trigram.clone(), *tf as f64 * idf)))
        .collect();

    let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Vec::new();
    }
    weights.into_iter().map(|(t, w)| (t, w / norm)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_trigrams_pad_words() {
        let trigrams = char_trigrams("DM");
        assert_eq!(trigrams.len(), 2);
        assert!(trigrams.contains_key(" dm"));
        assert!(trigrams.contains_key("dm "));
    }

    #[test]
    fn test_char_trigrams_count_repeats() {
        let trigrams = char_trigrams("aaaa");
        assert_eq!(trigrams.get("aaa"), Some(&2));
    }

    #[test]
    fn test_exact_match_scores_one() {
        let index = TrigramIndex::build(&["diabetes mellitus", "asthma", "hypertension"]);
        let results = index.nearest("Diabetes Mellitus", 3);

        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similar_strings_rank_higher() {
        let index = TrigramIndex::build(&["hypertension", "hypotension", "asthma"]);
        let results = index.nearest("hypertensive", 3);

        assert_eq!(results[0].0, 0);
        assert!(results.iter().all(|(doc, _)| *doc != 2));
    }

    #[test]
    fn test_unknown_query_has_no_results() {
        let index = TrigramIndex::build(&["asthma"]);
        assert!(index.nearest("xyz", 5).is_empty());
    }

    #[test]
    fn test_k_limits_results() {
        let index = TrigramIndex::build(&["renal failure", "renal disease", "renal cyst"]);
        assert_eq!(index.nearest("renal", 2).len(), 2);
    }
}
