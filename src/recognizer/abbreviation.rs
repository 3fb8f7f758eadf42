//! Abbreviation detection.
//!
//! Finds definitions of the form `long form (SF)` using the Schwartz & Hearst
//! algorithm: walk the short form right to left, matching each character to the
//! long form candidate, and require the first short form character to start a
//! word.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// A short form defined in the text together with its expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    pub short_form: String,
    pub long_form: String,

    /// Byte offset of the short form inside the parentheses
    pub start: usize,
    pub end: usize,
}

fn parenthesized() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^()]{1,12})\)").expect("valid parenthesis pattern"))
}

/// Detect abbreviation definitions in `text`.
///
/// Only the first definition of each short form is returned, in text order.
pub fn find_abbreviations(text: &str) -> Vec<Abbreviation> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for captures in parenthesized().captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        let short_form = inner.as_str().trim();
        if !is_short_form_candidate(short_form) || seen.contains(short_form) {
            continue;
        }

        let preceding = sentence_tail(&text[..whole.start()]);
        let sf_len = short_form.chars().count();
        let max_words = (sf_len + 5).min(sf_len * 2);
        let words: Vec<&str> = preceding.split_whitespace().collect();
        let candidate = words[words.len().saturating_sub(max_words)..].join(" ");

        if let Some(long_form) = best_long_form(short_form, &candidate) {
            let offset = inner.start() + (inner.as_str().len() - inner.as_str().trim_start().len());
            seen.insert(short_form.to_string());
            found.push(Abbreviation {
                short_form: short_form.to_string(),
                long_form,
                start: offset,
                end: offset + short_form.len(),
            });
        }
    }

    found
}

fn is_short_form_candidate(candidate: &str) -> bool {
    let len = candidate.chars().count();
    (2..=10).contains(&len)
        && candidate.split_whitespace().count() <= 2
        && candidate.chars().next().is_some_and(char::is_alphanumeric)
        && candidate.chars().any(char::is_alphabetic)
}

/// Text after the last clause boundary.
fn sentence_tail(text: &str) -> &str {
    match text.rfind(['.', ';', ':', '!', '?']) {
        Some(idx) => &text[idx + 1..],
        None => text,
    }
}

/// Lowercase char by char, so position `i` still refers to the `i`th char of `text`.
fn lowercase_chars(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Schwartz & Hearst long form search.
fn best_long_form(short_form: &str, candidate: &str) -> Option<String> {
    let sf = lowercase_chars(short_form);
    let lf = lowercase_chars(candidate);

    let mut s_idx = sf.len() as isize - 1;
    let mut l_idx = lf.len() as isize - 1;

    while s_idx >= 0 {
        let c = sf[s_idx as usize];
        if !c.is_alphanumeric() {
            s_idx -= 1;
            continue;
        }

        while l_idx >= 0
            && (lf[l_idx as usize] != c
                || (s_idx == 0 && l_idx > 0 && lf[l_idx as usize - 1].is_alphanumeric()))
        {
            l_idx -= 1;
        }
        if l_idx < 0 {
            return None;
        }

        l_idx -= 1;
        s_idx -= 1;
    }

    let start = (l_idx + 1) as usize;
    let original: Vec<char> = candidate.chars().collect();
    let long_form: String = original[start..].iter().collect();
    let long_form = long_form.trim().to_string();

    // A long form must be longer than its abbreviation and cannot be it.
    if long_form.chars().count() <= short_form.chars().count()
        || long_form.eq_ignore_ascii_case(short_form)
    {
        return None;
    }
    Some(long_form)
}
