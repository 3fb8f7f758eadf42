//! Input identifier generation.
//!
//! Every record carries the id of the text it came from. When the caller does
//! not supply one, the pipeline asks its [`IdGenerator`] for a fresh id.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// Default length of generated ids.
pub const DEFAULT_ID_LENGTH: usize = 10;

/// URL-safe alphabet without look-alike characters (0/O, 1/l/I).
pub const SHORT_ID_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Source of input identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier.
    fn generate(&self) -> String;
}

/// Random fixed-length ids over [`SHORT_ID_ALPHABET`].
#[derive(Debug, Clone)]
pub struct ShortIdGenerator {
    length: usize,
}

impl ShortIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for ShortIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl IdGenerator for ShortIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| SHORT_ID_ALPHABET[rng.gen_range(0..SHORT_ID_ALPHABET.len())] as char)
            .collect()
    }
}

/// Deterministic ids (`<prefix>-1`, `<prefix>-2`, ...), for reproducible runs.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_short_id_length_and_alphabet() {
        let generator = ShortIdGenerator::default();
        let id = generator.generate();
        assert_eq!(id.len(), DEFAULT_ID_LENGTH);
        assert!(id.bytes().all(|b| SHORT_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_short_ids_are_distinct() {
        let generator = ShortIdGenerator::new(12);
        let ids: HashSet<String> = (0..200).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_sequential_ids() {
        let generator = SequentialIdGenerator::new("doc");
        assert_eq!(generator.generate(), "doc-1");
        assert_eq!(generator.generate(), "doc-2");
    }
}
