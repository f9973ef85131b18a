//! Semantic similarity capability
//!
//! Embedding-backed similarity is supplied by the caller; the lexical
//! implementation is the fallback when none is injected.

use super::{coverage, key_terms};

/// Capability: similarity of `candidate` to `reference`, in [0, 1].
///
/// Implementations must be deterministic for the engine's determinism
/// guarantees to hold.
pub trait SimilarityProvider: Send + Sync {
    fn similarity(&self, reference: &str, candidate: &str) -> f64;
}

/// Fraction of the reference's key terms that the candidate covers
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityProvider for LexicalSimilarity {
    fn similarity(&self, reference: &str, candidate: &str) -> f64 {
        coverage(&key_terms(reference), &key_terms(candidate)).clamp(0.0, 1.0)
    }
}
