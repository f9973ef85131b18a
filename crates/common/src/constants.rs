//! Fixed scoring constants.
//!
//! Thresholds and penalty multipliers shared by the Scorer, Verifier and
//! RefinementLoop. Each value is defined once here and imported everywhere
//! else.

// Relevance

/// Pages scoring below this are excluded from gathering (hard cut).
pub const RELEVANCE_THRESHOLD: f64 = 0.4;

pub const KEYWORD_WEIGHT: f64 = 0.35;
pub const ENTITY_WEIGHT: f64 = 0.25;
pub const SEMANTIC_WEIGHT: f64 = 0.25;
pub const TYPE_ALIGNMENT_WEIGHT: f64 = 0.15;

/// Type-alignment sub-score for question types with no alignment signal.
pub const NEUTRAL_TYPE_ALIGNMENT: f64 = 0.5;

// Evidence classification

/// Question-term coverage at which a declarative passage counts as direct.
pub const DIRECT_COVERAGE: f64 = 0.5;

/// Term overlap at which two items are treated as topically similar.
pub const TOPICAL_OVERLAP: f64 = 0.5;

// Certainty

pub const HIGH_CERTAINTY: f64 = 0.85;
pub const MEDIUM_CERTAINTY: f64 = 0.60;

pub const INFERRED_PENALTY: f64 = 0.10;
pub const INDIRECT_PENALTY: f64 = 0.30;
pub const SINGLE_SOURCE_FACTOR: f64 = 0.90;
pub const CALCULATION_FACTOR: f64 = 0.85;
pub const CONTRADICTION_FACTOR: f64 = 0.70;
pub const AMBIGUITY_FACTOR: f64 = 0.80;

// Completeness proxies

pub const DIRECT_QUALITY_PROXY: f64 = 1.0;
pub const INFERRED_QUALITY_PROXY: f64 = 0.7;
pub const INDIRECT_QUALITY_PROXY: f64 = 0.4;

/// Evidence count at which the quantity proxy saturates.
pub const TARGET_EVIDENCE_COUNT: usize = 3;

// Scope alignment

pub const EXACT_SIMILARITY: f64 = 0.85;
pub const EXACT_ENTITY_OVERLAP: f64 = 0.8;
pub const SHIFTED_SIMILARITY: f64 = 0.5;
pub const BROADER_ENTITY_RATIO: f64 = 1.5;

// Verification

/// Minimum verification score for an answer to pass.
pub const PASS_THRESHOLD: f64 = 0.85;

/// Minimum term overlap for a claim to count as backed by a source.
pub const CLAIM_SUPPORT_OVERLAP: f64 = 0.3;
