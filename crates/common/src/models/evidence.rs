//! Evidence and detection models

use serde::{Deserialize, Serialize};

use crate::constants::{
    DIRECT_QUALITY_PROXY, INDIRECT_PENALTY, INDIRECT_QUALITY_PROXY, INFERRED_PENALTY,
    INFERRED_QUALITY_PROXY,
};

/// How directly a passage supports the question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceQuality {
    Direct,
    Inferred,
    Indirect,
}

impl EvidenceQuality {
    /// Multiplicative certainty penalty for one item of this quality
    pub fn certainty_penalty(&self) -> f64 {
        match self {
            EvidenceQuality::Direct => 0.0,
            EvidenceQuality::Inferred => INFERRED_PENALTY,
            EvidenceQuality::Indirect => INDIRECT_PENALTY,
        }
    }

    /// Contribution to the completeness quality proxy
    pub fn completeness_proxy(&self) -> f64 {
        match self {
            EvidenceQuality::Direct => DIRECT_QUALITY_PROXY,
            EvidenceQuality::Inferred => INFERRED_QUALITY_PROXY,
            EvidenceQuality::Indirect => INDIRECT_QUALITY_PROXY,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    ExplicitStatement,
    NumericalData,
    ContextualInterpretation,
    CrossReference,
}

/// A verbatim passage from one page of the slice.
///
/// Items are never mutated after scoring; refinement may only drop them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceItem {
    pub quote: String,
    pub page: u32,
    pub quality: EvidenceQuality,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub relevance_score: f64,
    /// Allowed to exceed the quote word limit
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub essential: bool,
}

impl EvidenceItem {
    pub fn reference(&self) -> EvidenceRef {
        EvidenceRef {
            page: self.page,
            quote: self.quote.clone(),
        }
    }

    pub fn matches(&self, reference: &EvidenceRef) -> bool {
        self.page == reference.page && self.quote == reference.quote
    }
}

/// Pointer to an evidence item by page and quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvidenceRef {
    pub page: u32,
    pub quote: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    NumericalConflict,
    QualitativeConflict,
}

/// Two evidence items that disagree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contradiction {
    #[serde(rename = "type")]
    pub kind: ContradictionType,
    pub evidence: Vec<EvidenceRef>,
    pub resolution: String,
    pub confidence: f64,
}

impl Contradiction {
    /// Order-independent identity used when diffing detector output
    pub fn key(&self) -> (ContradictionType, Vec<EvidenceRef>) {
        let mut refs = self.evidence.clone();
        refs.sort();
        (self.kind, refs)
    }

    pub fn involves(&self, item: &EvidenceItem) -> bool {
        self.evidence.iter().any(|r| item.matches(r))
    }
}

/// A pointer from one page to content elsewhere
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossReference {
    pub mention: String,
    pub target: String,
    pub source_page: u32,
    pub in_slice: bool,
    pub impact: String,
}

impl CrossReference {
    pub fn key(&self) -> (u32, String) {
        (self.source_page, self.mention.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityType {
    MultipleInterpretations,
    VagueReference,
    TemporalAmbiguity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbiguityFlag {
    #[serde(rename = "type")]
    pub kind: AmbiguityType,
    /// What triggered the flag: the polysemous term or the offending quote
    pub subject: String,
    pub note: String,
    pub interpretation: String,
}

impl AmbiguityFlag {
    pub fn key(&self) -> (AmbiguityType, String) {
        (self.kind, self.subject.clone())
    }
}
