//! Draft answer model and its scoring vocabulary

use serde::{Deserialize, Serialize};

use super::evidence::{AmbiguityFlag, Contradiction, CrossReference, EvidenceItem, EvidenceRef};
use super::markup::split_indicators;
use crate::constants::{
    BROADER_ENTITY_RATIO, EXACT_ENTITY_OVERLAP, EXACT_SIMILARITY, HIGH_CERTAINTY,
    MEDIUM_CERTAINTY, SHIFTED_SIMILARITY,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Complete,
    Partial,
    NotFound,
}

impl AnswerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Complete => "complete",
            AnswerStatus::Partial => "partial",
            AnswerStatus::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CertaintyCategory {
    High,
    Medium,
    Low,
}

impl CertaintyCategory {
    /// The one mapping from certainty score to category
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CERTAINTY {
            CertaintyCategory::High
        } else if score >= MEDIUM_CERTAINTY {
            CertaintyCategory::Medium
        } else {
            CertaintyCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertaintyCategory::High => "high",
            CertaintyCategory::Medium => "medium",
            CertaintyCategory::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAlignment {
    Exact,
    Broader,
    Narrower,
    Shifted,
}

impl ScopeAlignment {
    /// Classify answer scope against the question.
    ///
    /// `entity_ratio` is answer entities over question entities.
    pub fn classify(similarity: f64, entity_overlap: f64, entity_ratio: f64) -> Self {
        if similarity > EXACT_SIMILARITY && entity_overlap > EXACT_ENTITY_OVERLAP {
            ScopeAlignment::Exact
        } else if similarity < SHIFTED_SIMILARITY {
            ScopeAlignment::Shifted
        } else if entity_ratio > BROADER_ENTITY_RATIO {
            ScopeAlignment::Broader
        } else {
            ScopeAlignment::Narrower
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScopeRecord {
    pub question_asked: String,
    pub answer_provided: String,
    pub alignment: ScopeAlignment,
    pub similarity_score: f64,
    pub entity_overlap: f64,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceStep {
    pub step: usize,
    pub description: String,
    pub page: Option<u32>,
    /// Value produced by this step, verbatim as it appears in the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Exact,
    Estimate,
    Range,
    Projected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericalMetadata {
    pub value: String,
    pub precision: Precision,
    pub qualifier: String,
    pub page: Option<u32>,
}

/// Answer to one atomic sub-question of a multi-part question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartAnswer {
    pub sub_question: String,
    pub answer: Option<String>,
    pub support: Vec<EvidenceRef>,
}

/// One named component of an aggregate question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub name: String,
    /// Verbatim numeral, when evidence supplied one
    pub value: Option<String>,
    pub page: Option<u32>,
}

/// Working answer passed between Reasoner, Scorer, Verifier and
/// RefinementLoop. Refinement produces new values rather than editing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftAnswer {
    /// Answer body, followed by the indicator trailer once drafted
    pub answer: String,
    pub status: AnswerStatus,
    pub completeness: f64,
    pub certainty_score: f64,
    pub certainty: CertaintyCategory,
    pub scope: ScopeRecord,
    pub evidence: Vec<EvidenceItem>,
    pub contradictions: Vec<Contradiction>,
    pub cross_references: Vec<CrossReference>,
    pub ambiguities: Vec<AmbiguityFlag>,
    pub inference_chain: Vec<InferenceStep>,
    pub numerical_metadata: Vec<NumericalMetadata>,
    pub reasoning: Vec<String>,
    pub assumptions: Vec<String>,
    pub suggestions: Vec<String>,
    pub parts: Vec<PartAnswer>,
    pub components: Vec<Component>,
    /// Whether the answer states a value computed from evidence
    pub calculated: bool,
}

pub const NOT_FOUND_ANSWER: &str = "The provided pages do not contain an answer to this question.";

impl DraftAnswer {
    /// Empty draft for a question the slice cannot answer
    pub fn not_found(question: &str, reason: impl Into<String>) -> Self {
        Self {
            answer: NOT_FOUND_ANSWER.to_string(),
            status: AnswerStatus::NotFound,
            completeness: 0.0,
            certainty_score: 0.0,
            certainty: CertaintyCategory::Low,
            scope: ScopeRecord {
                question_asked: question.to_string(),
                answer_provided: NOT_FOUND_ANSWER.to_string(),
                alignment: ScopeAlignment::Shifted,
                similarity_score: 0.0,
                entity_overlap: 0.0,
                note: "No answer was provided".to_string(),
            },
            evidence: Vec::new(),
            contradictions: Vec::new(),
            cross_references: Vec::new(),
            ambiguities: Vec::new(),
            inference_chain: Vec::new(),
            numerical_metadata: Vec::new(),
            reasoning: vec![reason.into()],
            assumptions: Vec::new(),
            suggestions: Vec::new(),
            parts: Vec::new(),
            components: Vec::new(),
            calculated: false,
        }
    }

    /// Answer text without the indicator trailer
    pub fn body(&self) -> &str {
        split_indicators(&self.answer).0
    }

    pub fn evidence_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.evidence.iter().map(|e| e.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Whether an item matching `reference` is still in the evidence list
    pub fn has_evidence(&self, reference: &EvidenceRef) -> bool {
        self.evidence.iter().any(|e| e.matches(reference))
    }

    pub fn push_suggestion(&mut self, suggestion: impl Into<String>) {
        let suggestion = suggestion.into();
        if !self.suggestions.contains(&suggestion) {
            self.suggestions.push(suggestion);
        }
    }

    pub fn push_reasoning(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.reasoning.contains(&note) {
            self.reasoning.push(note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(CertaintyCategory::from_score(0.85), CertaintyCategory::High);
        assert_eq!(CertaintyCategory::from_score(0.8499), CertaintyCategory::Medium);
        assert_eq!(CertaintyCategory::from_score(0.60), CertaintyCategory::Medium);
        assert_eq!(CertaintyCategory::from_score(0.5999), CertaintyCategory::Low);
        assert_eq!(CertaintyCategory::from_score(0.0), CertaintyCategory::Low);
    }

    #[test]
    fn test_scope_classification() {
        assert_eq!(ScopeAlignment::classify(0.9, 1.0, 1.0), ScopeAlignment::Exact);
        assert_eq!(ScopeAlignment::classify(0.9, 0.5, 1.0), ScopeAlignment::Narrower);
        assert_eq!(ScopeAlignment::classify(0.4, 1.0, 1.0), ScopeAlignment::Shifted);
        assert_eq!(ScopeAlignment::classify(0.7, 1.0, 2.0), ScopeAlignment::Broader);
    }

    #[test]
    fn test_not_found_draft() {
        let draft = DraftAnswer::not_found("Who?", "Empty slice");
        assert_eq!(draft.status, AnswerStatus::NotFound);
        assert_eq!(draft.certainty, CertaintyCategory::from_score(draft.certainty_score));
        assert_eq!(draft.body(), NOT_FOUND_ANSWER);
    }

    #[test]
    fn test_suggestions_deduplicate() {
        let mut draft = DraftAnswer::not_found("Who?", "Empty slice");
        draft.push_suggestion("Provide more pages");
        draft.push_suggestion("Provide more pages");
        assert_eq!(draft.suggestions.len(), 1);
    }
}
