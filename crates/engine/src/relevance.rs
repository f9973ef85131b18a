//! Page relevance scoring
//!
//! Weighted blend of four signals:
//! - keyword overlap on stemmed, stop-word-filtered terms
//! - fraction of question entities present on the page
//! - semantic similarity from the injected provider
//! - question-type alignment (numerals for quantitative, years for temporal)

use claimforge_common::constants::{
    ENTITY_WEIGHT, KEYWORD_WEIGHT, NEUTRAL_TYPE_ALIGNMENT, RELEVANCE_THRESHOLD, SEMANTIC_WEIGHT,
    TYPE_ALIGNMENT_WEIGHT,
};
use claimforge_common::models::{Page, Question, QuestionType};
use claimforge_common::text::{
    contains_phrase, coverage, extract_numbers, key_terms, NumericKind, SimilarityProvider,
};
use serde::Serialize;

/// Relevance breakdown for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageScore {
    pub page: u32,
    pub keyword: f64,
    pub entity: f64,
    pub semantic: f64,
    pub type_alignment: f64,
    pub score: f64,
}

impl PageScore {
    /// Whether the page survives the hard relevance cut
    pub fn passes(&self) -> bool {
        self.score >= RELEVANCE_THRESHOLD
    }
}

/// Score a page against a classified question.
///
/// Without an injected provider the semantic signal falls back to the
/// keyword score.
pub fn score_page(
    question: &Question,
    page: &Page,
    similarity: Option<&dyn SimilarityProvider>,
) -> PageScore {
    let page_lower = page.text.to_lowercase();
    let page_terms = key_terms(&page.text);

    let keyword = coverage(&question.terms, &page_terms);

    let entity = if question.entities.is_empty() {
        keyword
    } else {
        let found = question
            .entities
            .iter()
            .filter(|e| contains_phrase(&page_lower, e))
            .count();
        found as f64 / question.entities.len() as f64
    };

    let semantic = match similarity {
        Some(provider) => provider.similarity(&question.text, &page.text).clamp(0.0, 1.0),
        None => keyword,
    };

    let type_alignment = type_alignment(question.question_type, &page.text);

    let score = KEYWORD_WEIGHT * keyword
        + ENTITY_WEIGHT * entity
        + SEMANTIC_WEIGHT * semantic
        + TYPE_ALIGNMENT_WEIGHT * type_alignment;

    PageScore {
        page: page.number,
        keyword,
        entity,
        semantic,
        type_alignment,
        score: score.clamp(0.0, 1.0),
    }
}

fn type_alignment(question_type: QuestionType, text: &str) -> f64 {
    match question_type {
        QuestionType::Quantitative => {
            if extract_numbers(text).iter().any(|t| t.is_measure()) {
                1.0
            } else {
                0.0
            }
        }
        QuestionType::Temporal => {
            if extract_numbers(text).iter().any(|t| t.kind == NumericKind::Year) {
                1.0
            } else {
                0.0
            }
        }
        _ => NEUTRAL_TYPE_ALIGNMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::QuestionClassifier;
    use claimforge_common::text::LexicalEntityExtractor;
    use std::sync::Arc;

    fn question(text: &str) -> Question {
        QuestionClassifier::new(Arc::new(LexicalEntityExtractor::new())).classify(text)
    }

    #[test]
    fn test_relevant_page_passes() {
        let q = question("What is the total funding for Program Alpha and Program Beta?");
        let score = score_page(&q, &Page::new(1, "Program Alpha received $10M in funding."), None);
        assert!((score.keyword - 0.6).abs() < 1e-9);
        assert_eq!(score.entity, 0.5);
        assert_eq!(score.type_alignment, 1.0);
        assert!((score.score - 0.635).abs() < 1e-9);
        assert!(score.passes());
    }

    #[test]
    fn test_unrelated_page_is_cut() {
        let q = question("What is the total funding for Program Alpha and Program Beta?");
        let score = score_page(&q, &Page::new(9, "The weather in spring was mild."), None);
        assert_eq!(score.score, 0.0);
        assert!(!score.passes());
    }

    #[test]
    fn test_entity_signal_falls_back_to_keyword() {
        let q = question("What is the total funding for all programs?");
        assert!(q.entities.is_empty());
        let score = score_page(&q, &Page::new(4, "Program Gamma received funding in 2023."), None);
        assert_eq!(score.entity, score.keyword);
        // A bare year is not a measured value
        assert_eq!(score.type_alignment, 0.0);
    }

    #[test]
    fn test_injected_similarity() {
        struct Fixed;
        impl SimilarityProvider for Fixed {
            fn similarity(&self, _: &str, _: &str) -> f64 {
                1.0
            }
        }
        let q = question("Who chairs the board?");
        let score = score_page(&q, &Page::new(2, "Nothing relevant here."), Some(&Fixed));
        assert_eq!(score.semantic, 1.0);
        assert!((score.score - (0.25 + 0.15 * 0.5)).abs() < 1e-9);
    }
}
