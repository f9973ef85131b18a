//! Answer scope assessment against the question

use claimforge_common::models::{strip_citations, ScopeAlignment, ScopeRecord};
use claimforge_common::text::contains_phrase;

use crate::context::QuestionContext;

/// Measure how well an answer body matches the scope of the question
pub fn assess_scope(context: &QuestionContext, body: &str) -> ScopeRecord {
    let question = &context.question;
    let claim = strip_citations(body);
    let claim_lower = claim.to_lowercase();

    let similarity = context
        .similarity
        .similarity(&question.text, &claim)
        .clamp(0.0, 1.0);

    let entity_overlap = if question.entities.is_empty() {
        1.0
    } else {
        let covered = question
            .entities
            .iter()
            .filter(|e| contains_phrase(&claim_lower, e))
            .count();
        covered as f64 / question.entities.len() as f64
    };

    let answer_entities = context.extractor.extract(&claim).len();
    let entity_ratio = answer_entities as f64 / question.entities.len().max(1) as f64;

    let alignment = ScopeAlignment::classify(similarity, entity_overlap, entity_ratio);
    let note = match alignment {
        ScopeAlignment::Exact => "Answer matches the question's scope".to_string(),
        ScopeAlignment::Broader => {
            "Answer covers more subjects than the question asked about".to_string()
        }
        ScopeAlignment::Narrower => {
            "Answer covers only part of what the question asked".to_string()
        }
        ScopeAlignment::Shifted => {
            "Answer addresses a different subject than the question".to_string()
        }
    };

    ScopeRecord {
        question_asked: question.text.clone(),
        answer_provided: claim.trim().to_string(),
        alignment,
        similarity_score: similarity,
        entity_overlap,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::QuestionClassifier;
    use claimforge_common::config::GatheringConfig;
    use claimforge_common::text::{LexicalEntityExtractor, LexicalSimilarity};
    use std::sync::Arc;

    fn context(question: &str) -> QuestionContext {
        let extractor = Arc::new(LexicalEntityExtractor::new());
        let question = QuestionClassifier::new(extractor.clone()).classify(question);
        QuestionContext::new(
            question,
            Vec::new(),
            extractor,
            Arc::new(LexicalSimilarity::new()),
            GatheringConfig::default(),
        )
    }

    #[test]
    fn test_exact_scope() {
        let ctx = context("What is the total funding for Program Alpha and Program Beta?");
        let scope = assess_scope(
            &ctx,
            "The total funding for Program Alpha and Program Beta is $25M (p. 1, 2).",
        );
        assert_eq!(scope.alignment, ScopeAlignment::Exact);
        assert_eq!(scope.entity_overlap, 1.0);
        assert!(!scope.answer_provided.contains("(p."));
    }

    #[test]
    fn test_shifted_scope() {
        let ctx = context("What is the total funding for Program Alpha and Program Beta?");
        let scope = assess_scope(&ctx, "The board met twice (p. 4).");
        assert_eq!(scope.alignment, ScopeAlignment::Shifted);
    }

    #[test]
    fn test_narrower_scope() {
        let ctx = context("What is the total funding for Program Alpha and Program Beta?");
        let scope = assess_scope(&ctx, "Program Alpha received total funding of $10M (p. 1).");
        assert_eq!(scope.alignment, ScopeAlignment::Narrower);
        assert_eq!(scope.entity_overlap, 0.5);
    }
}
