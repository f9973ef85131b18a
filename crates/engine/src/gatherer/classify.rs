//! Passage extraction and evidence classification for a single page

use claimforge_common::config::GatheringConfig;
use claimforge_common::constants::DIRECT_COVERAGE;
use claimforge_common::models::{EvidenceItem, EvidenceQuality, EvidenceType, Page, Question};
use claimforge_common::text::{
    contains_phrase, coverage, extract_numbers, key_terms, split_sentences, truncate_words,
    word_count,
};

use super::detector::find_references;

const HEDGES: &[&str] = &[
    "may",
    "might",
    "could",
    "likely",
    "possibly",
    "probably",
    "appears",
    "appear",
    "seems",
    "suggests",
    "suggest",
    "estimated",
    "approximately",
    "expected",
    "projected",
    "reportedly",
    "believed",
];

const TABLE_MARKERS: &[&str] = &["table", "figure", "fig"];

/// Numerals per word above which a passage reads as tabular data
const NUMERIC_DENSITY: f64 = 0.3;

/// Classify a passage into (quality, type); first matching rule wins
pub fn classify_passage(
    passage: &str,
    question: &Question,
    term_coverage: f64,
) -> (EvidenceQuality, EvidenceType) {
    let lower = passage.to_lowercase();

    if !find_references(passage).is_empty() {
        return (EvidenceQuality::Indirect, EvidenceType::CrossReference);
    }

    let measures = extract_numbers(passage)
        .into_iter()
        .filter(|t| t.is_measure())
        .count();
    let tabular = passage.contains('|')
        || passage.contains('\t')
        || TABLE_MARKERS.iter().any(|m| lower.starts_with(m))
        || measures as f64 / word_count(passage).max(1) as f64 >= NUMERIC_DENSITY;
    if measures >= 2 && tabular {
        return (EvidenceQuality::Direct, EvidenceType::NumericalData);
    }

    if HEDGES.iter().any(|h| contains_phrase(&lower, h)) {
        return (EvidenceQuality::Inferred, EvidenceType::ContextualInterpretation);
    }

    let declarative = !passage.trim_end().ends_with('?');
    let names_entity = question.entities.iter().any(|e| contains_phrase(&lower, e));
    if declarative && (names_entity || term_coverage >= DIRECT_COVERAGE) {
        return (EvidenceQuality::Direct, EvidenceType::ExplicitStatement);
    }

    (EvidenceQuality::Indirect, EvidenceType::ExplicitStatement)
}

/// Extract classified evidence items from one page that passed the relevance cut
pub fn extract_passages(
    question: &Question,
    page: &Page,
    page_score: f64,
    config: &GatheringConfig,
) -> Vec<EvidenceItem> {
    let mut candidates: Vec<(usize, &str, f64)> = split_sentences(&page.text)
        .into_iter()
        .enumerate()
        .filter_map(|(position, sentence)| {
            let lower = sentence.to_lowercase();
            let terms = key_terms(sentence);
            let shared_term = question.terms.iter().any(|t| terms.contains(t));
            let shared_entity = question.entities.iter().any(|e| contains_phrase(&lower, e));
            if !shared_term && !shared_entity {
                return None;
            }
            Some((position, sentence, coverage(&question.terms, &terms)))
        })
        .collect();

    // Best-covering passages first, then back to page order
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
    candidates.truncate(config.max_passages_per_page);
    candidates.sort_by_key(|(position, _, _)| *position);

    candidates
        .into_iter()
        .map(|(_, sentence, term_coverage)| {
            let quote = truncate_words(sentence, config.max_quote_words);
            let (quality, evidence_type) = classify_passage(quote, question, term_coverage);
            EvidenceItem {
                quote: quote.to_string(),
                page: page.number,
                quality,
                evidence_type,
                relevance_score: ((page_score + term_coverage) / 2.0).clamp(0.0, 1.0),
                essential: false,
            }
        })
        .collect()
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
    fn test_classification_rules() {
        let q = question("How much funding did Program Alpha receive?");
        assert_eq!(
            classify_passage("See Section 4 for Program Alpha funding.", &q, 1.0),
            (EvidenceQuality::Indirect, EvidenceType::CrossReference)
        );
        assert_eq!(
            classify_passage("Alpha | $10M | $12M", &q, 0.3),
            (EvidenceQuality::Direct, EvidenceType::NumericalData)
        );
        assert_eq!(
            classify_passage("Program Alpha may receive $10M.", &q, 0.6),
            (EvidenceQuality::Inferred, EvidenceType::ContextualInterpretation)
        );
        assert_eq!(
            classify_passage("Program Alpha received $10M in funding.", &q, 1.0),
            (EvidenceQuality::Direct, EvidenceType::ExplicitStatement)
        );
        assert_eq!(
            classify_passage("Grants were reviewed in spring.", &q, 0.25),
            (EvidenceQuality::Indirect, EvidenceType::ExplicitStatement)
        );
    }

    #[test]
    fn test_passages_are_verbatim_and_capped() {
        let q = question("How much funding did Program Alpha receive?");
        let text = "Program Alpha received $10M in funding. The weather was mild. \
                    Funding for Program Alpha was approved by the board after a long review process that \
                    involved many stakeholders across several agencies and took most of the fiscal year to complete in full. \
                    Program Alpha funding covers staff. Program Alpha funding covers travel.";
        let page = Page::new(3, text);
        let config = GatheringConfig::default();
        let items = extract_passages(&q, &page, 0.7, &config);

        assert_eq!(items.len(), config.max_passages_per_page);
        for item in &items {
            assert!(page.text.contains(&item.quote));
            assert!(word_count(&item.quote) <= config.max_quote_words);
            assert!((0.0..=1.0).contains(&item.relevance_score));
        }
        assert!(items.iter().all(|i| !i.quote.contains("weather")));
        assert_eq!(items[0].quote, "Program Alpha received $10M in funding.");
    }
}
