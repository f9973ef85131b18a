//! The eleven verification checks.
//!
//! Each check is a pure function of the draft and the question context and
//! returns `Err(detail)` naming the first problem it finds.

use std::collections::BTreeSet;

use claimforge_common::constants::CLAIM_SUPPORT_OVERLAP;
use claimforge_common::models::{
    cited_pages, has_stray_indicators, parse_indicators, split_indicators, strip_citations,
    AnswerStatus, CertaintyCategory, DraftAnswer, EvidenceItem, EvidenceType, ProcessingMode, ScopeAlignment,
};
use claimforge_common::text::{coverage, extract_numbers, key_terms, split_sentences, word_count};

use crate::context::QuestionContext;
use crate::gatherer::find_references;
use crate::scope::assess_scope;
use crate::scorer;

pub(super) type CheckResult = std::result::Result<(), String>;

fn out_of_slice(context: &QuestionContext, page: u32) -> bool {
    !context.page_numbers.contains(&page)
}

/// Every page the draft points at belongs to the slice
pub(super) fn page_validity(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    if let Some(item) = draft.evidence.iter().find(|e| out_of_slice(context, e.page)) {
        return Err(format!("evidence cites page {} outside the slice", item.page));
    }
    if let Some(page) = cited_pages(draft.body())
        .into_iter()
        .find(|p| out_of_slice(context, *p))
    {
        return Err(format!("answer cites page {} outside the slice", page));
    }
    if let Some(step) = draft
        .inference_chain
        .iter()
        .find(|s| s.page.map_or(false, |p| out_of_slice(context, p)))
    {
        return Err(format!("inference step {} cites a page outside the slice", step.step));
    }
    if let Some(meta) = draft
        .numerical_metadata
        .iter()
        .find(|m| m.page.map_or(false, |p| out_of_slice(context, p)))
    {
        return Err(format!("value {} is attributed to a page outside the slice", meta.value));
    }
    Ok(())
}

/// Each claim sentence overlaps some quote or inference step
pub(super) fn claim_evidence_alignment(draft: &DraftAnswer, _context: &QuestionContext) -> CheckResult {
    if draft.status == AnswerStatus::NotFound {
        return Ok(());
    }

    let claim = strip_citations(draft.body());
    match split_sentences(&claim)
        .into_iter()
        .find(|sentence| !claim_is_backed(draft, sentence))
    {
        Some(sentence) => Err(format!("claim is not backed by any evidence: {}", sentence)),
        None => Ok(()),
    }
}

/// A claim sentence shares enough key terms with a quote or inference step
pub(crate) fn claim_is_backed(draft: &DraftAnswer, sentence: &str) -> bool {
    let terms = key_terms(sentence);
    if terms.is_empty() {
        return true;
    }
    draft
        .evidence
        .iter()
        .map(|e| key_terms(&e.quote))
        .chain(draft.inference_chain.iter().map(|s| key_terms(&s.description)))
        .any(|source| coverage(&terms, &source) >= CLAIM_SUPPORT_OVERLAP)
}

/// Every numeral in the answer is quoted or is the result of a step
pub(super) fn number_sourcing(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    match unsourced_numbers(draft, &context.question.text, draft.body()).first() {
        Some(raw) => Err(format!("numeral {} has no source", raw)),
        None => Ok(()),
    }
}

/// Numerals in `text` that are not quoted, not produced by a step and not
/// restated from the question
pub(crate) fn unsourced_numbers(draft: &DraftAnswer, question: &str, text: &str) -> Vec<String> {
    let restated: Vec<String> = extract_numbers(question).into_iter().map(|t| t.raw).collect();
    extract_numbers(&strip_citations(text))
        .into_iter()
        .filter(|token| {
            let quoted = draft.evidence.iter().any(|e| e.quote.contains(&token.raw));
            let computed = draft
                .inference_chain
                .iter()
                .any(|s| s.result.as_deref() == Some(token.raw.as_str()));
            !quoted && !computed && !restated.contains(&token.raw)
        })
        .map(|token| token.raw)
        .collect()
}

pub(super) fn scope_alignment(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    if draft.status == AnswerStatus::NotFound {
        return Ok(());
    }
    let fresh = assess_scope(context, draft.body());
    if fresh != draft.scope {
        return Err("stored scope does not match the answer".to_string());
    }
    if fresh.alignment == ScopeAlignment::Shifted {
        return Err(format!(
            "answer scope is shifted (similarity {:.2})",
            fresh.similarity_score
        ));
    }
    Ok(())
}

/// Stored completeness is current and agrees with the status
pub(super) fn completeness_validation(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    let question = &context.question;
    let expected = scorer::completeness(draft, question);
    if (expected - draft.completeness).abs() > 1e-9 {
        return Err(format!(
            "completeness {:.2} should be {:.2}",
            draft.completeness, expected
        ));
    }

    let structural = !draft.parts.is_empty()
        || (question.mode == ProcessingMode::QuantitativeAggregate && !draft.components.is_empty())
        || question.is_quantitative();

    match draft.status {
        AnswerStatus::Complete if structural && draft.completeness < 1.0 => Err(format!(
            "status is complete but completeness is {:.2}",
            draft.completeness
        )),
        AnswerStatus::Partial if draft.suggestions.is_empty() => {
            Err("partial answer carries no suggestions".to_string())
        }
        AnswerStatus::NotFound if draft.completeness > 0.0 => {
            Err("not_found answer reports non-zero completeness".to_string())
        }
        _ => Ok(()),
    }
}

/// Quotes are verbatim, bounded and typed consistently
pub(super) fn evidence_classification(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    let max_words = context.gathering.max_quote_words;

    for item in &draft.evidence {
        if item.quote.trim().is_empty() {
            return Err(format!("empty quote on page {}", item.page));
        }
        let verbatim = context
            .page(item.page)
            .map_or(false, |page| page.text.contains(&item.quote));
        if !verbatim {
            return Err(format!("quote is not verbatim from page {}", item.page));
        }
        if !item.essential && word_count(&item.quote) > max_words {
            return Err(format!(
                "quote on page {} exceeds {} words",
                item.page, max_words
            ));
        }
        if !(0.0..=1.0).contains(&item.relevance_score) {
            return Err(format!(
                "relevance {} on page {} is out of range",
                item.relevance_score, item.page
            ));
        }
        if !fits_type(item) {
            return Err(format!("quote on page {} does not fit its evidence type", item.page));
        }
    }
    Ok(())
}

/// Numerical data carries a value; cross references carry a referential phrase
pub(crate) fn fits_type(item: &EvidenceItem) -> bool {
    match item.evidence_type {
        EvidenceType::NumericalData => extract_numbers(&item.quote).iter().any(|t| t.is_measure()),
        EvidenceType::CrossReference => !find_references(&item.quote).is_empty(),
        EvidenceType::ExplicitStatement | EvidenceType::ContextualInterpretation => true,
    }
}

pub(super) fn contradiction_completeness(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    let expected: BTreeSet<_> = context
        .detect(&draft.evidence)
        .contradictions
        .iter()
        .map(|c| c.key())
        .collect();
    let stored: BTreeSet<_> = draft.contradictions.iter().map(|c| c.key()).collect();
    diff("contradictions", expected.len(), stored.len(), expected == stored)
}

pub(super) fn cross_reference_completeness(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    let expected: BTreeSet<_> = context
        .detect(&draft.evidence)
        .cross_references
        .iter()
        .map(|c| c.key())
        .collect();
    let stored: BTreeSet<_> = draft.cross_references.iter().map(|c| c.key()).collect();
    diff("cross references", expected.len(), stored.len(), expected == stored)
}

pub(super) fn ambiguity_completeness(draft: &DraftAnswer, context: &QuestionContext) -> CheckResult {
    let expected: BTreeSet<_> = context
        .detect(&draft.evidence)
        .ambiguities
        .iter()
        .map(|a| a.key())
        .collect();
    let stored: BTreeSet<_> = draft.ambiguities.iter().map(|a| a.key()).collect();
    diff("ambiguities", expected.len(), stored.len(), expected == stored)
}

fn diff(what: &str, expected: usize, stored: usize, same: bool) -> CheckResult {
    if same {
        Ok(())
    } else {
        Err(format!(
            "detector found {} {} but the draft records {}",
            expected, what, stored
        ))
    }
}

pub(super) fn certainty_calibration(draft: &DraftAnswer, _context: &QuestionContext) -> CheckResult {
    let category = CertaintyCategory::from_score(draft.certainty_score);
    if category != draft.certainty {
        return Err(format!(
            "score {:.2} maps to {} but the draft says {}",
            draft.certainty_score,
            category.as_str(),
            draft.certainty.as_str()
        ));
    }
    let expected = scorer::certainty(draft);
    if (expected - draft.certainty_score).abs() > 1e-9 {
        return Err(format!(
            "certainty score {:.2} should be {:.2}",
            draft.certainty_score, expected
        ));
    }
    Ok(())
}

/// The trailer is the last line and shows the current values
pub(super) fn inline_indicators(draft: &DraftAnswer, _context: &QuestionContext) -> CheckResult {
    let Some(trailer) = split_indicators(&draft.answer).1 else {
        return Err("indicator trailer is missing".to_string());
    };
    if parse_indicators(trailer).is_none() {
        return Err(format!("indicator trailer is malformed: {}", trailer));
    }
    if trailer != scorer::indicator_line(draft) {
        return Err(format!("indicator trailer is stale: {}", trailer));
    }
    if has_stray_indicators(&draft.answer) {
        return Err("indicator line appears inside the answer body".to_string());
    }
    Ok(())
}
