//! Scorer - completeness and certainty for a draft
//!
//! The only place either number is computed. The orchestrator scores the
//! reasoner's draft, the refinement loop rescores after every fix pass and
//! the verifier recomputes both to check the stored values.

use claimforge_common::constants::{
    AMBIGUITY_FACTOR, CALCULATION_FACTOR, CONTRADICTION_FACTOR, SINGLE_SOURCE_FACTOR,
    TARGET_EVIDENCE_COUNT,
};
use claimforge_common::models::{
    render_indicators, split_indicators, strip_citations, AnswerStatus, CertaintyCategory,
    DraftAnswer, EvidenceItem, ProcessingMode, Question,
};
use claimforge_common::text::extract_numbers;

/// Scores are reported to two decimals, the precision of the trailer
fn round2(value: f64) -> f64 {
    (value.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Fraction of the question the draft answers
pub fn completeness(draft: &DraftAnswer, question: &Question) -> f64 {
    if draft.status == AnswerStatus::NotFound {
        return 0.0;
    }

    if !draft.parts.is_empty() {
        let answered = draft
            .parts
            .iter()
            .filter(|p| p.answer.is_some() && p.support.iter().any(|r| draft.has_evidence(r)))
            .count();
        return round2(answered as f64 / draft.parts.len() as f64);
    }

    if question.mode == ProcessingMode::QuantitativeAggregate && !draft.components.is_empty() {
        let pages = draft.evidence_pages();
        let valued = draft
            .components
            .iter()
            .filter(|c| c.value.is_some() && c.page.map_or(false, |p| pages.contains(&p)))
            .count();
        return round2(valued as f64 / draft.components.len() as f64);
    }

    if question.is_quantitative() {
        let body = strip_citations(draft.body());
        let found = extract_numbers(&body).iter().any(|t| t.is_measure());
        return if found { 1.0 } else { 0.0 };
    }

    if draft.evidence.is_empty() {
        return 0.0;
    }
    let quality = draft
        .evidence
        .iter()
        .map(|e| e.quality.completeness_proxy())
        .sum::<f64>()
        / draft.evidence.len() as f64;
    let quantity = (draft.evidence.len() as f64 / TARGET_EVIDENCE_COUNT as f64).min(1.0);
    round2((quality + quantity) / 2.0)
}

/// Product of per-item penalties, with the single-source factor
fn support_certainty<'a>(items: impl Iterator<Item = &'a EvidenceItem>) -> f64 {
    let mut count = 0;
    let mut product = 1.0;
    for item in items {
        count += 1;
        product *= 1.0 - item.quality.certainty_penalty();
    }
    match count {
        0 => 0.0,
        1 => product * SINGLE_SOURCE_FACTOR,
        _ => product,
    }
}

/// Certainty score before rounding into the category
pub fn certainty(draft: &DraftAnswer) -> f64 {
    if draft.status == AnswerStatus::NotFound || draft.evidence.is_empty() {
        return 0.0;
    }

    let answered: Vec<_> = draft.parts.iter().filter(|p| p.answer.is_some()).collect();
    let mut score = if answered.is_empty() {
        support_certainty(draft.evidence.iter())
    } else {
        // The weakest answered part bounds the whole answer
        answered
            .iter()
            .map(|part| {
                support_certainty(
                    draft
                        .evidence
                        .iter()
                        .filter(|e| part.support.iter().any(|r| e.matches(r))),
                )
            })
            .fold(1.0, f64::min)
    };

    if draft.calculated {
        score *= CALCULATION_FACTOR;
    }
    if !draft.contradictions.is_empty() {
        score *= CONTRADICTION_FACTOR;
    }
    if !draft.ambiguities.is_empty() {
        score *= AMBIGUITY_FACTOR;
    }
    round2(score)
}

/// Set completeness, certainty score and category; refresh an existing trailer.
///
/// Scoring an already scored draft returns it unchanged.
pub fn score(mut draft: DraftAnswer, question: &Question) -> DraftAnswer {
    draft.completeness = completeness(&draft, question);
    draft.certainty_score = certainty(&draft);
    draft.certainty = CertaintyCategory::from_score(draft.certainty_score);

    if split_indicators(&draft.answer).1.is_some() {
        draft = attach_indicators(draft);
    }
    draft
}

/// Replace any trailer with one rendered from the draft's current values
pub fn attach_indicators(mut draft: DraftAnswer) -> DraftAnswer {
    let body = draft.body().to_string();
    draft.answer = format!("{}\n{}", body, indicator_line(&draft));
    draft
}

pub fn indicator_line(draft: &DraftAnswer) -> String {
    render_indicators(draft.certainty, draft.certainty_score, draft.completeness)
}
