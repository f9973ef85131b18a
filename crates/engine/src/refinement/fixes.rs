//! One deterministic fix per verification check.
//!
//! Fixes are pure and idempotent. They only drop content or recompute
//! derived fields; no fix introduces a claim the evidence does not carry.

use claimforge_common::models::{
    cited_pages, retain_citations, strip_citations, strip_indicators, AnswerStatus, CertaintyCategory,
    DraftAnswer, ScopeAlignment,
};
use claimforge_common::text::split_sentences;

use crate::context::QuestionContext;
use crate::reasoner::finish;
use crate::scorer;
use crate::verifier::{claim_is_backed, fits_type, unsourced_numbers, CheckId};

/// Inputs a fix may consult besides the draft itself
pub struct FixContext<'a> {
    pub question: &'a QuestionContext,
}

pub type Fix = fn(&DraftAnswer, &FixContext) -> DraftAnswer;

/// The fix registered for a check
pub fn fix_for(id: CheckId) -> Fix {
    match id {
        CheckId::PageValidity => drop_out_of_slice,
        CheckId::ClaimEvidenceAlignment => drop_unbacked_lines,
        CheckId::NumberSourcing => drop_unsourced_numbers,
        CheckId::ScopeAlignment => realign_scope,
        CheckId::CompletenessValidation => reconcile_status,
        CheckId::EvidenceClassification => drop_malformed_evidence,
        CheckId::ContradictionCompleteness
        | CheckId::CrossReferenceCompleteness
        | CheckId::AmbiguityCompleteness => resync_detections,
        CheckId::CertaintyCalibration => relabel_certainty,
        CheckId::InlineIndicators => rewrite_indicators,
    }
}

/// Clear derived links to dropped evidence and recompute detections,
/// numerical metadata and scope. An emptied body becomes not_found.
fn resync(mut draft: DraftAnswer, context: &QuestionContext) -> DraftAnswer {
    let body = strip_indicators(&draft.answer);
    if draft.status != AnswerStatus::NotFound && strip_citations(&body).trim().is_empty() {
        let mut emptied = DraftAnswer::not_found(
            &context.question.text,
            "No claim in the draft survived verification.",
        );
        emptied.suggestions = draft.suggestions;
        emptied.push_suggestion("Provide pages that discuss the subject of the question");
        return emptied;
    }
    draft.answer = body;

    let references: Vec<_> = draft.evidence.iter().map(|e| e.reference()).collect();
    for part in &mut draft.parts {
        if !part.support.iter().any(|r| references.contains(r)) {
            part.answer = None;
        }
    }
    let pages = draft.evidence_pages();
    for component in &mut draft.components {
        if component.page.map_or(false, |p| !pages.contains(&p)) {
            component.value = None;
        }
    }

    finish(context, draft)
}

/// Keep only body lines accepted by `keep`
fn filter_lines(draft: &DraftAnswer, keep: impl Fn(&str) -> bool) -> String {
    strip_indicators(&draft.answer)
        .lines()
        .filter(|line| keep(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn drop_out_of_slice(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    let slice = &fx.question.page_numbers;
    let mut fixed = draft.clone();

    fixed.evidence.retain(|e| slice.contains(&e.page));
    // Lines supported only by foreign pages go; mixed citations are trimmed
    fixed.answer = strip_indicators(&draft.answer)
        .lines()
        .filter(|line| {
            let pages = cited_pages(line);
            pages.is_empty() || pages.iter().any(|p| slice.contains(p))
        })
        .map(|line| retain_citations(line, |p| slice.contains(&p)))
        .collect::<Vec<_>>()
        .join("\n");
    fixed
        .inference_chain
        .retain(|s| s.page.map_or(true, |p| slice.contains(&p)));
    for (index, step) in fixed.inference_chain.iter_mut().enumerate() {
        step.step = index + 1;
    }
    for component in &mut fixed.components {
        if component.page.map_or(false, |p| !slice.contains(&p)) {
            component.page = None;
            component.value = None;
        }
    }

    resync(fixed, fx.question)
}

fn drop_unbacked_lines(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    if draft.status == AnswerStatus::NotFound {
        return draft.clone();
    }
    let mut fixed = draft.clone();
    fixed.answer = filter_lines(draft, |line| {
        let claim = strip_citations(line);
        split_sentences(&claim)
            .into_iter()
            .all(|sentence| claim_is_backed(draft, sentence))
    });
    resync(fixed, fx.question)
}

fn drop_unsourced_numbers(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    let mut fixed = draft.clone();
    let question = &fx.question.question.text;
    fixed.answer = filter_lines(draft, |line| unsourced_numbers(draft, question, line).is_empty());
    resync(fixed, fx.question)
}

fn realign_scope(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    let mut fixed = resync(draft.clone(), fx.question);
    if fixed.status != AnswerStatus::NotFound && fixed.scope.alignment == ScopeAlignment::Shifted {
        fixed.status = AnswerStatus::Partial;
        fixed.push_reasoning("The answer drifts from the question's subject.");
        fixed.push_suggestion("Provide pages that address the question's subject directly");
    }
    fixed
}

fn reconcile_status(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    let mut fixed = draft.clone();
    let question = &fx.question.question;
    fixed.completeness = scorer::completeness(&fixed, question);

    if fixed.status == AnswerStatus::Complete && fixed.completeness < 1.0 {
        let structural = !fixed.parts.is_empty() || !fixed.components.is_empty() || question.is_quantitative();
        if structural {
            fixed.status = AnswerStatus::Partial;
        }
    }
    if fixed.status == AnswerStatus::Partial && fixed.suggestions.is_empty() {
        fixed.push_suggestion("Provide pages covering the parts of the question left unanswered");
    }
    fixed
}

fn drop_malformed_evidence(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    let mut fixed = draft.clone();
    let context = fx.question;
    let max_words = context.gathering.max_quote_words;

    fixed.evidence.retain(|item| {
        let verbatim = context
            .page(item.page)
            .map_or(false, |page| !item.quote.trim().is_empty() && page.text.contains(&item.quote));
        let bounded = item.essential || item.quote.split_whitespace().count() <= max_words;
        let ranged = (0.0..=1.0).contains(&item.relevance_score);
        verbatim && bounded && ranged && fits_type(item)
    });

    resync(fixed, fx.question)
}

fn resync_detections(draft: &DraftAnswer, fx: &FixContext) -> DraftAnswer {
    resync(draft.clone(), fx.question)
}

fn relabel_certainty(draft: &DraftAnswer, _fx: &FixContext) -> DraftAnswer {
    let mut fixed = draft.clone();
    fixed.certainty_score = scorer::certainty(&fixed);
    fixed.certainty = CertaintyCategory::from_score(fixed.certainty_score);
    fixed
}

fn rewrite_indicators(draft: &DraftAnswer, _fx: &FixContext) -> DraftAnswer {
    let mut fixed = draft.clone();
    fixed.answer = strip_indicators(&draft.answer);
    scorer::attach_indicators(fixed)
}
