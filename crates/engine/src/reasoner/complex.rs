//! Causal and complex questions: a short chain over the strongest passages

use claimforge_common::models::{AnswerStatus, DraftAnswer, EvidenceItem, EvidenceQuality, InferenceStep};

use super::{blank, contradicting, in_gathered_order, quote_line};
use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;

/// Passages chained into one answer
const MAX_LINKS: usize = 3;

pub(super) fn answer(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    let mut draft = blank(context);
    let links: Vec<&EvidenceItem> = gathered.evidence.iter().take(MAX_LINKS).collect();

    for (index, item) in links.iter().enumerate() {
        draft.inference_chain.push(InferenceStep {
            step: index + 1,
            description: format!("Page {} states: {}", item.page, item.quote),
            page: Some(item.page),
            result: None,
        });
        if item.quality != EvidenceQuality::Direct {
            draft.assumptions.push(format!(
                "The passage on page {} is read as bearing on the question although it does not address it directly.",
                item.page
            ));
        }
    }

    let mut pages: Vec<u32> = links.iter().map(|item| item.page).collect();
    pages.sort_unstable();
    pages.dedup();
    if pages.len() > 1 {
        draft.assumptions.push(format!(
            "Passages from pages {} are assumed to describe the same situation.",
            pages.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        ));
    }

    let mut used: Vec<EvidenceItem> = links.into_iter().cloned().collect();
    let conflicting = contradicting(gathered, &used);
    used.extend(conflicting);
    draft.evidence = in_gathered_order(gathered, used);

    draft.answer = draft
        .evidence
        .iter()
        .map(quote_line)
        .collect::<Vec<_>>()
        .join("\n");
    draft.status = AnswerStatus::Complete;
    draft.push_reasoning(format!(
        "The answer links {} passage(s) in order of relevance.",
        draft.inference_chain.len()
    ));
    draft
}
