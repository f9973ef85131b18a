//! Single-passage answers (simple factual, quantitative single, standard)

use claimforge_common::models::{AnswerStatus, DraftAnswer};

use super::{blank, contradicting, has_measure, in_gathered_order, quote_line};
use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;

pub(super) fn answer(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    let question = &context.question;
    let mut draft = blank(context);

    let Some(top) = gathered.evidence.first() else {
        return draft;
    };

    // Quantitative questions prefer the best passage that carries a value
    let chosen = if question.is_quantitative() {
        gathered
            .evidence
            .iter()
            .find(|e| has_measure(&e.quote))
            .unwrap_or(top)
    } else {
        top
    };

    let mut items = vec![chosen.clone()];
    let conflicting = contradicting(gathered, &items);
    items.extend(conflicting.iter().cloned());
    let items = in_gathered_order(gathered, items);

    draft.answer = items.iter().map(quote_line).collect::<Vec<_>>().join("\n");
    draft.status = AnswerStatus::Complete;
    draft.push_reasoning(format!(
        "Answer drawn from the most relevant passage (page {}).",
        chosen.page
    ));

    if !conflicting.is_empty() {
        let pages: Vec<String> = conflicting.iter().map(|e| e.page.to_string()).collect();
        draft.push_reasoning(format!(
            "Conflicting passages from page(s) {} are reported alongside it.",
            pages.join(", ")
        ));
    }

    if question.is_quantitative() && !has_measure(&chosen.quote) {
        draft.status = AnswerStatus::Partial;
        draft.push_reasoning("No passage states a numeric value for the question.");
        draft.push_suggestion("Provide pages that state the requested figure");
    }

    draft.evidence = items;
    draft
}
