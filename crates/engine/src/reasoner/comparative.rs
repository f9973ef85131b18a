//! Comparative answers between two target entities

use claimforge_common::models::{AnswerStatus, DraftAnswer, EvidenceItem, InferenceStep};
use claimforge_common::text::contains_phrase;

use super::{blank, contradicting, direct, display_name, in_gathered_order, quote_line, value_for};
use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;

pub(super) fn answer(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    let entities = &context.question.entities;
    if entities.len() < 2 {
        let mut draft = direct::answer(context, gathered);
        draft.push_reasoning("Fewer than two comparison targets were identified; the most relevant passage is reported.");
        return draft;
    }

    let targets = [&entities[0], &entities[1]];
    let found: Vec<Option<&EvidenceItem>> = targets
        .iter()
        .map(|name| {
            gathered
                .evidence
                .iter()
                .find(|e| contains_phrase(&e.quote.to_lowercase(), name))
        })
        .collect();

    let mut draft = blank(context);
    let mut used: Vec<EvidenceItem> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for (name, item) in targets.iter().zip(&found) {
        match item {
            Some(item) => {
                let line = quote_line(item);
                if !lines.contains(&line) {
                    lines.push(line);
                    used.push((*item).clone());
                }
            }
            None => {
                draft.push_reasoning(format!("No evidence was found for {}.", name));
                draft.push_suggestion(format!("Provide pages that discuss {}", name));
            }
        }
    }

    if used.is_empty() {
        let mut not_found = DraftAnswer::not_found(
            &context.question.text,
            "Neither comparison target is discussed in the provided pages.",
        );
        not_found.suggestions = draft.suggestions;
        return not_found;
    }

    if let (Some(a), Some(b)) = (found[0], found[1]) {
        let names = [targets[0].as_str(), targets[1].as_str()];
        let values = (
            value_for(&a.quote, names[0], &names),
            value_for(&b.quote, names[1], &names),
        );
        if let (Some(va), Some(vb)) = values {
            if va.kind == vb.kind {
                let name_a = display_name(targets[0], &a.quote);
                let name_b = display_name(targets[1], &b.quote);
                let (statement, description) = if (va.value - vb.value).abs() < 1e-9 {
                    (
                        format!("{} and {} are equal.", name_a, name_b),
                        format!("{} ({}) equals {} ({})", name_a, va.raw, name_b, vb.raw),
                    )
                } else if va.value > vb.value {
                    (
                        format!("{} exceeds {}.", name_a, name_b),
                        format!("{} ({}) exceeds {} ({})", name_a, va.raw, name_b, vb.raw),
                    )
                } else {
                    (
                        format!("{} exceeds {}.", name_b, name_a),
                        format!("{} ({}) exceeds {} ({})", name_b, vb.raw, name_a, va.raw),
                    )
                };
                draft.inference_chain.push(InferenceStep {
                    step: 1,
                    description,
                    page: None,
                    result: None,
                });
                lines.push(statement);
            }
        }
        draft.status = AnswerStatus::Complete;
    } else {
        draft.status = AnswerStatus::Partial;
    }

    let conflicting = contradicting(gathered, &used);
    used.extend(conflicting);
    draft.evidence = in_gathered_order(gathered, used);
    draft.answer = lines.join("\n");
    draft
}

#[cfg(test)]
mod tests {
    use crate::reasoner::tests::reasoned;
    use claimforge_common::models::{AnswerStatus, ProcessingMode};

    #[test]
    fn test_ordering_step_without_new_numbers() {
        let (ctx, draft) = reasoned(
            "Compare funding for Program Alpha versus Program Beta.",
            &[
                (1, "Program Alpha received $10M in funding."),
                (2, "Program Beta received $15M in funding."),
            ],
        );
        assert_eq!(ctx.question.mode, ProcessingMode::Comparative);
        assert_eq!(draft.status, AnswerStatus::Complete);
        assert_eq!(draft.inference_chain.len(), 1);
        assert!(!draft.calculated);
        assert!(draft.answer.ends_with("Program Beta exceeds Program Alpha."));
    }

    #[test]
    fn test_missing_target_is_partial() {
        let (_, draft) = reasoned(
            "Compare funding for Program Alpha versus Program Beta.",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        assert_eq!(draft.status, AnswerStatus::Partial);
        assert!(draft.reasoning.iter().any(|r| r.contains("program beta")));
    }
}
