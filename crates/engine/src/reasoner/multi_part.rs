//! Multi-part questions: one sub-answer per atomic sub-question

use claimforge_common::constants::DIRECT_COVERAGE;
use claimforge_common::models::{AnswerStatus, DraftAnswer, EvidenceItem, PartAnswer};
use claimforge_common::text::{contains_phrase, coverage, key_terms};

use super::{blank, contradicting, in_gathered_order, quote_line};
use crate::classifier::decompose;
use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;

pub(super) fn answer(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    let mut draft = blank(context);
    let mut used: Vec<EvidenceItem> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for sub_question in decompose(&context.question.text) {
        match best_passage(context, gathered, &sub_question) {
            Some(item) => {
                let line = quote_line(item);
                if !lines.contains(&line) {
                    lines.push(line.clone());
                }
                if !used.contains(item) {
                    used.push(item.clone());
                }
                draft.parts.push(PartAnswer {
                    sub_question,
                    answer: Some(line),
                    support: vec![item.reference()],
                });
            }
            None => {
                draft.push_reasoning(format!("No evidence answers the part: {}", sub_question));
                draft.push_suggestion(format!("Provide pages that address: {}", sub_question));
                draft.parts.push(PartAnswer {
                    sub_question,
                    answer: None,
                    support: Vec::new(),
                });
            }
        }
    }

    let answered = draft.parts.iter().filter(|p| p.answer.is_some()).count();
    if answered == 0 {
        let mut not_found = DraftAnswer::not_found(
            &context.question.text,
            "None of the question's parts is answered by the provided pages.",
        );
        not_found.parts = draft.parts;
        not_found.suggestions = draft.suggestions;
        return not_found;
    }

    let conflicting = contradicting(gathered, &used);
    used.extend(conflicting);
    draft.evidence = in_gathered_order(gathered, used);
    draft.answer = lines.join("\n");
    draft.status = if answered == draft.parts.len() {
        AnswerStatus::Complete
    } else {
        AnswerStatus::Partial
    };
    draft.push_reasoning(format!(
        "The question was split into {} parts; {} answered.",
        draft.parts.len(),
        answered
    ));
    draft
}

/// Highest-coverage passage for a sub-question; ties keep relevance order
fn best_passage<'a>(
    context: &QuestionContext,
    gathered: &'a GatherOutcome,
    sub_question: &str,
) -> Option<&'a EvidenceItem> {
    let terms = key_terms(sub_question);
    let entities = context.extractor.extract(sub_question);

    let mut best: Option<(&EvidenceItem, f64)> = None;
    for item in &gathered.evidence {
        let lower = item.quote.to_lowercase();
        let covered = coverage(&terms, &key_terms(&item.quote));
        let names_entity = entities.iter().any(|e| contains_phrase(&lower, e));
        let answers = covered >= DIRECT_COVERAGE || (names_entity && covered > 0.0);
        if answers && best.map_or(true, |(_, score)| covered > score) {
            best = Some((item, covered));
        }
    }
    best.map(|(item, _)| item)
}
