//! Aggregate quantitative answers: per-component values and their combination

use claimforge_common::models::{
    cite, AnswerStatus, Component, DraftAnswer, EvidenceItem, EvidenceQuality, InferenceStep,
};
use claimforge_common::text::{
    contains_phrase, extract_numbers, format_like, is_stop_word, stem, words, NumericKind,
    NumericToken,
};

use super::{
    blank, contradicting, direct, display_name, in_gathered_order, join_names, quote_line,
    value_for,
};
use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;

/// Question words that ask for a combined value
const COMBINATION_CUES: &[&str] = &["total", "combined", "sum", "all", "altogether", "overall"];

/// Words that introduce a category ("all programs")
const CATEGORY_CUES: &[&str] = &["all", "every", "each"];

/// Passage words that mark a stated total
const TOTAL_MARKERS: &[&str] = &["total", "combined", "altogether", "in all"];

/// A component together with the evidence that values it
struct Valued<'a> {
    display: String,
    item: &'a EvidenceItem,
    token: NumericToken,
}

pub(super) fn answer(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    let question = &context.question;
    let lower = question.text.to_lowercase();
    let wants_combination = COMBINATION_CUES.iter().any(|c| contains_phrase(&lower, c));
    let names = component_names(context, gathered);

    if wants_combination {
        if let Some(item) = stated_total(gathered, &names) {
            return from_stated_total(context, gathered, item);
        }
    }

    if names.is_empty() {
        let mut draft = direct::answer(context, gathered);
        draft.push_reasoning("No individual components were identified; the most relevant valued passage is reported.");
        return draft;
    }

    let mut draft = blank(context);
    let mut valued: Vec<Valued> = Vec::new();
    let mut missing: Vec<(String, Option<&EvidenceItem>)> = Vec::new();

    let all_names: Vec<&str> = names.iter().map(String::as_str).collect();
    // (page, offset) of every token already credited to a component
    let mut assigned: Vec<(u32, usize)> = Vec::new();

    for name in &names {
        let mentions: Vec<&EvidenceItem> = gathered
            .evidence
            .iter()
            .filter(|e| contains_phrase(&e.quote.to_lowercase(), name))
            .collect();
        let found = mentions.iter().find_map(|item| {
            value_for(&item.quote, name, &all_names)
                .filter(|token| !assigned.contains(&(item.page, token.start)))
                .map(|token| (*item, token))
        });
        if let Some((item, token)) = &found {
            assigned.push((item.page, token.start));
        }

        match found {
            Some((item, token)) => {
                draft.components.push(Component {
                    name: name.clone(),
                    value: Some(token.raw.clone()),
                    page: Some(item.page),
                });
                valued.push(Valued {
                    display: display_name(name, &item.quote),
                    item,
                    token,
                });
            }
            None => {
                let first = mentions.first().copied();
                draft.components.push(Component {
                    name: name.clone(),
                    value: None,
                    page: first.map(|e| e.page),
                });
                let display = first.map_or_else(|| name.clone(), |e| display_name(name, &e.quote));
                missing.push((display, first));
            }
        }
    }

    let mut used: Vec<EvidenceItem> = valued.iter().map(|v| v.item.clone()).collect();
    used.extend(missing.iter().filter_map(|(_, item)| item.map(|e| e.clone())));
    let conflicting = contradicting(gathered, &used);
    used.extend(conflicting);
    draft.evidence = in_gathered_order(gathered, used);

    let kinds_agree = valued
        .windows(2)
        .all(|w| w[0].token.kind == w[1].token.kind);
    let summable = valued
        .first()
        .map_or(false, |v| matches!(v.token.kind, NumericKind::Currency | NumericKind::Count));

    if wants_combination && valued.len() >= 2 && kinds_agree && summable {
        combine(&mut draft, &valued, &lower, missing.is_empty());
    } else {
        draft.answer = valued
            .iter()
            .map(|v| quote_line(v.item))
            .collect::<Vec<_>>()
            .join("\n");
        if !kinds_agree {
            draft.push_reasoning("Components are stated in different units, so no total was computed.");
            draft.push_suggestion("Provide figures for every component in a common unit");
        }
    }

    draft.status = if missing.is_empty() && kinds_agree {
        AnswerStatus::Complete
    } else {
        AnswerStatus::Partial
    };

    for (display, item) in &missing {
        match item {
            Some(e) => draft.push_reasoning(format!(
                "No value is stated for {} (page {}).",
                display, e.page
            )),
            None => draft.push_reasoning(format!("No passage mentions {}.", display)),
        }
        draft.push_suggestion(format!("Provide pages stating the value for {}", display));
    }
    if !missing.is_empty() {
        draft.push_reasoning(format!(
            "The answer covers {} of {} components.",
            valued.len(),
            names.len()
        ));
    }

    if draft.answer.trim().is_empty() {
        draft.answer = draft
            .evidence
            .iter()
            .map(quote_line)
            .collect::<Vec<_>>()
            .join("\n");
    }

    draft
}

/// Record one step per component plus the combination step, and state the result
fn combine(draft: &mut DraftAnswer, valued: &[Valued], question_lower: &str, complete: bool) {
    for (index, v) in valued.iter().enumerate() {
        draft.inference_chain.push(InferenceStep {
            step: index + 1,
            description: format!("{}: {}", v.display, v.token.raw),
            page: Some(v.item.page),
            result: Some(v.token.raw.clone()),
        });
    }

    let sum: f64 = valued.iter().map(|v| v.token.value).sum();
    let total = format_like(sum, &valued[0].token);
    let operands: Vec<&str> = valued.iter().map(|v| v.token.raw.as_str()).collect();
    draft.inference_chain.push(InferenceStep {
        step: valued.len() + 1,
        description: format!("{} = {}", operands.join(" + "), total),
        page: None,
        result: Some(total.clone()),
    });
    draft.calculated = true;

    let pages: Vec<u32> = valued.iter().map(|v| v.item.page).collect();
    let displays: Vec<String> = valued.iter().map(|v| v.display.clone()).collect();
    let lead = if complete { "total" } else { "combined" };
    draft.answer = format!(
        "The {} {} for {} is {} {}.",
        lead,
        metric_noun(question_lower),
        join_names(&displays),
        total,
        cite(&pages)
    );
    draft.push_reasoning(format!(
        "No total is stated, so the {} component values were added.",
        valued.len()
    ));
}

/// Component names: question entities, else evidence entities headed by the
/// category noun of an "all <category>" question
fn component_names(context: &QuestionContext, gathered: &GatherOutcome) -> Vec<String> {
    let question = &context.question;
    if !question.entities.is_empty() {
        return question.entities.clone();
    }

    let Some(category) = category_stem(&question.text) else {
        return Vec::new();
    };

    let mut by_page: Vec<&EvidenceItem> = gathered.evidence.iter().collect();
    by_page.sort_by_key(|e| e.page);

    let mut names = Vec::new();
    for item in by_page {
        for entity in context.extractor.extract(&item.quote) {
            let entity_words = words(&entity);
            let headed = entity_words.len() >= 2
                && entity_words.first().map_or(false, |w| stem(w) == category);
            if headed && !names.contains(&entity) {
                names.push(entity);
            }
        }
    }
    names
}

fn category_stem(question: &str) -> Option<String> {
    let tokens = words(question);
    let at = tokens.iter().position(|w| CATEGORY_CUES.contains(&w.as_str()))?;
    tokens[at + 1..]
        .iter()
        .find(|w| !is_stop_word(w))
        .map(|w| stem(w))
}

/// The word the combination cue qualifies ("total funding" -> "funding")
fn metric_noun(question_lower: &str) -> String {
    let tokens = words(question_lower);
    tokens
        .iter()
        .position(|w| COMBINATION_CUES.contains(&w.as_str()))
        .and_then(|at| {
            tokens[at + 1..].iter().find(|w| {
                !is_stop_word(w)
                    && !COMBINATION_CUES.contains(&w.as_str())
                    && !w.chars().any(|c| c.is_ascii_digit())
            })
        })
        .cloned()
        .unwrap_or_else(|| "value".to_string())
}

/// A direct passage that already states the requested total
fn stated_total<'a>(gathered: &'a GatherOutcome, names: &[String]) -> Option<&'a EvidenceItem> {
    gathered.evidence.iter().find(|item| {
        let lower = item.quote.to_lowercase();
        let mentioned = names.iter().filter(|n| contains_phrase(&lower, n)).count();
        item.quality == EvidenceQuality::Direct
            && TOTAL_MARKERS.iter().any(|m| contains_phrase(&lower, m))
            && extract_numbers(&item.quote).iter().any(|t| t.is_measure())
            && (mentioned == 0 || mentioned == names.len())
    })
}

fn from_stated_total(
    context: &QuestionContext,
    gathered: &GatherOutcome,
    item: &EvidenceItem,
) -> DraftAnswer {
    let mut draft = blank(context);
    let value = value_for(&item.quote, "total", &[]).map(|t| t.raw);

    draft.components.push(Component {
        name: "total".to_string(),
        value,
        page: Some(item.page),
    });

    let mut used = vec![item.clone()];
    used.extend(contradicting(gathered, &used));
    draft.evidence = in_gathered_order(gathered, used);
    draft.answer = draft
        .evidence
        .iter()
        .map(quote_line)
        .collect::<Vec<_>>()
        .join("\n");
    draft.status = AnswerStatus::Complete;
    draft.push_reasoning(format!(
        "The total is stated directly on page {}; no calculation was needed.",
        item.page
    ));
    draft
}
