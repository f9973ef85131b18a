//! Reasoner - turns sorted evidence into a draft answer
//!
//! One handler per processing mode. Handlers pick evidence and compose the
//! answer body; shared finishing (detections, numerical metadata, scope)
//! happens here so every mode produces the same audit trail.

mod aggregate;
mod comparative;
mod complex;
mod direct;
mod multi_part;

use claimforge_common::models::{
    cite, strip_citations, DraftAnswer, EvidenceItem, NumericalMetadata, Precision,
    ProcessingMode,
};
use claimforge_common::text::{contains_phrase, extract_numbers, phrase_position, NumericToken};
use tracing::debug;

use crate::context::QuestionContext;
use crate::gatherer::GatherOutcome;
use crate::scope::assess_scope;

const RANGE_CUES: &[&str] = &["between", "ranging", "range of"];
const PROJECTION_CUES: &[&str] = &["projected", "expected", "forecast", "planned", "anticipated", "will"];
const ESTIMATE_CUES: &[&str] = &[
    "estimated",
    "approximately",
    "about",
    "around",
    "roughly",
    "nearly",
    "almost",
];

/// Produce the unscored draft for a question
pub fn reason(context: &QuestionContext, gathered: &GatherOutcome) -> DraftAnswer {
    if gathered.evidence.is_empty() {
        let mut draft = DraftAnswer::not_found(
            &context.question.text,
            "No page in the provided slice was relevant enough to answer the question.",
        );
        draft.push_suggestion("Provide pages that discuss the subject of the question");
        return draft;
    }

    let draft = match context.question.mode {
        ProcessingMode::SimpleFactual
        | ProcessingMode::QuantitativeSingle
        | ProcessingMode::Standard => direct::answer(context, gathered),
        ProcessingMode::QuantitativeAggregate => aggregate::answer(context, gathered),
        ProcessingMode::MultiPartDecompose => multi_part::answer(context, gathered),
        ProcessingMode::Comparative => comparative::answer(context, gathered),
        ProcessingMode::ComplexReasoning => complex::answer(context, gathered),
    };

    debug!(
        mode = context.question.mode.as_str(),
        evidence = draft.evidence.len(),
        steps = draft.inference_chain.len(),
        status = draft.status.as_str(),
        "Draft reasoned"
    );

    finish(context, draft)
}

/// Attach detections, numerical metadata and scope to a handler's draft
pub(crate) fn finish(context: &QuestionContext, mut draft: DraftAnswer) -> DraftAnswer {
    let detections = context.detect(&draft.evidence);
    for contradiction in &detections.contradictions {
        draft.push_reasoning(format!("Conflicting evidence: {}.", contradiction.resolution));
    }
    draft.contradictions = detections.contradictions;
    draft.cross_references = detections.cross_references;
    draft.ambiguities = detections.ambiguities;

    draft.numerical_metadata = numerical_metadata(&draft);
    draft.scope = assess_scope(context, draft.body());
    draft
}

/// Empty draft that handlers fill in
fn blank(context: &QuestionContext) -> DraftAnswer {
    let mut draft = DraftAnswer::not_found(&context.question.text, "");
    draft.reasoning.clear();
    draft
}

/// An evidence quote followed by its page citation
fn quote_line(item: &EvidenceItem) -> String {
    format!("{} {}", item.quote, cite(&[item.page]))
}

/// Gathered items in a contradiction with any of `chosen`, not already chosen
fn contradicting(gathered: &GatherOutcome, chosen: &[EvidenceItem]) -> Vec<EvidenceItem> {
    gathered
        .evidence
        .iter()
        .filter(|candidate| !chosen.contains(candidate))
        .filter(|candidate| {
            gathered.detections.contradictions.iter().any(|c| {
                c.involves(candidate) && chosen.iter().any(|item| c.involves(item))
            })
        })
        .cloned()
        .collect()
}

/// Deduplicate and restore relevance order
fn in_gathered_order(gathered: &GatherOutcome, items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    gathered
        .evidence
        .iter()
        .filter(|e| items.contains(e))
        .cloned()
        .collect()
}

/// Measured value `quote` attributes to `name`.
///
/// `names` are every subject being valued. With no other subject mentioned,
/// the first value after the mention wins, else the first value in the quote.
/// Subjects listed ahead of their values ("A and B received X and Y
/// respectively") are paired by position. Otherwise each subject only owns
/// the values between its mention and the next subject's mention, and gets
/// none when that span holds no value.
fn value_for(quote: &str, name: &str, names: &[&str]) -> Option<NumericToken> {
    let lower = quote.to_lowercase();
    let measures: Vec<NumericToken> = extract_numbers(quote)
        .into_iter()
        .filter(|t| t.is_measure())
        .collect();

    // Lowercasing changed byte offsets; only the unambiguous case is safe
    let aligned = lower.len() == quote.len();

    let mut mentions: Vec<(usize, &str)> = names
        .iter()
        .copied()
        .chain(std::iter::once(name))
        .filter_map(|n| phrase_position(&lower, n).map(|at| (at, n)))
        .collect();
    mentions.sort_unstable();
    mentions.dedup();

    let Some(index) = mentions.iter().position(|(_, n)| *n == name) else {
        return if mentions.is_empty() {
            measures.into_iter().next()
        } else {
            None
        };
    };

    if mentions.len() == 1 {
        let at = mentions[0].0;
        let after = measures.iter().find(|t| aligned && t.start >= at);
        return after.or(measures.first()).cloned();
    }
    if !aligned {
        return None;
    }

    let first_value = measures.first().map_or(usize::MAX, |t| t.start);
    if mentions.iter().all(|(at, _)| *at < first_value) {
        let respectively = contains_phrase(&lower, "respectively");
        let paired = measures.len() == mentions.len()
            || (respectively && measures.len() > mentions.len());
        return if paired {
            measures.into_iter().nth(index)
        } else {
            None
        };
    }

    let start = mentions[index].0;
    let end = mentions.get(index + 1).map_or(quote.len(), |(at, _)| *at);
    measures
        .into_iter()
        .find(|t| t.start >= start && t.end <= end)
}

fn has_measure(text: &str) -> bool {
    extract_numbers(text).iter().any(|t| t.is_measure())
}

/// Original-case rendering of a lowercased entity, as written in `text`
fn display_name(name: &str, text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.len() == text.len() {
        if let Some(at) = lower.find(name) {
            return text[at..at + name.len()].to_string();
        }
    }
    name.to_string()
}

/// "A", "A and B", "A, B and C"
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn precision_of(quote: &str) -> Precision {
    let lower = quote.to_lowercase();
    let has = |cues: &[&str]| cues.iter().any(|c| contains_phrase(&lower, c));
    if has(RANGE_CUES) {
        Precision::Range
    } else if has(PROJECTION_CUES) {
        Precision::Projected
    } else if has(ESTIMATE_CUES) {
        Precision::Estimate
    } else {
        Precision::Exact
    }
}

fn qualifier_of(precision: Precision) -> &'static str {
    match precision {
        Precision::Exact => "stated",
        Precision::Estimate => "approximate",
        Precision::Range => "range bound",
        Precision::Projected => "forecast",
    }
}

/// Metadata for every measured numeral in the answer body
fn numerical_metadata(draft: &DraftAnswer) -> Vec<NumericalMetadata> {
    let claim = strip_citations(draft.body());
    let mut metadata: Vec<NumericalMetadata> = Vec::new();

    for token in extract_numbers(&claim).into_iter().filter(|t| t.is_measure()) {
        if metadata.iter().any(|m| m.value == token.raw) {
            continue;
        }

        let sourced = draft.evidence.iter().find(|e| e.quote.contains(&token.raw));
        let computed = draft
            .inference_chain
            .iter()
            .find(|s| s.result.as_deref() == Some(token.raw.as_str()));

        let entry = match (sourced, computed) {
            (Some(item), _) => {
                let precision = precision_of(&item.quote);
                NumericalMetadata {
                    value: token.raw.clone(),
                    precision,
                    qualifier: qualifier_of(precision).to_string(),
                    page: Some(item.page),
                }
            }
            (None, Some(_)) => {
                let inputs = draft.components.iter().filter(|c| c.value.is_some()).count();
                let precision = if draft
                    .evidence
                    .iter()
                    .any(|e| precision_of(&e.quote) != Precision::Exact)
                {
                    Precision::Estimate
                } else {
                    Precision::Exact
                };
                NumericalMetadata {
                    value: token.raw.clone(),
                    precision,
                    qualifier: format!("computed from {} components", inputs),
                    page: None,
                }
            }
            (None, None) => NumericalMetadata {
                value: token.raw.clone(),
                precision: Precision::Exact,
                qualifier: "unsourced".to_string(),
                page: None,
            },
        };
        metadata.push(entry);
    }

    metadata
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::QuestionClassifier;
    use crate::gatherer::gather_blocking;
    use claimforge_common::config::GatheringConfig;
    use claimforge_common::models::{AnswerStatus, Page};
    use claimforge_common::text::{LexicalEntityExtractor, LexicalSimilarity};
    use std::sync::Arc;

    pub(crate) fn context(question: &str, pages: &[(u32, &str)]) -> QuestionContext {
        let extractor = Arc::new(LexicalEntityExtractor::new());
        let question = QuestionClassifier::new(extractor.clone()).classify(question);
        QuestionContext::new(
            question,
            pages.iter().map(|(n, t)| Page::new(*n, *t)).collect(),
            extractor,
            Arc::new(LexicalSimilarity::new()),
            GatheringConfig::default(),
        )
    }

    pub(crate) fn reasoned(question: &str, pages: &[(u32, &str)]) -> (QuestionContext, DraftAnswer) {
        let ctx = context(question, pages);
        let gathered = gather_blocking(&ctx);
        let draft = reason(&ctx, &gathered);
        (ctx, draft)
    }

    #[test]
    fn test_no_evidence_is_not_found() {
        let (_, draft) = reasoned("Who chairs the board?", &[(1, "Rainfall was average.")]);
        assert_eq!(draft.status, AnswerStatus::NotFound);
        assert!(!draft.suggestions.is_empty());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            join_names(&["A".to_string(), "B".to_string(), "C".to_string()]),
            "A, B and C"
        );
        assert_eq!(display_name("program alpha", "Funding for Program Alpha rose."), "Program Alpha");
        assert_eq!(precision_of("Costs are estimated at $4M."), Precision::Estimate);
        assert_eq!(precision_of("Costs will reach $4M."), Precision::Projected);
        assert_eq!(precision_of("Between $4M and $6M was spent."), Precision::Range);
        let names = ["alpha", "beta"];
        let quote = "Alpha received $10M and Beta received $15M.";
        assert_eq!(value_for(quote, "alpha", &names).unwrap().raw, "$10M");
        assert_eq!(value_for(quote, "beta", &names).unwrap().raw, "$15M");
        assert_eq!(value_for("$4M went to Alpha.", "alpha", &names).unwrap().raw, "$4M");
    }

    #[test]
    fn test_values_are_attributed_per_subject() {
        let names = ["program alpha", "program beta"];

        let listed = "Program Alpha and Program Beta received $10M and $15M respectively.";
        assert_eq!(value_for(listed, "program alpha", &names).unwrap().raw, "$10M");
        assert_eq!(value_for(listed, "program beta", &names).unwrap().raw, "$15M");

        let one_valued = "Program Beta received $15M in funding, while Program Alpha received none.";
        assert_eq!(value_for(one_valued, "program beta", &names).unwrap().raw, "$15M");
        assert!(value_for(one_valued, "program alpha", &names).is_none());

        let shared = "Program Alpha and Program Beta received $25M together.";
        assert!(value_for(shared, "program alpha", &names).is_none());
        assert!(value_for(shared, "program beta", &names).is_none());
    }

    #[test]
    fn test_numerical_metadata_sources() {
        let (_, draft) = reasoned(
            "How much funding did Program Alpha receive?",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        assert_eq!(draft.numerical_metadata.len(), 1);
        let meta = &draft.numerical_metadata[0];
        assert_eq!(meta.value, "$10M");
        assert_eq!(meta.page, Some(1));
        assert_eq!(meta.precision, Precision::Exact);
    }
}
