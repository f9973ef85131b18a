//! Question classifier - type, scope and processing mode
//!
//! Cue tables are checked in a fixed precedence order; the first family
//! that matches decides the question type.

use std::sync::{Arc, OnceLock};

use claimforge_common::models::{ProcessingMode, Question, QuestionScope, QuestionType};
use claimforge_common::text::{contains_phrase, key_terms, word_count, EntityExtractor};
use regex_lite::Regex;

const COMPARATIVE_CUES: &[&str] = &[
    "compare",
    "compared",
    "comparison",
    "versus",
    "vs",
    "difference between",
    "higher than",
    "lower than",
    "greater than",
    "larger than",
    "smaller than",
];

const QUANTITATIVE_CUES: &[&str] = &[
    "how much",
    "how many",
    "total",
    "amount",
    "sum",
    "number of",
    "percent",
    "percentage",
    "cost",
    "budget",
    "average",
    "rate",
];

const TEMPORAL_CUES: &[&str] = &[
    "when",
    "what year",
    "which year",
    "what date",
    "deadline",
    "timeline",
    "how long",
];

const CAUSAL_CUES: &[&str] = &[
    "why",
    "cause",
    "caused",
    "causes",
    "reason",
    "reasons",
    "effect of",
    "impact of",
    "led to",
    "due to",
];

const COMPLEX_CUES: &[&str] = &[
    "analyze",
    "analyse",
    "analysis",
    "evaluate",
    "assess",
    "implications",
];

const COMPREHENSIVE_CUES: &[&str] = &["all", "every", "each", "list", "entire"];

const AGGREGATE_CUES: &[&str] = &[
    "total",
    "combined",
    "sum",
    "overall",
    "aggregate",
    "altogether",
];

/// Openers of a question whose subject may be a coordinated noun phrase
const HEAD_WORDS: &[&str] = &["what", "which", "who"];

/// Linking verb and the form used in a single-subject sub-question
const HEAD_VERBS: &[(&str, &str)] = &[("is", "is"), ("are", "is"), ("was", "was"), ("were", "was")];

const DETERMINERS: &[&str] = &["the", "its", "their"];

const PREPOSITIONS: &[&str] = &["of", "for", "in", "at", "on"];

/// Questions longer than this are treated as complex
const COMPLEX_WORD_COUNT: usize = 25;

fn wh_conjunction() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i),?\s+and\s+(what|which|who|when|where|why|how)\b")
            .expect("conjunction pattern is valid")
    })
}

fn enumeration_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|\s)\(?(?:[1-9]|[a-e])\)\s").expect("enumeration pattern is valid")
    })
}

fn has_cue(lower: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| contains_phrase(lower, cue))
}

/// Classifies raw question text into a [`Question`]
#[derive(Clone)]
pub struct QuestionClassifier {
    extractor: Arc<dyn EntityExtractor>,
}

impl QuestionClassifier {
    pub fn new(extractor: Arc<dyn EntityExtractor>) -> Self {
        Self { extractor }
    }

    pub fn classify(&self, text: &str) -> Question {
        let text = text.trim();
        let lower = text.to_lowercase();

        let question_type = detect_type(text, &lower);
        let scope = detect_scope(&lower);
        let mode = ProcessingMode::select(question_type, scope);

        Question {
            text: text.to_string(),
            question_type,
            scope,
            mode,
            entities: self.extractor.extract(text),
            terms: key_terms(text),
        }
    }
}

fn detect_type(text: &str, lower: &str) -> QuestionType {
    if has_cue(lower, COMPARATIVE_CUES) {
        return QuestionType::Comparative;
    }

    if is_multi_part(text) {
        return QuestionType::MultiPart;
    }

    if has_cue(lower, QUANTITATIVE_CUES) {
        return QuestionType::Quantitative;
    }

    if has_cue(lower, TEMPORAL_CUES) {
        return QuestionType::Temporal;
    }

    if has_cue(lower, CAUSAL_CUES) {
        return QuestionType::Causal;
    }

    if has_cue(lower, COMPLEX_CUES) || word_count(text) > COMPLEX_WORD_COUNT {
        return QuestionType::Complex;
    }

    QuestionType::Factual
}

fn detect_scope(lower: &str) -> QuestionScope {
    if has_cue(lower, COMPREHENSIVE_CUES) {
        QuestionScope::Comprehensive
    } else if has_cue(lower, AGGREGATE_CUES) {
        QuestionScope::Aggregate
    } else {
        QuestionScope::Specific
    }
}

fn is_multi_part(text: &str) -> bool {
    text.matches('?').count() >= 2
        || text.contains(';')
        || enumeration_marker().find_iter(text).count() >= 2
        || wh_conjunction().is_match(text)
        || text
            .split(|c| c == '?' || c == ';')
            .any(|clause| split_coordinated(clause.trim()).is_some())
}

/// Split "what are the budget and the deadline of X" into one clause per
/// coordinated noun phrase, each followed by the shared tail.
///
/// Every conjunct must be a determiner plus plain lowercase words, which
/// keeps entity lists ("for Program Alpha and Program Beta") whole.
fn split_coordinated(clause: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = clause.split_whitespace().collect();
    let [head, verb, rest @ ..] = tokens.as_slice() else {
        return None;
    };
    if !HEAD_WORDS.contains(&head.to_lowercase().as_str()) {
        return None;
    }
    let singular = HEAD_VERBS
        .iter()
        .find(|(form, _)| verb.eq_ignore_ascii_case(form))?
        .1;

    let and_at = rest.iter().position(|t| *t == "and")?;
    let tail_at = rest[and_at + 1..]
        .iter()
        .position(|t| PREPOSITIONS.contains(t))
        .map_or(rest.len(), |i| and_at + 1 + i);

    let mut conjuncts: Vec<String> = rest[..and_at]
        .join(" ")
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    conjuncts.push(rest[and_at + 1..tail_at].join(" "));

    if conjuncts.len() < 2 || !conjuncts.iter().all(|c| is_plain_noun_phrase(c)) {
        return None;
    }

    let tail = rest[tail_at..].join(" ");
    Some(
        conjuncts
            .iter()
            .map(|c| {
                if tail.is_empty() {
                    format!("{} {} {}", head, singular, c)
                } else {
                    format!("{} {} {} {}", head, singular, c, tail)
                }
            })
            .collect(),
    )
}

fn is_plain_noun_phrase(phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    words.len() >= 2
        && DETERMINERS.contains(&words[0])
        && words[1..].iter().all(|w| {
            !PREPOSITIONS.contains(w) && w.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        })
}

/// Split a multi-part question into atomic sub-questions.
///
/// Enumerated items ("(1) ... (2) ...") inherit the lead-in before the first
/// marker. Returns the whole question when it has a single part.
pub fn decompose(text: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();

    let pieces: Vec<&str> = enumeration_marker().split(text).collect();
    if pieces.len() >= 3 {
        let lead = pieces[0].trim();
        for item in &pieces[1..] {
            segments.push(format!("{} {}", lead, item.trim()));
        }
    } else {
        segments.push(text.to_string());
    }

    let mut parts = Vec::new();
    for segment in &segments {
        for clause in segment.split(|c| c == '?' || c == ';') {
            let mut start = 0;
            for caps in wh_conjunction().captures_iter(clause) {
                let (Some(whole), Some(wh)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                parts.push(&clause[start..whole.start()]);
                start = wh.start();
            }
            parts.push(&clause[start..]);
        }
    }

    let parts: Vec<String> = parts
        .into_iter()
        .map(|p| p.trim().trim_end_matches(',').trim())
        .filter(|p| !p.is_empty())
        .flat_map(|p| split_coordinated(p).unwrap_or_else(|| vec![p.to_string()]))
        .map(|p| format!("{}?", p))
        .collect();

    if parts.is_empty() {
        vec![text.trim().to_string()]
    } else {
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimforge_common::text::LexicalEntityExtractor;

    fn classifier() -> QuestionClassifier {
        QuestionClassifier::new(Arc::new(LexicalEntityExtractor::new()))
    }

    #[test]
    fn test_aggregate_question() {
        let q = classifier().classify("What is the total funding for Program Alpha and Program Beta?");
        assert_eq!(q.question_type, QuestionType::Quantitative);
        assert_eq!(q.scope, QuestionScope::Aggregate);
        assert_eq!(q.mode, ProcessingMode::QuantitativeAggregate);
        assert_eq!(q.entities, vec!["program alpha", "program beta"]);
    }

    #[test]
    fn test_comprehensive_scope() {
        let q = classifier().classify("What is the total funding for all programs?");
        assert_eq!(q.scope, QuestionScope::Comprehensive);
        assert_eq!(q.mode, ProcessingMode::QuantitativeAggregate);
    }

    #[test]
    fn test_precedence() {
        let c = classifier();
        assert_eq!(
            c.classify("Compare the budget of Alpha versus Beta").question_type,
            QuestionType::Comparative
        );
        assert_eq!(
            c.classify("What is the budget and when does it expire?").question_type,
            QuestionType::MultiPart
        );
        assert_eq!(
            c.classify("When was the program launched?").question_type,
            QuestionType::Temporal
        );
        assert_eq!(
            c.classify("Why did the program stall?").mode,
            ProcessingMode::ComplexReasoning
        );
        assert_eq!(
            c.classify("How did funding for Program Alpha change?").mode,
            ProcessingMode::SimpleFactual
        );
    }

    #[test]
    fn test_cues_match_whole_words() {
        // "separate" must not trigger the "rate" cue
        let q = classifier().classify("Which office runs the separate grant?");
        assert_eq!(q.question_type, QuestionType::Factual);
    }

    #[test]
    fn test_decompose() {
        assert_eq!(
            decompose("What is the budget and when does it expire?"),
            vec!["What is the budget?", "when does it expire?"]
        );
        assert_eq!(
            decompose("Who leads Alpha? What does it cost?"),
            vec!["Who leads Alpha?", "What does it cost?"]
        );
        assert_eq!(
            decompose("List (1) the sponsor (2) the budget"),
            vec!["List the sponsor?", "List the budget?"]
        );
        assert_eq!(decompose("Who leads Alpha?"), vec!["Who leads Alpha?"]);
    }

    #[test]
    fn test_coordinated_noun_phrases_split() {
        let question = "What are the budget and the deadline of Program Alpha?";
        assert_eq!(classifier().classify(question).mode, ProcessingMode::MultiPartDecompose);
        assert_eq!(
            decompose(question),
            vec![
                "What is the budget of Program Alpha?",
                "What is the deadline of Program Alpha?"
            ]
        );
        assert_eq!(
            decompose("What were the sponsor, the budget and the audit outcome?"),
            vec![
                "What was the sponsor?",
                "What was the budget?",
                "What was the audit outcome?"
            ]
        );
        // Entity lists are components of one quantity, not separate parts
        let aggregate = "What is the total funding for Program Alpha and Program Beta?";
        assert_eq!(decompose(aggregate), vec![aggregate]);
    }
}
