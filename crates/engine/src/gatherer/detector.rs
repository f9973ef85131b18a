//! Streaming contradiction, cross-reference and ambiguity detection
//!
//! Each pushed item is compared against every item already seen. The
//! detector is deterministic and its output is independent of push order,
//! which lets the Verifier re-run it over a draft's evidence and diff.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use claimforge_common::constants::TOPICAL_OVERLAP;
use claimforge_common::models::{
    AmbiguityFlag, AmbiguityType, Contradiction, ContradictionType, CrossReference, EvidenceItem,
    Page, Question, QuestionType,
};
use claimforge_common::text::{
    contains_phrase, extract_numbers, is_stop_word, jaccard, key_terms, stem, words,
    EntityExtractor,
    NumericKind, NumericToken,
};
use regex_lite::Regex;

/// Opposite-direction word forms, matched on whole lowercase words
const ANTONYMS: &[(&[&str], &[&str])] = &[
    (
        &["increase", "increased", "increases", "increasing"],
        &["decrease", "decreased", "decreases", "decreasing"],
    ),
    (&["above"], &["below"]),
    (&["higher"], &["lower"]),
    (
        &["rise", "rises", "rose", "rising", "risen"],
        &["fall", "falls", "fell", "falling", "fallen"],
    ),
    (&["gain", "gains", "gained"], &["loss", "losses", "lost"]),
    (
        &["expand", "expanded", "expands", "expansion"],
        &["reduce", "reduced", "reduces", "reduction"],
    ),
];

/// Stemmed question term, then (sense, cue prefixes)
const POLYSEMY: &[(&str, &[(&str, &[&str])])] = &[
    (
        "fund",
        &[
            ("appropriation", &["appropriat", "allocat", "budgeted"]),
            ("obligation", &["obligat", "committed", "awarded"]),
            ("outlay", &["outlay", "spent", "disburs", "expended"]),
        ],
    ),
    (
        "cost",
        &[
            ("estimated cost", &["estimat", "projected"]),
            ("actual cost", &["actual", "incurred"]),
        ],
    ),
    ("revenu", &[("gross", &["gross"]), ("net", &["net"])]),
];

const PRONOUNS: &[&str] = &["it", "its", "they", "them", "their", "he", "she", "his", "her"];

/// Content words that never name what a later pronoun refers to
const NON_REFERENTS: &[&str] = &[
    "after", "before", "since", "during", "later", "earlier", "previously", "subsequently",
    "last", "next", "year", "years", "quarter", "month", "now", "recently",
];

const RELATIVE_TIME: &[&str] = &[
    "last year",
    "next year",
    "this year",
    "previous year",
    "prior year",
    "last quarter",
    "next quarter",
    "last month",
    "recently",
];

fn explicit_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:see|refer to|as described in|as discussed in|as shown in|described in|discussed in|detailed in)\s+((?:section|page|appendix|table|figure|chapter|annex)\s+[a-z0-9][a-z0-9.\-]*)",
        )
        .expect("reference pattern is valid")
    })
}

fn relative_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:discussed|described|detailed|explained|shown|outlined)\s+(below|above)\b")
            .expect("relative reference pattern is valid")
    })
}

/// A referential phrase found in text
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatch {
    pub mention: String,
    pub label: String,
}

/// Every referential phrase in `text`, in order
pub fn find_references(text: &str) -> Vec<ReferenceMatch> {
    let mut found = Vec::new();
    for pattern in [explicit_reference(), relative_reference()] {
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            found.push((
                whole.start(),
                ReferenceMatch {
                    mention: whole.as_str().trim_end_matches('.').to_string(),
                    label: label.as_str().trim_end_matches('.').to_string(),
                },
            ));
        }
    }
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, m)| m).collect()
}

/// Page numbers and heading lines of the slice, for resolving references
#[derive(Debug, Clone, Default)]
pub struct SliceIndex {
    numbers: BTreeSet<u32>,
    lines: Vec<(u32, String)>,
}

impl SliceIndex {
    pub fn new(pages: &[Page]) -> Self {
        let numbers = pages.iter().map(|p| p.number).collect();
        let lines = pages
            .iter()
            .flat_map(|p| {
                p.text
                    .lines()
                    .map(|l| l.trim().to_lowercase())
                    .filter(|l| !l.is_empty())
                    .map(move |l| (p.number, l))
            })
            .collect();
        Self { numbers, lines }
    }

    pub fn contains_page(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    /// Resolve a reference label to (target, in_slice)
    fn resolve(&self, label: &str, source_page: u32) -> (String, bool) {
        let lower = label.to_lowercase();
        match lower.as_str() {
            "below" => (
                "later pages".to_string(),
                self.numbers.iter().any(|&n| n > source_page),
            ),
            "above" => (
                "earlier pages".to_string(),
                self.numbers.iter().any(|&n| n < source_page),
            ),
            _ => {
                if let Some(number) = lower.strip_prefix("page ") {
                    let in_slice = number
                        .trim()
                        .parse::<u32>()
                        .map_or(false, |n| self.contains_page(n));
                    return (label.to_string(), in_slice);
                }
                let in_slice = self.lines.iter().any(|(_, line)| {
                    line.strip_prefix(lower.as_str()).map_or(false, |rest| {
                        rest.chars()
                            .next()
                            .map_or(true, |c| !c.is_alphanumeric() && c != '.')
                            || rest.starts_with(". ")
                    })
                });
                (label.to_string(), in_slice)
            }
        }
    }
}

/// Detection results for a set of evidence items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    pub contradictions: Vec<Contradiction>,
    pub cross_references: Vec<CrossReference>,
    pub ambiguities: Vec<AmbiguityFlag>,
}

/// Per-item features computed once on push
struct Seen {
    item: EvidenceItem,
    entities: Vec<String>,
    /// Question entities the quote mentions
    subjects: BTreeSet<String>,
    terms: BTreeSet<String>,
    metric_terms: BTreeSet<String>,
    measures: Vec<NumericToken>,
    years: BTreeSet<i64>,
    /// (antonym pair index, side)
    directions: Vec<(usize, usize)>,
}

/// Stateful detector fed one evidence item at a time
pub struct StreamingDetector<'a> {
    question: &'a Question,
    slice: &'a SliceIndex,
    extractor: &'a dyn EntityExtractor,
    tolerance: f64,
    seen: Vec<Seen>,
    contradictions: Vec<Contradiction>,
    cross_references: Vec<CrossReference>,
    flags: Vec<AmbiguityFlag>,
    senses: BTreeMap<&'static str, BTreeSet<usize>>,
}

impl<'a> StreamingDetector<'a> {
    pub fn new(
        question: &'a Question,
        slice: &'a SliceIndex,
        extractor: &'a dyn EntityExtractor,
        tolerance: f64,
    ) -> Self {
        Self {
            question,
            slice,
            extractor,
            tolerance,
            seen: Vec::new(),
            contradictions: Vec::new(),
            cross_references: Vec::new(),
            flags: Vec::new(),
            senses: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, item: &EvidenceItem) {
        let seen = self.features(item);

        let found: Vec<Contradiction> = self
            .seen
            .iter()
            .filter_map(|earlier| self.compare(earlier, &seen))
            .collect();
        for contradiction in found {
            let key = contradiction.key();
            if !self.contradictions.iter().any(|c| c.key() == key) {
                self.contradictions.push(contradiction);
            }
        }

        self.detect_references(&seen);
        self.detect_ambiguity(&seen);
        self.seen.push(seen);
    }

    /// Finalise detection; output is sorted so it does not depend on push order
    pub fn finish(mut self) -> Detections {
        let polysemy = self.polysemy_flags();
        self.flags.extend(polysemy);

        let mut contradictions = self.contradictions;
        for c in contradictions.iter_mut() {
            c.evidence.sort();
        }
        contradictions.sort_by(|a, b| a.key().cmp(&b.key()));

        let mut cross_references = self.cross_references;
        cross_references.sort_by(|a, b| a.key().cmp(&b.key()));

        let mut ambiguities = self.flags;
        ambiguities.sort_by(|a, b| a.key().cmp(&b.key()));

        Detections {
            contradictions,
            cross_references,
            ambiguities,
        }
    }

    fn features(&self, item: &EvidenceItem) -> Seen {
        let lower = item.quote.to_lowercase();

        let mut entities = self.extractor.extract(&item.quote);
        let mut subjects = BTreeSet::new();
        for entity in &self.question.entities {
            if contains_phrase(&lower, entity) {
                subjects.insert(entity.clone());
                if !entities.contains(entity) {
                    entities.push(entity.clone());
                }
            }
        }

        let terms = key_terms(&item.quote);
        let entity_stems: BTreeSet<String> = entities
            .iter()
            .flat_map(|e| words(e))
            .map(|w| stem(&w))
            .collect();
        let metric_terms = terms.difference(&entity_stems).cloned().collect();

        let numbers = extract_numbers(&item.quote);
        let years = numbers
            .iter()
            .filter(|t| t.kind == NumericKind::Year)
            .map(|t| t.value as i64)
            .collect();
        let measures = numbers.into_iter().filter(|t| t.is_measure()).collect();

        let item_words: BTreeSet<String> = words(&item.quote).into_iter().collect();
        let mut directions = Vec::new();
        for (pair, (up, down)) in ANTONYMS.iter().enumerate() {
            if up.iter().any(|w| item_words.contains(*w)) {
                directions.push((pair, 0));
            }
            if down.iter().any(|w| item_words.contains(*w)) {
                directions.push((pair, 1));
            }
        }

        Seen {
            item: item.clone(),
            entities,
            subjects,
            terms,
            metric_terms,
            measures,
            years,
            directions,
        }
    }

    fn compare(&self, a: &Seen, b: &Seen) -> Option<Contradiction> {
        let (a, b) = if a.item.reference() <= b.item.reference() {
            (a, b)
        } else {
            (b, a)
        };
        let shares_entity = a.entities.iter().any(|e| b.entities.contains(e));

        if shares_entity {
            if let Some(conflict) = self.numerical_conflict(a, b) {
                return Some(conflict);
            }
        }

        let opposite = a.directions.iter().any(|&(pair, side)| {
            b.directions.contains(&(pair, 1 - side)) && !b.directions.contains(&(pair, side))
        });
        let topical = shares_entity || jaccard(&a.terms, &b.terms) >= TOPICAL_OVERLAP;
        if opposite && topical {
            return Some(Contradiction {
                kind: ContradictionType::QualitativeConflict,
                evidence: vec![a.item.reference(), b.item.reference()],
                resolution: format!(
                    "Pages {} and {} describe opposite directions; both passages are reported",
                    a.item.page, b.item.page
                ),
                confidence: 0.8,
            });
        }

        None
    }

    fn numerical_conflict(&self, a: &Seen, b: &Seen) -> Option<Contradiction> {
        // A figure for several subjects is not comparable with one for a single subject
        if a.subjects != b.subjects {
            return None;
        }
        if !a.years.is_empty() && !b.years.is_empty() && a.years != b.years {
            return None;
        }
        if jaccard(&a.metric_terms, &b.metric_terms) < TOPICAL_OVERLAP {
            return None;
        }

        for x in &a.measures {
            let Some(y) = b.measures.iter().find(|t| t.kind == x.kind) else {
                continue;
            };
            let scale = x.value.abs().max(y.value.abs());
            if scale == 0.0 {
                continue;
            }
            let difference = (x.value - y.value).abs() / scale;
            if difference > self.tolerance {
                return Some(Contradiction {
                    kind: ContradictionType::NumericalConflict,
                    evidence: vec![a.item.reference(), b.item.reference()],
                    resolution: format!(
                        "{} on page {} and {} on page {} differ by {:.0}%; the more relevant figure is reported",
                        x.raw,
                        a.item.page,
                        y.raw,
                        b.item.page,
                        difference * 100.0
                    ),
                    confidence: 0.9,
                });
            }
        }

        None
    }

    fn detect_references(&mut self, seen: &Seen) {
        for found in find_references(&seen.item.quote) {
            let (target, in_slice) = self.slice.resolve(&found.label, seen.item.page);
            let reference = CrossReference {
                mention: found.mention,
                target,
                source_page: seen.item.page,
                in_slice,
                impact: if in_slice {
                    "Referenced content is within the provided pages".to_string()
                } else {
                    "Referenced content lies outside the provided pages; the answer may be incomplete"
                        .to_string()
                },
            };
            let key = reference.key();
            if !self.cross_references.iter().any(|r| r.key() == key) {
                self.cross_references.push(reference);
            }
        }
    }

    fn detect_ambiguity(&mut self, seen: &Seen) {
        let lower = seen.item.quote.to_lowercase();
        let item_words = words(&seen.item.quote);

        for (term, senses) in POLYSEMY {
            if !self.question.terms.contains(*term) {
                continue;
            }
            for (index, (_, cues)) in senses.iter().enumerate() {
                if item_words.iter().any(|w| cue_matches(w, cues)) {
                    self.senses.entry(*term).or_default().insert(index);
                }
            }
        }

        if let Some(pronoun) = unresolved_pronoun(&item_words) {
            self.push_flag(AmbiguityFlag {
                kind: AmbiguityType::VagueReference,
                subject: seen.item.quote.clone(),
                note: format!(
                    "Passage on page {} uses '{}' before naming its subject",
                    seen.item.page, pronoun
                ),
                interpretation: "Read as referring to the subject of the question".to_string(),
            });
        }

        if self.question.question_type == QuestionType::Temporal && seen.years.is_empty() {
            if let Some(expression) = RELATIVE_TIME.iter().find(|e| contains_phrase(&lower, e)) {
                self.push_flag(AmbiguityFlag {
                    kind: AmbiguityType::TemporalAmbiguity,
                    subject: seen.item.quote.clone(),
                    note: format!(
                        "Passage on page {} says '{}' without an explicit year",
                        seen.item.page, expression
                    ),
                    interpretation: "Read relative to the document's reporting period".to_string(),
                });
            }
        }
    }

    fn push_flag(&mut self, flag: AmbiguityFlag) {
        let key = flag.key();
        if !self.flags.iter().any(|f| f.key() == key) {
            self.flags.push(flag);
        }
    }

    fn polysemy_flags(&self) -> Vec<AmbiguityFlag> {
        let mut flags = Vec::new();
        for (term, senses) in POLYSEMY {
            let Some(used) = self.senses.get(term) else {
                continue;
            };
            if used.len() < 2 {
                continue;
            }

            let word = words(&self.question.text)
                .into_iter()
                .find(|w| stem(w) == *term)
                .unwrap_or_else(|| term.to_string());
            let labels: Vec<&str> = used.iter().map(|&i| senses[i].0).collect();

            flags.push(AmbiguityFlag {
                kind: AmbiguityType::MultipleInterpretations,
                subject: term.to_string(),
                note: format!(
                    "'{}' is used in several senses: {}",
                    word,
                    labels.join(", ")
                ),
                interpretation: format!("Read as {}", labels[0]),
            });
        }
        flags
    }
}

/// First pronoun with no candidate antecedent earlier in the same passage
fn unresolved_pronoun(item_words: &[String]) -> Option<&str> {
    let mut named = false;
    for word in item_words {
        if PRONOUNS.contains(&word.as_str()) {
            if !named {
                return Some(word);
            }
        } else if !is_stop_word(word)
            && !NON_REFERENTS.contains(&word.as_str())
            && !word.chars().any(|c| c.is_ascii_digit())
        {
            named = true;
        }
    }
    None
}

fn cue_matches(word: &str, cues: &[&str]) -> bool {
    cues.iter()
        .any(|cue| word == *cue || (cue.len() >= 5 && word.starts_with(cue)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::QuestionClassifier;
    use claimforge_common::models::{EvidenceQuality, EvidenceType};
    use claimforge_common::text::LexicalEntityExtractor;
    use std::sync::Arc;

    fn question(text: &str) -> Question {
        QuestionClassifier::new(Arc::new(LexicalEntityExtractor::new())).classify(text)
    }

    fn item(page: u32, quote: &str) -> EvidenceItem {
        EvidenceItem {
            quote: quote.to_string(),
            page,
            quality: EvidenceQuality::Direct,
            evidence_type: EvidenceType::ExplicitStatement,
            relevance_score: 0.8,
            essential: false,
        }
    }

    fn detect(question: &Question, pages: &[Page], items: &[EvidenceItem]) -> Detections {
        let slice = SliceIndex::new(pages);
        let extractor = LexicalEntityExtractor::new();
        let mut detector = StreamingDetector::new(question, &slice, &extractor, 0.05);
        for item in items {
            detector.push(item);
        }
        detector.finish()
    }

    #[test]
    fn test_qualitative_contradiction() {
        let q = question("How did funding for Program Alpha change?");
        let items = [
            item(3, "Funding for Program Alpha increased in 2024."),
            item(7, "Funding for Program Alpha decreased in 2024."),
        ];
        let found = detect(&q, &[], &items);
        assert_eq!(found.contradictions.len(), 1);
        assert_eq!(
            found.contradictions[0].kind,
            ContradictionType::QualitativeConflict
        );
    }

    #[test]
    fn test_numerical_contradiction_respects_years_and_tolerance() {
        let q = question("How much funding did Program Alpha receive?");
        let conflicting = [
            item(1, "Program Alpha received $10M in funding."),
            item(5, "Program Alpha received $12M in funding."),
        ];
        let found = detect(&q, &[], &conflicting);
        assert_eq!(found.contradictions.len(), 1);
        assert_eq!(found.contradictions[0].kind, ContradictionType::NumericalConflict);

        let different_years = [
            item(1, "Program Alpha received $10M in funding in 2023."),
            item(5, "Program Alpha received $12M in funding in 2024."),
        ];
        assert!(detect(&q, &[], &different_years).contradictions.is_empty());

        let within_tolerance = [
            item(1, "Program Alpha received $10M in funding."),
            item(5, "Program Alpha received $10.2M in funding."),
        ];
        assert!(detect(&q, &[], &within_tolerance).contradictions.is_empty());
    }

    #[test]
    fn test_distinct_entities_do_not_conflict() {
        let q = question("What is the total funding for Program Alpha and Program Beta?");
        let items = [
            item(1, "Program Alpha received $10M in funding."),
            item(2, "Program Beta received $15M in funding."),
        ];
        assert!(detect(&q, &[], &items).contradictions.is_empty());
    }

    #[test]
    fn test_detection_is_order_independent() {
        let q = question("How did funding for Program Alpha change?");
        let a = item(3, "Funding for Program Alpha increased in 2024.");
        let b = item(7, "Funding for Program Alpha decreased in 2024.");
        assert_eq!(
            detect(&q, &[], &[a.clone(), b.clone()]),
            detect(&q, &[], &[b, a])
        );
    }

    #[test]
    fn test_cross_reference_resolution() {
        let q = question("What controls apply to Program Alpha?");
        let pages = [
            Page::new(2, "Program Alpha controls are listed. See Section 4.2 for details."),
            Page::new(5, "Section 4.2 Controls\nAudits run quarterly."),
        ];
        let items = [
            item(2, "See Section 4.2 for details."),
            item(2, "Limits are discussed below."),
            item(5, "Further detail is in Appendix C."),
            item(5, "See Appendix C."),
        ];
        let found = detect(&q, &pages, &items);
        assert_eq!(found.cross_references.len(), 3);

        let section = found
            .cross_references
            .iter()
            .find(|r| r.target == "Section 4.2")
            .unwrap();
        assert!(section.in_slice);

        let below = found
            .cross_references
            .iter()
            .find(|r| r.target == "later pages")
            .unwrap();
        assert!(below.in_slice);

        let appendix = found
            .cross_references
            .iter()
            .find(|r| r.target == "Appendix C")
            .unwrap();
        assert!(!appendix.in_slice);
    }

    #[test]
    fn test_polysemy_and_vague_reference() {
        let q = question("How much funding did Program Alpha get?");
        let items = [
            item(1, "Program Alpha was appropriated $10M in funding."),
            item(2, "Program Alpha spent $6M of its funding."),
            item(3, "It was later expanded."),
        ];
        let found = detect(&q, &[], &items);
        let kinds: Vec<_> = found.ambiguities.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AmbiguityType::MultipleInterpretations));
        assert!(kinds.contains(&AmbiguityType::VagueReference));
    }

    #[test]
    fn test_pronoun_anywhere_needs_an_antecedent() {
        let q = question("How much funding did Program Alpha get?");
        let vague = |quote: &str| {
            detect(&q, &[], &[item(2, quote)])
                .ambiguities
                .iter()
                .any(|a| a.kind == AmbiguityType::VagueReference)
        };

        assert!(vague("In 2023 they received $4M."));
        assert!(vague("Since then it was funded at $4M."));
        assert!(vague("It funded Program Alpha."));
        assert!(!vague("Program Alpha grew after it was funded."));
        assert!(!vague("Funding rose after it was approved."));
        assert!(!vague("The agency said its budget was $4M."));

        assert_eq!(unresolved_pronoun(&words("In 2023 they received $4M.")), Some("they"));
        assert_eq!(unresolved_pronoun(&words("Program Alpha received $4M.")), None);
    }

    #[test]
    fn test_temporal_ambiguity() {
        let q = question("When did Program Alpha launch?");
        let items = [item(4, "Program Alpha launched last year.")];
        let found = detect(&q, &[], &items);
        assert_eq!(found.ambiguities.len(), 1);
        assert_eq!(found.ambiguities[0].kind, AmbiguityType::TemporalAmbiguity);
    }
}
