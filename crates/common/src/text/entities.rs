//! Entity extraction
//!
//! The engine accepts any [`EntityExtractor`]; without one it falls back to
//! [`LexicalEntityExtractor`], which treats capitalised word runs and
//! acronyms as entities.

use super::{is_stop_word, split_sentences};

/// Capability: pull named entities / key terms from text.
///
/// Implementations return lowercased, de-duplicated entities in order of
/// first appearance.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Words allowed inside a capitalised run ("Department of Energy")
const CONNECTORS: &[&str] = &["of", "for"];

/// Capitalisation-based entity extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalEntityExtractor;

impl LexicalEntityExtractor {
    pub fn new() -> Self {
        Self
    }

    fn sentence_entities(&self, sentence: &str, out: &mut Vec<String>) {
        let tokens: Vec<&str> = sentence.split_whitespace().collect();
        let mut i = 0;

        while i < tokens.len() {
            let (word, closes) = clean(tokens[i]);
            if !is_capitalised(word) {
                i += 1;
                continue;
            }

            let run_start = i;
            let mut run = vec![word];
            let mut run_closed = closes;
            i += 1;

            while i < tokens.len() && !run_closed {
                let (next, next_closes) = clean(tokens[i]);
                if is_capitalised(next) {
                    run.push(next);
                    run_closed = next_closes;
                    i += 1;
                    continue;
                }
                // A connector only joins the run when another capitalised word follows
                let joins = CONNECTORS.contains(&next)
                    && !next_closes
                    && tokens
                        .get(i + 1)
                        .map_or(false, |t| is_capitalised(clean(t).0));
                if !joins {
                    break;
                }
                run.push(next);
                i += 1;
            }

            // A lone capitalised word opening a sentence is ordinary capitalisation
            if run_start == 0 && !is_acronym(run[0]) {
                if run.len() == 1 {
                    continue;
                }
                if run.len() > 2 && CONNECTORS.contains(&run[1]) {
                    run = run.split_off(2);
                }
            }

            while run.first().map_or(false, |w| is_stop_word(w)) {
                run.remove(0);
            }
            while run.last().map_or(false, |w| is_stop_word(w)) {
                run.pop();
            }
            if run.is_empty() {
                continue;
            }

            let entity = run
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            if !out.contains(&entity) {
                out.push(entity);
            }
        }
    }
}

impl EntityExtractor for LexicalEntityExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let mut entities = Vec::new();
        for sentence in split_sentences(text) {
            self.sentence_entities(sentence, &mut entities);
        }
        entities
    }
}

/// Strip surrounding punctuation; report whether trailing punctuation closes a run
fn clean(token: &str) -> (&str, bool) {
    let trimmed_end = token.trim_end_matches(|c: char| !c.is_alphanumeric());
    let closes = trimmed_end.len() < token.len();
    let word = trimmed_end.trim_start_matches(|c: char| !c.is_alphanumeric());
    (word, closes)
}

fn is_capitalised(word: &str) -> bool {
    word.chars().next().map_or(false, |c| c.is_uppercase())
}

fn is_acronym(word: &str) -> bool {
    word.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit())
}

/// Case-insensitive phrase search on word boundaries.
///
/// `haystack` must already be lowercased; `phrase` is lowercased here.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    phrase_position(haystack, phrase).is_some()
}

/// Byte offset of the first word-bounded occurrence of `phrase`
pub fn phrase_position(haystack: &str, phrase: &str) -> Option<usize> {
    let phrase = phrase.to_lowercase();
    if phrase.is_empty() {
        return None;
    }

    haystack
        .match_indices(phrase.as_str())
        .map(|(pos, _)| pos)
        .find(|&pos| {
            let before_ok = haystack[..pos]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = haystack[pos + phrase.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            before_ok && after_ok
        })
}
