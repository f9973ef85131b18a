//! Text analysis utilities shared by every engine stage
//!
//! Provides:
//! - Key-term extraction (stop-word filtering + light stemming)
//! - Sentence splitting that keeps decimals intact
//! - Verbatim word-window truncation
//! - Numeric token parsing and formatting
//! - Entity extraction and similarity capabilities (pluggable)

mod entities;
mod numbers;
mod similarity;

pub use entities::{contains_phrase, phrase_position, EntityExtractor, LexicalEntityExtractor};
pub use numbers::{extract_numbers, format_like, NumericKind, NumericToken};
pub use similarity::{LexicalSimilarity, SimilarityProvider};

use std::collections::BTreeSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being",
    "in", "on", "at", "to", "for", "of", "with", "by", "from", "into",
    "and", "or", "but", "not", "this", "that", "these", "those", "there",
    "it", "its", "as", "do", "does", "did", "has", "have", "had",
    "can", "could", "will", "would", "should", "may", "might", "shall",
    "what", "which", "who", "whom", "whose", "when", "where", "why", "how",
    "much", "many", "all", "each", "every", "any", "some", "than", "then",
    "they", "them", "their", "he", "she", "his", "her", "we", "our", "you",
    "your", "about", "also", "only", "such", "per", "via", "over", "under",
];

/// True when the word carries no topical signal
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word.to_lowercase().as_str())
}

/// Light suffix-stripping stemmer.
///
/// Only has to make inflections of one word collide ("funding", "funded",
/// "funds"), not produce dictionary forms.
pub fn stem(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut s: &str = &lower;

    if s.len() > 5 && s.ends_with("ing") {
        s = &s[..s.len() - 3];
    } else if s.len() > 4 && s.ends_with("ed") {
        s = &s[..s.len() - 2];
    } else if s.len() > 4 && s.ends_with("es") {
        s = &s[..s.len() - 2];
    } else if s.len() > 3
        && s.ends_with('s')
        && !s.ends_with("ss")
        && !s.ends_with("us")
        && !s.ends_with("is")
    {
        s = &s[..s.len() - 1];
    }

    if s.len() > 4 && s.ends_with('e') {
        s = &s[..s.len() - 1];
    }

    s.to_string()
}

/// Lowercased alphabetic word tokens, in order
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Stemmed content terms of a text.
///
/// Numeric tokens and stop words are excluded; numbers are handled by
/// [`extract_numbers`].
pub fn key_terms(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.len() >= 3)
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .filter(|w| !is_stop_word(w))
        .map(|w| stem(&w))
        .collect()
}

/// Fraction of `query` terms present in `terms` (0 when `query` is empty)
pub fn coverage(query: &BTreeSet<String>, terms: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    query.intersection(terms).count() as f64 / query.len() as f64
}

/// Jaccard overlap of two term sets
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Split text into sentences.
///
/// Boundaries are `.`, `?`, `!` followed by whitespace (or end of text) and
/// newlines, so `$1.5M` stays in one piece. Returned slices borrow from the
/// input, which keeps quotes verbatim.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let end = match ch {
            '\n' => Some(i),
            '.' | '?' | '!' => match chars.peek() {
                None => Some(i + 1),
                Some((_, next)) if next.is_whitespace() => Some(i + 1),
                _ => None,
            },
            _ => None,
        };

        if let Some(end) = end {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + ch.len_utf8();
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Verbatim prefix of `text` holding at most `max_words` words
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return "";
    }
    let mut words = text.split_whitespace();
    match words.nth(max_words - 1) {
        Some(last) if words.next().is_some() => {
            let end = last.as_ptr() as usize - text.as_ptr() as usize + last.len();
            &text[..end]
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_collapses_inflections() {
        assert_eq!(stem("funding"), stem("funds"));
        assert_eq!(stem("funded"), "fund");
        assert_eq!(stem("increased"), stem("increase"));
        assert_eq!(stem("received"), stem("receive"));
        assert_eq!(stem("programs"), "program");
        assert_eq!(stem("process"), "process");
    }

    #[test]
    fn test_key_terms_drop_numbers_and_stop_words() {
        let terms = key_terms("How much funding did Program Alpha receive in 2024?");
        assert!(terms.contains("fund"));
        assert!(terms.contains("alpha"));
        assert!(terms.contains("receiv"));
        assert!(!terms.contains("much"));
        assert!(!terms.iter().any(|t| t.contains("2024")));
    }

    #[test]
    fn test_sentence_splitting_keeps_decimals() {
        let text = "Program Alpha received $1.5M. Program Beta received $2M!\nTable 3 follows";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "Program Alpha received $1.5M.",
                "Program Beta received $2M!",
                "Table 3 follows"
            ]
        );
    }

    #[test]
    fn test_truncate_words_is_verbatim_prefix() {
        let text = "one  two three four";
        assert_eq!(truncate_words(text, 2), "one  two");
        assert_eq!(truncate_words(text, 4), text);
        assert_eq!(truncate_words(text, 10), text);
        assert!(text.starts_with(truncate_words(text, 3)));
    }

    #[test]
    fn test_coverage_and_jaccard() {
        let q = key_terms("total funding program");
        let t = key_terms("the program received funding");
        assert!((coverage(&q, &t) - 2.0 / 3.0).abs() < 1e-9);
        assert!(jaccard(&q, &t) > 0.0);
        assert_eq!(coverage(&BTreeSet::new(), &t), 0.0);
    }
}
