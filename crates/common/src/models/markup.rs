//! Inline answer markup: page citations and the indicator trailer

use regex_lite::Regex;
use std::sync::OnceLock;

use super::answer::CertaintyCategory;

const TRAILER_OPEN: &str = "[Certainty:";

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\s*\(pp?\. (\d+(?:, \d+)*)\)").expect("citation pattern is valid")
    })
}

fn trailer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[Certainty: (high|medium|low) \((\d\.\d{2})\) \| Completeness: (\d\.\d{2})\]$")
            .expect("trailer pattern is valid")
    })
}

/// Citation marker for a set of pages: `(p. 3)` or `(p. 1, 2)`
pub fn cite(pages: &[u32]) -> String {
    let mut pages = pages.to_vec();
    pages.sort_unstable();
    pages.dedup();
    let list = pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("(p. {})", list)
}

/// Every page number cited in `text`, in order of appearance
pub fn cited_pages(text: &str) -> Vec<u32> {
    citation_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| {
            m.as_str()
                .split(", ")
                .filter_map(|p| p.parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `text` with citation markers removed
pub fn strip_citations(text: &str) -> String {
    citation_pattern().replace_all(text, "").into_owned()
}

/// Rewrite citation markers keeping only pages accepted by `keep`.
///
/// Markers left with no pages are removed.
pub fn retain_citations(text: &str, keep: impl Fn(u32) -> bool) -> String {
    citation_pattern()
        .replace_all(text, |caps: &regex_lite::Captures| {
            let pages: Vec<u32> = caps
                .get(1)
                .map(|m| {
                    m.as_str()
                        .split(", ")
                        .filter_map(|p| p.parse::<u32>().ok())
                        .filter(|p| keep(*p))
                        .collect()
                })
                .unwrap_or_default();
            if pages.is_empty() {
                String::new()
            } else {
                format!(" {}", cite(&pages))
            }
        })
        .into_owned()
}

/// Parsed indicator trailer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicators {
    pub certainty: CertaintyCategory,
    pub certainty_score: f64,
    pub completeness: f64,
}

/// Render the trailer line: `[Certainty: high (0.85) | Completeness: 1.00]`
pub fn render_indicators(certainty: CertaintyCategory, score: f64, completeness: f64) -> String {
    format!(
        "{} {} ({:.2}) | Completeness: {:.2}]",
        TRAILER_OPEN,
        certainty.as_str(),
        score,
        completeness
    )
}

pub fn parse_indicators(line: &str) -> Option<Indicators> {
    let caps = trailer_pattern().captures(line.trim())?;
    let certainty = match caps.get(1)?.as_str() {
        "high" => CertaintyCategory::High,
        "medium" => CertaintyCategory::Medium,
        _ => CertaintyCategory::Low,
    };
    Some(Indicators {
        certainty,
        certainty_score: caps.get(2)?.as_str().parse().ok()?,
        completeness: caps.get(3)?.as_str().parse().ok()?,
    })
}

/// Split an answer into its body and final-line trailer, if any
pub fn split_indicators(answer: &str) -> (&str, Option<&str>) {
    let trimmed = answer.trim_end();
    let (body, last) = match trimmed.rfind('\n') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    };
    if last.trim_start().starts_with(TRAILER_OPEN) {
        (body.trim_end(), Some(last.trim()))
    } else {
        (trimmed, None)
    }
}

/// Answer body with every indicator line removed, wherever it appears
pub fn strip_indicators(answer: &str) -> String {
    answer
        .lines()
        .filter(|line| !line.trim_start().starts_with(TRAILER_OPEN))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// True when an indicator line appears anywhere other than the last line
pub fn has_stray_indicators(answer: &str) -> bool {
    let (body, _) = split_indicators(answer);
    body.lines()
        .any(|line| line.trim_start().starts_with(TRAILER_OPEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citations() {
        assert_eq!(cite(&[2, 1, 2]), "(p. 1, 2)");
        let text = "Alpha received $10M. (p. 1) Total is $25M (p. 1, 2).";
        assert_eq!(cited_pages(text), vec![1, 1, 2]);
        assert_eq!(strip_citations(text), "Alpha received $10M. Total is $25M.");
    }

    #[test]
    fn test_retain_citations_drops_pages() {
        let text = "Alpha rose (p. 3, 99). Beta fell (p. 99).";
        assert_eq!(retain_citations(text, |p| p != 99), "Alpha rose (p. 3). Beta fell.");
    }

    #[test]
    fn test_trailer_round_trip() {
        let line = render_indicators(CertaintyCategory::High, 0.85, 1.0);
        assert_eq!(line, "[Certainty: high (0.85) | Completeness: 1.00]");

        let answer = format!("The total is $25M (p. 1, 2).\n{}", line);
        let (body, trailer) = split_indicators(&answer);
        assert_eq!(body, "The total is $25M (p. 1, 2).");
        let parsed = parse_indicators(trailer.unwrap()).unwrap();
        assert_eq!(parsed.certainty, CertaintyCategory::High);
        assert_eq!(parsed.completeness, 1.0);
    }

    #[test]
    fn test_stray_trailer_detected() {
        let answer = "[Certainty: low (0.10) | Completeness: 0.00]\nBody text.";
        assert_eq!(split_indicators(answer).1, None);
        assert!(has_stray_indicators(answer));
        assert_eq!(strip_indicators(answer), "Body text.");
        assert!(parse_indicators("[Certainty: sure (1) | Completeness: 1]").is_none());
    }
}
