//! Numeric token parsing
//!
//! Recognises currency amounts, percentages, scaled quantities ("$10M",
//! "1.5 billion") and bare counts, and classifies four-digit calendar years
//! separately so they never count as measured values.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Unit family of a numeric token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Currency,
    Percent,
    Count,
    Year,
}

/// A numeral found in text
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken {
    /// Verbatim text of the numeral, including currency sign and scale
    pub raw: String,
    /// Value normalised to base units (scale applied)
    pub value: f64,
    pub kind: NumericKind,
    /// Verbatim scale suffix ("M", " million", "%"), empty when none
    pub suffix: String,
    /// Multiplier implied by the suffix
    pub multiplier: f64,
    /// Whether the integer part used thousands separators
    pub grouped: bool,
    /// Byte offsets of `raw` in the source text
    pub start: usize,
    pub end: usize,
}

impl NumericToken {
    /// Years are positional, not measured values
    pub fn is_measure(&self) -> bool {
        self.kind != NumericKind::Year
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(\$)?(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?(%|\s?percent\b|\s?(?:thousand|million|billion|trillion)\b|(?:bn|[kmb])\b)?",
        )
        .expect("numeral pattern is valid")
    })
}

fn scale_of(suffix: &str) -> (f64, bool) {
    let normalised = suffix.trim().to_lowercase();
    match normalised.as_str() {
        "%" | "percent" => (1.0, true),
        "k" | "thousand" => (1e3, false),
        "m" | "million" => (1e6, false),
        "b" | "bn" | "billion" => (1e9, false),
        "trillion" => (1e12, false),
        _ => (1.0, false),
    }
}

/// Extract every numeral from `text`, in order of appearance.
///
/// Digits glued to letters ("Q3", "FY2024") are skipped.
pub fn extract_numbers(text: &str) -> Vec<NumericToken> {
    let mut tokens = Vec::new();

    for caps in number_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };

        let glued = text[..whole.start()]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_alphanumeric() || c == '.');
        if glued {
            continue;
        }

        let currency = caps.get(1).is_some();
        let integer = caps.get(2).map_or("", |m| m.as_str());
        let fraction = caps.get(3).map_or("", |m| m.as_str());
        let suffix = caps.get(4).map_or("", |m| m.as_str());

        let grouped = integer.contains(',');
        let digits = format!("{}{}", integer.replace(',', ""), fraction);
        let Ok(base) = digits.parse::<f64>() else { continue };
        let (multiplier, percent) = scale_of(suffix);

        let kind = if currency {
            NumericKind::Currency
        } else if percent {
            NumericKind::Percent
        } else if suffix.is_empty()
            && fraction.is_empty()
            && !grouped
            && integer.len() == 4
            && (1900..=2100).contains(&(base as i64))
        {
            NumericKind::Year
        } else {
            NumericKind::Count
        };

        tokens.push(NumericToken {
            raw: whole.as_str().to_string(),
            value: base * multiplier,
            kind,
            suffix: suffix.to_string(),
            multiplier,
            grouped,
            start: whole.start(),
            end: whole.end(),
        });
    }

    tokens
}

/// Render `value` (base units) in the notation of `template`.
///
/// `format_like(25e6, "$10M")` yields `"$25M"`.
pub fn format_like(value: f64, template: &NumericToken) -> String {
    let scaled = value / template.multiplier;
    let mut number = if (scaled - scaled.round()).abs() < 1e-9 {
        format!("{:.0}", scaled.round())
    } else {
        let fixed = format!("{:.2}", scaled);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    };

    if template.grouped {
        number = group_thousands(&number);
    }

    let prefix = if template.kind == NumericKind::Currency { "$" } else { "" };
    format!("{}{}{}", prefix, number, template.suffix)
}

fn group_thousands(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let mut grouped = String::new();
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_with_scale() {
        let tokens = extract_numbers("Program Alpha received $10M and Beta $1.5 billion.");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].raw, "$10M");
        assert_eq!(tokens[0].kind, NumericKind::Currency);
        assert_eq!(tokens[0].value, 10e6);
        assert_eq!(tokens[1].raw, "$1.5 billion");
        assert_eq!(tokens[1].value, 1.5e9);
    }

    #[test]
    fn test_years_and_percentages() {
        let tokens = extract_numbers("In 2024 the rate rose 12% to 3,400 cases.");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![NumericKind::Year, NumericKind::Percent, NumericKind::Count]
        );
        assert_eq!(tokens[2].value, 3400.0);
        assert!(!tokens[0].is_measure());
    }

    #[test]
    fn test_glued_digits_are_skipped() {
        assert!(extract_numbers("Results for Q3 and FY2024").is_empty());
    }

    #[test]
    fn test_format_like_template() {
        let template = &extract_numbers("$10M")[0];
        assert_eq!(format_like(25e6, template), "$25M");
        assert_eq!(format_like(2.5e6, template), "$2.5M");

        let grouped = &extract_numbers("$10,000")[0];
        assert_eq!(format_like(25_000.0, grouped), "$25,000");

        let words = &extract_numbers("4 million")[0];
        assert_eq!(format_like(9e6, words), "9 million");
    }
}
