//! Order amount extraction.
//!
//! Amounts arrive either as amount-shaped digit runs ("250 000", "412ming",
//! "summa 300000") or as spoken Uzbek number phrases ("ikki yuz ellik
//! ming"). Amounts are whole units, never fractional; when several
//! candidates appear, the largest wins.
//!
//! Bare digit runs are NOT candidates: quantities ("latte 2ta") and phone
//! numbers carry digits too, and a wrong amount would be locked in
//! first-wins for the rest of the session.

use std::sync::LazyLock;

use regex::Regex;

use super::keywords::{self, AMOUNT_KEYWORDS};

/// "412ming", "412 min", "412 мин" -- thousands shorthand.
static MING_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{2,4})\s*(?:ming|min|мин|минг)\b").expect("ming shape pattern")
});

/// "250 000", "300000" -- an explicit thousands tail.
static THOUSANDS_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2,3}\s*000\b").expect("thousands shape pattern"));

/// "summa 250 000" -- whatever digits follow the keyword.
static SUMMA_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsumma\s*(\d[\d\s]*)").expect("summa shape pattern"));

const UNITS: &[(&str, i64)] = &[
    ("nol", 0),
    ("bir", 1),
    ("ikki", 2),
    ("uch", 3),
    ("tort", 4),
    ("to'rt", 4),
    ("turt", 4),
    ("besh", 5),
    ("olti", 6),
    ("yetti", 7),
    ("sakkiz", 8),
    ("toqqiz", 9),
    ("to'qqiz", 9),
];

const TENS: &[(&str, i64)] = &[
    ("on", 10),
    ("yigirma", 20),
    ("ottiz", 30),
    ("o'ttiz", 30),
    ("qirq", 40),
    ("ellik", 50),
    ("oltmish", 60),
    ("yetmish", 70),
    ("sakson", 80),
    ("to'qson", 90),
    ("toqson", 90),
];

const SCALES: &[(&str, i64)] = &[
    ("yuz", 100),
    ("ming", 1_000),
    ("million", 1_000_000),
    ("mln", 1_000_000),
];

/// True when the text looks amount-bearing: any digit or payment keyword.
///
/// This is the "amount-like signal" used by both the readiness OR-branch
/// and the finalize trigger.
pub fn has_amount_signal(text: &str) -> bool {
    if text.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    keywords::contains_any(&text.to_lowercase(), AMOUNT_KEYWORDS)
}

/// Best amount candidate in the text, if any.
pub fn extract_amount(text: &str) -> Option<i64> {
    let mut candidates: Vec<i64> = spoken_phrase_candidates(text);
    candidates.extend(digit_candidates(text));
    candidates.into_iter().max()
}

/// "uch yuz ming" -> 300_000 style phrases, anchored on a "ming" token with
/// a preceding "yuz".
fn spoken_phrase_candidates(text: &str) -> Vec<i64> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();

    let mut candidates = Vec::new();
    for (j, tok) in tokens.iter().enumerate() {
        if tok != "ming" {
            continue;
        }
        let Some(yuz_idx) = tokens[..j].iter().rposition(|t| t == "yuz") else {
            continue;
        };
        // Include one token before "yuz" so "uch yuz ming" parses whole.
        let start = yuz_idx.saturating_sub(1);
        let value = parse_number_phrase(&tokens[start..=j]);
        if value > 0 {
            candidates.push(value);
        }
    }
    candidates
}

/// Accumulate a number phrase: units and tens add, scales multiply the
/// running value, and thousand-or-larger scales commit it.
fn parse_number_phrase(tokens: &[String]) -> i64 {
    let mut total: i64 = 0;
    let mut current: i64 = 0;

    for word in tokens {
        if let Some((_, v)) = UNITS.iter().find(|(w, _)| w == word) {
            current += v;
        } else if let Some((_, v)) = TENS.iter().find(|(w, _)| w == word) {
            current += v;
        } else if let Some((_, scale)) = SCALES.iter().find(|(w, _)| w == word) {
            if current == 0 {
                current = 1;
            }
            current *= scale;
            if *scale >= 1_000 {
                total += current;
                current = 0;
            }
        } else if let Ok(v) = word.parse::<i64>() {
            current += v;
        }
        // Other words are ignored.
    }

    total + current
}

/// Digit candidates constrained to amount shapes.
fn digit_candidates(text: &str) -> Vec<i64> {
    let mut candidates = Vec::new();

    for cap in MING_SHAPE.captures_iter(text) {
        if let Ok(n) = cap[1].parse::<i64>() {
            candidates.push(n * 1_000);
        }
    }
    for m in THOUSANDS_SHAPE.find_iter(text) {
        if let Ok(n) = parse_digits(m.as_str()) {
            candidates.push(n);
        }
    }
    for cap in SUMMA_SHAPE.captures_iter(text) {
        if let Ok(n) = parse_digits(&cap[1]) {
            candidates.push(n);
        }
    }

    candidates
}

fn parse_digits(chunk: &str) -> Result<i64, std::num::ParseIntError> {
    let clean: String = chunk.chars().filter(|c| c.is_ascii_digit()).collect();
    clean.parse()
}

fn normalize_token(token: &str) -> String {
    token
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '`' | '\u{2018}' | '\u{02BC}' => '\'',
            other => other,
        })
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_amounts() {
        assert_eq!(extract_amount("uch yuz ming so'm"), Some(300_000));
        assert_eq!(extract_amount("ikki yuz ellik ming"), Some(250_000));
    }

    #[test]
    fn test_digit_amounts() {
        assert_eq!(extract_amount("summa 300000"), Some(300_000));
        assert_eq!(extract_amount("12 000 som oldim"), Some(12_000));
    }

    #[test]
    fn test_largest_candidate_wins() {
        assert_eq!(extract_amount("2 ta latte, summa 250 000"), Some(250_000));
    }

    #[test]
    fn test_ming_shorthand() {
        assert_eq!(extract_amount("412ming"), Some(412_000));
        assert_eq!(extract_amount("Summa 412 min"), Some(412_000));
    }

    #[test]
    fn test_no_amount() {
        assert_eq!(extract_amount("salom qalesiz"), None);
    }

    #[test]
    fn test_quantity_digits_are_not_amounts() {
        assert_eq!(extract_amount("latte 2ta"), None);
        assert_eq!(extract_amount("pizza 1 dona, 2 ta cola"), None);
    }

    #[test]
    fn test_phone_digits_are_not_amounts() {
        assert_eq!(extract_amount("998901234567"), None);
        assert_eq!(extract_amount("+998 90 123 45 67"), None);
    }

    #[test]
    fn test_has_amount_signal_digits() {
        assert!(has_amount_signal("latte 2ta"));
    }

    #[test]
    fn test_has_amount_signal_keyword_without_digits() {
        assert!(has_amount_signal("summa kelishamiz"));
        assert!(has_amount_signal("uch yuz ming so'm")); // "ming"
    }

    #[test]
    fn test_no_amount_signal_in_greeting() {
        assert!(!has_amount_signal("Salom"));
    }
}
