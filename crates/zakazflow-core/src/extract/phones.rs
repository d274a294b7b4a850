//! Phone number extraction and strict normalization.
//!
//! Numbers are extracted from free text (and from spoken digit words in
//! speech transcripts), reduced to digits, and normalized toward the
//! +998 local-country format. Anything shorter than 9 digits is rejected --
//! this is also the gate applied to LLM-extracted numbers, which are never
//! trusted blindly.

use std::sync::LazyLock;

use regex::Regex;

/// Digit runs with optional spaces/dashes, at least 7 characters long.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s\-]{6,}").expect("phone pattern"));

/// Marker appended to phones this system emitted itself.
pub const MACHINE_SUFFIX: &str = "--";

/// Uzbek digit words as spoken in voice messages.
const DIGIT_WORDS: &[(&str, char)] = &[
    ("nol", '0'),
    ("nolik", '0'),
    ("zero", '0'),
    ("bir", '1'),
    ("ikki", '2'),
    ("uch", '3'),
    ("tort", '4'),
    ("to'rt", '4'),
    ("turt", '4'),
    ("besh", '5'),
    ("olti", '6'),
    ("yetti", '7'),
    ("sakkiz", '8'),
    ("toqqiz", '9'),
    ("to'qqiz", '9'),
    ("toqiz", '9'),
];

/// Strip everything but digits.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a raw phone candidate.
///
/// Accepts only candidates with 9+ digits. A 12-digit number starting with
/// 998 and a bare 9-digit local number get the `+998` prefix; other long
/// digit runs pass through as-is.
pub fn normalize(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return None;
    }

    if digits.starts_with("998") && digits.len() == 12 {
        return Some(format!("+{digits}"));
    }

    if digits.len() == 9 && digits.starts_with('9') {
        return Some(format!("+998{digits}"));
    }

    if digits.len() >= 9 {
        return Some(digits);
    }

    None
}

/// Canonical output form: always `+`-prefixed.
///
/// Used for the reconciled phone list of a finalized order.
pub fn canonical(raw: &str) -> Option<String> {
    let normalized = normalize(raw)?;
    if normalized.starts_with('+') {
        Some(normalized)
    } else {
        Some(format!("+{normalized}"))
    }
}

/// Append the machine-emitted marker unless already present.
///
/// The `--` suffix distinguishes numbers this system produced from
/// hand-typed ones. A display convention, not a validation mechanism.
pub fn with_suffix(phone: &str, suffix: &str) -> String {
    if phone.ends_with(suffix) {
        phone.to_string()
    } else {
        format!("{phone}{suffix}")
    }
}

/// Strip the machine-emitted marker if present.
pub fn without_suffix<'a>(phone: &'a str, suffix: &str) -> &'a str {
    phone.strip_suffix(suffix).unwrap_or(phone)
}

/// Extract normalized phone numbers from text, first-seen order, deduped.
pub fn extract(text: &str) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for m in PHONE_PATTERN.find_iter(text) {
        if let Some(p) = normalize(m.as_str()) {
            if !normalized.contains(&p) {
                normalized.push(p);
            }
        }
    }
    normalized
}

/// Recover digit runs from spoken digit words ("to'qqiz nol bir ...").
///
/// Consecutive digit tokens (numeric or word form) are joined; runs shorter
/// than 7 digits are dropped. Returned runs still need [`normalize`].
pub fn spoken_digit_candidates(text: &str) -> Vec<String> {
    let mut sequences: Vec<String> = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, sequences: &mut Vec<String>| {
        if current.len() >= 7 && !sequences.contains(current) {
            sequences.push(current.clone());
        }
        current.clear();
    };

    for token in text.split_whitespace() {
        let word = normalize_token(token);

        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            current.push_str(&word);
            continue;
        }

        match DIGIT_WORDS.iter().find(|(w, _)| *w == word) {
            Some((_, digit)) => current.push(*digit),
            None => flush(&mut current, &mut sequences),
        }
    }
    flush(&mut current, &mut sequences);

    sequences
}

/// Lowercase and fold apostrophe variants, dropping other punctuation.
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
