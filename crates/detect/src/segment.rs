//! Sentence segmentation with exact byte spans
//!
//! A terminator (. ! ?) ends a sentence only when followed by whitespace and
//! an uppercase letter, digit, or opening quote. Periods after known
//! abbreviations ("Dr.", "et al.", "vs.") and single-letter initials
//! ("J. Smith") never split, and decimal numbers ("1.1") are safe because a
//! boundary requires whitespace after the dot.

use citescout_common::model::Sentence;

/// Token abbreviations that keep a following period from splitting.
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "sr", "jr", "vs", "etc", "al", "fig", "et", "cf", "vol",
    "no", "pp", "ed", "eds", "rev", "dept", "univ", "govt", "corp", "inc", "ltd", "approx",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Split `text` into sentences, dropping fragments shorter than
/// `min_chars`. Indexes are assigned over the emitted sentences in document
/// order.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    let bytes = text.as_bytes();
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let after = i + c.len_utf8();
        if c == '.' && is_protected_period(text, i) {
            continue;
        }
        if !boundary_follows(&text[after..]) {
            continue;
        }
        push_sentence(text, start, after, min_chars, &mut sentences);
        start = after;
    }

    // Trailing text without a terminator still forms a sentence.
    if start < bytes.len() {
        push_sentence(text, start, text.len(), min_chars, &mut sentences);
    }

    sentences
}

/// True when the text after a terminator looks like the start of a new
/// sentence: whitespace, then an uppercase letter, digit, or quote.
fn boundary_follows(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => {}
        // End of document counts as a boundary.
        None => return true,
        Some(_) => return false,
    }
    for c in chars {
        if c.is_whitespace() {
            continue;
        }
        return c.is_uppercase() || c.is_ascii_digit() || c == '"' || c == '\'';
    }
    true
}

/// True when the period at byte offset `dot` follows an abbreviation or a
/// single-letter initial.
fn is_protected_period(text: &str, dot: usize) -> bool {
    let before = &text[..dot];
    let word: String = before
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if word.is_empty() {
        return false;
    }
    if word.chars().count() == 1 && word.chars().next().is_some_and(|c| c.is_uppercase()) {
        return true;
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

fn push_sentence(
    text: &str,
    start: usize,
    end: usize,
    min_chars: usize,
    out: &mut Vec<Sentence>,
) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() < min_chars {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    let trail = raw.len() - raw.trim_end().len();
    out.push(Sentence {
        index: out.len(),
        text: trimmed.to_string(),
        char_span: (start + lead, end - trail),
    });
}
