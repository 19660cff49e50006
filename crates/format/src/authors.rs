//! Per-style author list rendering.
//!
//! Each style has its own inversion, initials, and truncation rules. Names
//! are split on whitespace; the final token is the surname.

use citescout_common::model::CitationStyle;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

pub fn author_list(authors: &[String], style: CitationStyle) -> String {
    if authors.is_empty() {
        return UNKNOWN_AUTHOR.to_string();
    }
    match style {
        CitationStyle::Apa => apa(authors),
        CitationStyle::Mla => mla(authors),
        CitationStyle::Chicago => chicago(authors),
        CitationStyle::Ieee => ieee(authors),
        CitationStyle::Harvard => harvard(authors),
        CitationStyle::Vancouver => vancouver(authors),
        CitationStyle::Bibtex => authors.join(" and "),
    }
}

fn parts(name: &str) -> Vec<&str> {
    name.split_whitespace().collect()
}

/// "Last, F. M." per author; two to six joined with ", & "; more than six
/// collapses to the first author plus "et al.".
fn apa(authors: &[String]) -> String {
    let formatted: Vec<String> = authors
        .iter()
        .map(|name| {
            let p = parts(name);
            match p.split_last() {
                Some((last, rest)) if !rest.is_empty() => {
                    let initials: Vec<String> = rest
                        .iter()
                        .filter_map(|w| w.chars().next())
                        .map(|c| format!("{}.", c))
                        .collect();
                    format!("{}, {}", last, initials.join(" "))
                }
                _ => name.clone(),
            }
        })
        .collect();
    match formatted.len() {
        1 => formatted[0].clone(),
        2..=6 => {
            let (last, head) = formatted.split_last().unwrap();
            format!("{}, & {}", head.join(", "), last)
        }
        _ => format!("{}, et al.", formatted[0]),
    }
}

/// First author inverted ("Last, First Middle"); any co-authors become
/// "et al.".
fn mla(authors: &[String]) -> String {
    let p = parts(&authors[0]);
    let first = match p.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, {}", last, rest.join(" ")),
        _ => authors[0].clone(),
    };
    if authors.len() == 1 {
        first
    } else {
        format!("{}, et al.", first)
    }
}

/// First author inverted, up to three listed with ", and " before the last;
/// more than three collapses to "et al.".
fn chicago(authors: &[String]) -> String {
    let invert_first = |name: &str| {
        let p = parts(name);
        match p.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{}, {}", last, rest.join(" ")),
            _ => name.to_string(),
        }
    };
    match authors.len() {
        1 => invert_first(&authors[0]),
        2..=3 => {
            let mut formatted = vec![invert_first(&authors[0])];
            formatted.extend(authors[1..].iter().cloned());
            let (last, head) = formatted.split_last().unwrap();
            format!("{}, and {}", head.join(", "), last)
        }
        _ => format!("{}, et al.", invert_first(&authors[0])),
    }
}

/// "F. M. Last", capped at three authors with a trailing " et al.".
fn ieee(authors: &[String]) -> String {
    let formatted: Vec<String> = authors
        .iter()
        .take(3)
        .map(|name| {
            let p = parts(name);
            match p.split_last() {
                Some((last, rest)) if !rest.is_empty() => {
                    let initials: Vec<String> = rest
                        .iter()
                        .filter_map(|w| w.chars().next())
                        .map(|c| c.to_string())
                        .collect();
                    format!("{}. {}", initials.join(". "), last)
                }
                _ => name.clone(),
            }
        })
        .collect();
    let joined = formatted.join(", ");
    if authors.len() > 3 {
        format!("{} et al.", joined)
    } else {
        joined
    }
}

/// "Last, F.M." up to three authors; more collapses to first + " et al.".
fn harvard(authors: &[String]) -> String {
    let formatted: Vec<String> = authors
        .iter()
        .map(|name| {
            let p = parts(name);
            match p.split_last() {
                Some((last, rest)) if !rest.is_empty() => {
                    let initials: String = rest
                        .iter()
                        .filter_map(|w| w.chars().next())
                        .map(|c| format!("{}.", c))
                        .collect();
                    format!("{}, {}", last, initials)
                }
                _ => name.clone(),
            }
        })
        .collect();
    match formatted.len() {
        1 => formatted[0].clone(),
        2..=3 => formatted.join(", "),
        _ => format!("{} et al.", formatted[0]),
    }
}

/// "Last II", capped at six authors with a trailing ", et al.".
fn vancouver(authors: &[String]) -> String {
    let formatted: Vec<String> = authors
        .iter()
        .take(6)
        .map(|name| {
            let p = parts(name);
            match p.split_last() {
                Some((last, rest)) if !rest.is_empty() => {
                    let initials: String = rest.iter().filter_map(|w| w.chars().next()).collect();
                    format!("{} {}", last, initials)
                }
                _ => name.clone(),
            }
        })
        .collect();
    let joined = formatted.join(", ");
    if authors.len() > 6 {
        format!("{}, et al.", joined)
    } else {
        joined
    }
}

/// Lowercased alphanumeric surname of the first author, for BibTeX keys.
pub fn key_surname(authors: &[String]) -> String {
    let surname = authors
        .first()
        .and_then(|name| parts(name).last().map(|s| s.to_string()))
        .unwrap_or_default();
    let cleaned: String = surname
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
