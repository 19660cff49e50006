//! CiteScout Citation Formatter
//!
//! Renders `PaperCandidate` metadata into seven bibliographic styles plus
//! RIS entries for reference-manager import. Two entry points:
//! - `format_strict` fails on missing required fields,
//! - the lenient `render` (and the cache-backed `CitationFormatter`)
//!   substitutes placeholders so a formatting gap never drops a result.

mod authors;
mod cache;

pub use cache::CitationCache;

use authors::{author_list, key_surname, UNKNOWN_AUTHOR};
use citescout_common::config::CacheConfig;
use citescout_common::errors::FormatError;
use citescout_common::model::{CitationStyle, FormattedCitation, PaperCandidate};
use sha2::{Digest, Sha256};
use tracing::debug;

const MISSING_YEAR: &str = "n.d.";
const MISSING_TITLE: &str = "Untitled";

/// Cache-backed formatter, scoped to one pipeline run.
pub struct CitationFormatter {
    cache: CitationCache,
}

impl CitationFormatter {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache: CitationCache::new(config.citation_capacity),
        }
    }

    /// Format one paper in one style, via the cache.
    pub fn format(&self, paper: &PaperCandidate, style: CitationStyle) -> FormattedCitation {
        if let Some(text) = self.cache.get(&paper.id, style) {
            return FormattedCitation { style, text };
        }
        let text = render(paper, style);
        self.cache.insert(&paper.id, style, text.clone());
        FormattedCitation { style, text }
    }

    /// All requested styles for one paper, in the caller's style order.
    pub fn format_all(
        &self,
        paper: &PaperCandidate,
        styles: &[CitationStyle],
    ) -> Vec<FormattedCitation> {
        styles.iter().map(|&style| self.format(paper, style)).collect()
    }
}

/// Render a citation, substituting placeholders for missing fields. Never
/// fails; each substitution is logged at debug level.
pub fn render(paper: &PaperCandidate, style: CitationStyle) -> String {
    for err in missing_fields(paper, style) {
        debug!(paper_id = %paper.id, error = %err, "substituting placeholder");
    }

    let authors = author_list(&paper.authors, style);
    let year = paper
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| MISSING_YEAR.to_string());
    let title = paper.title.as_deref().unwrap_or(MISSING_TITLE);
    let venue = paper.venue.as_deref().filter(|v| !v.is_empty());

    match style {
        CitationStyle::Apa => {
            let venue_str = venue
                .map(|v| format!(" *{}*.", v))
                .unwrap_or_else(|| ".".to_string());
            format!("{} ({}). {}{}", authors, year, title, venue_str)
        }
        CitationStyle::Mla => {
            let venue_str = venue
                .map(|v| format!(" *{}*,", v))
                .unwrap_or_else(|| ",".to_string());
            format!("{}. \"{}.\"{} {}.", authors, title, venue_str, year)
        }
        CitationStyle::Chicago => {
            let venue_str = venue
                .map(|v| format!(" *{}*.", v))
                .unwrap_or_else(|| ".".to_string());
            format!("{}. \"{}.\"{} {}.", authors, title, venue_str, year)
        }
        CitationStyle::Ieee => {
            let venue_str = venue.map(|v| format!(", *{}*", v)).unwrap_or_default();
            format!("{}, \"{}\"{}, {}.", authors, title, venue_str, year)
        }
        CitationStyle::Harvard => {
            let venue_str = venue.map(|v| format!(", *{}*", v)).unwrap_or_default();
            format!("{} ({}) '{}'{}.", authors, year, title, venue_str)
        }
        CitationStyle::Vancouver => {
            let venue_str = venue.map(|v| format!(". {}", v)).unwrap_or_default();
            format!("{}. {}{}. {}.", authors, title, venue_str, year)
        }
        CitationStyle::Bibtex => render_bibtex(paper, &authors, &year, title, venue),
    }
}

/// Strict variant: errors on the first missing required field instead of
/// substituting. Venue is optional in every style.
pub fn format_strict(
    paper: &PaperCandidate,
    style: CitationStyle,
) -> Result<String, FormatError> {
    if let Some(err) = missing_fields(paper, style).into_iter().next() {
        return Err(err);
    }
    Ok(render(paper, style))
}

fn missing_fields(paper: &PaperCandidate, style: CitationStyle) -> Vec<FormatError> {
    let mut missing = Vec::new();
    let mut require = |present: bool, field: &str| {
        if !present {
            missing.push(FormatError::MissingRequiredField {
                style: style.as_str().to_string(),
                field: field.to_string(),
            });
        }
    };
    require(!paper.authors.is_empty(), "authors");
    require(paper.title.as_deref().is_some_and(|t| !t.is_empty()), "title");
    require(paper.year.is_some(), "year");
    missing
}

fn render_bibtex(
    paper: &PaperCandidate,
    authors: &str,
    year: &str,
    title: &str,
    venue: Option<&str>,
) -> String {
    let author_names = if paper.authors.is_empty() {
        UNKNOWN_AUTHOR
    } else {
        authors
    };
    let mut lines = vec![
        format!("@article{{{},", bibtex_key(paper)),
        format!("  author  = {{{}}},", author_names),
        format!("  title   = {{{}}},", title),
        format!("  year    = {{{}}},", year),
    ];
    if let Some(v) = venue {
        lines.push(format!("  journal = {{{}}},", v));
    }
    if let Some(doi) = &paper.doi {
        lines.push(format!("  doi     = {{{}}},", doi));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

/// Stable citation key: first-author surname (lowercased, alphanumeric
/// only) + year + a 6-hex-char title hash to keep same-author-same-year
/// entries distinct.
pub fn bibtex_key(paper: &PaperCandidate) -> String {
    let surname = key_surname(&paper.authors);
    let year = paper
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "nd".to_string());
    let title = paper.title.as_deref().unwrap_or(MISSING_TITLE);
    let digest = Sha256::digest(title.as_bytes());
    format!("{}{}{}", surname, year, &hex::encode(digest)[..6])
}

/// RIS journal-article entry, importable by Zotero, Mendeley, and EndNote.
pub fn render_ris(paper: &PaperCandidate) -> String {
    let mut lines = vec!["TY  - JOUR".to_string()];
    for name in &paper.authors {
        let parts: Vec<&str> = name.split_whitespace().collect();
        match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                lines.push(format!("AU  - {}, {}", last, rest.join(" ")));
            }
            _ if !name.is_empty() => lines.push(format!("AU  - {}", name)),
            _ => {}
        }
    }
    lines.push(format!(
        "TI  - {}",
        paper.title.as_deref().unwrap_or(MISSING_TITLE)
    ));
    if let Some(venue) = paper.venue.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("JO  - {}", venue));
    }
    if let Some(year) = paper.year {
        lines.push(format!("PY  - {}", year));
    }
    if let Some(doi) = &paper.doi {
        lines.push(format!("DO  - {}", doi));
    }
    if let Some(url) = &paper.url {
        lines.push(format!("UR  - {}", url));
    }
    lines.push("ER  - ".to_string());
    lines.join("\n")
}
