// src/extract/summary.rs
//! Short description from the first informative paragraph.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::ingest::clean_text;

/// A paragraph at least this long is preferred over shorter survivors.
pub const SUMMARY_MIN_CHARS: usize = 80;
/// A first sentence shorter than this is too thin to stand alone.
pub const MIN_SENTENCE_CHARS: usize = 40;
/// Hard cap for the simplified summary, ellipsis excluded.
pub const SUMMARY_BUDGET: usize = 300;

const BOILERPLATE: &[&str] = &[
    "openclassactions.com is a news site providing information",
    "class action claims are submitted under penalty of perjury",
    "attorney advertising",
    "not affiliated with",
    "for informational purposes only",
    "does not constitute legal advice",
    "all rights reserved",
    "privacy policy",
    "pdf viewer",
    "your browser does not support",
    "download the pdf",
    "view the pdf",
    "sign up for our newsletter",
    "subscribe to our",
];

static AUTHOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:by|written by|posted by|reviewed by|last updated|updated on|published on)\b|author:)",
    )
    .unwrap()
});

static INSTRUCTIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(step\s*\d+|\d+\s*[.)]\s|[•\-*]\s*)").unwrap());

pub fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOILERPLATE.iter().any(|b| lower.contains(b))
}

/// Bylines and date stamps; only short lines qualify so real prose starting
/// with "By" survives.
pub fn is_author_line(text: &str) -> bool {
    AUTHOR_LINE.is_match(text) && text.split_whitespace().count() <= 12
}

pub fn is_instructional(text: &str) -> bool {
    INSTRUCTIONAL.is_match(text)
}

/// Pick the summary paragraph: first long survivor, else first short one,
/// else held-back instructional text.
pub fn choose_paragraph(paragraphs: &[String]) -> Option<&str> {
    let mut short: Option<&str> = None;
    let mut instructional: Option<&str> = None;

    for p in paragraphs.iter().map(String::as_str) {
        if p.is_empty() || is_boilerplate(p) || is_author_line(p) {
            continue;
        }
        if is_instructional(p) {
            instructional.get_or_insert(p);
            continue;
        }
        if p.chars().count() >= SUMMARY_MIN_CHARS {
            return Some(p);
        }
        short.get_or_insert(p);
    }
    short.or(instructional)
}

/// Collapse whitespace, then cut at the first sentence end that leaves a
/// sentence of useful length; otherwise truncate at a word boundary.
pub fn summarize(text: &str) -> String {
    let t = clean_text(text);
    let chars: Vec<(usize, char)> = t.char_indices().collect();

    for (i, &(idx, ch)) in chars.iter().enumerate() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars
            .get(i + 1)
            .map_or(true, |&(_, next)| next.is_whitespace());
        if !at_boundary {
            continue;
        }
        let len = i + 1;
        if len < MIN_SENTENCE_CHARS {
            continue;
        }
        if len <= SUMMARY_BUDGET {
            return t[..idx + ch.len_utf8()].to_string();
        }
        break;
    }

    truncate_words(&t, SUMMARY_BUDGET)
}

/// Trim to `budget` chars at a word boundary and append "...".
pub fn truncate_words(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let cut: String = text.chars().take(budget).collect();
    let head = match cut.rfind(char::is_whitespace) {
        Some(pos) if cut[..pos].chars().count() > budget / 2 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", head.trim_end_matches([',', ';', ':', ' ', '-']))
}

pub fn find_summary(doc: &Html) -> Option<String> {
    let sel = Selector::parse("p").expect("static selector");
    let paragraphs: Vec<String> = doc
        .select(&sel)
        .map(|p| clean_text(&p.text().collect::<Vec<_>>().join(" ")))
        .collect();
    choose_paragraph(&paragraphs)
        .map(summarize)
        .filter(|s| !s.is_empty())
}
