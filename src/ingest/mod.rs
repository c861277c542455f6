// src/ingest/mod.rs
pub mod discovery;
pub mod fetch;
pub mod fixture;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Normalize scraped text: unify quotes/spaces, collapse whitespace, trim.
/// Punctuation is kept; the extractor relies on trailing `?` and `:`.
pub fn clean_text(s: &str) -> String {
    // 1) Normalize “ ” ‘ ’ « » to ASCII quotes, NBSP to space
    let out = s
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{00A0}', " ");

    // 2) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Text after the first colon, or the whole line when there is none.
pub fn value_after_colon(line: &str) -> String {
    match line.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => line.trim().to_string(),
    }
}

/// True when every word of `text` is in `words`, i.e. a heading with no value.
pub fn is_bare_label(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    let mut tokens = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .peekable();
    tokens.peek().is_some() && tokens.all(|t| words.contains(&t))
}

/// First line after `i` that is not a repeat of line `i`.
/// Nested blocks (`<p><strong>..</strong></p>`) yield the same text twice.
pub fn following_line(lines: &[String], i: usize) -> Option<&str> {
    let current = lines.get(i)?;
    lines[i + 1..]
        .iter()
        .find(|l| *l != current)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_ws_and_keeps_punct() {
        let s = "  Proof\u{00A0} Required?\n\t ";
        assert_eq!(clean_text(s), "Proof Required?");
    }

    #[test]
    fn clean_text_normalizes_quotes() {
        assert_eq!(clean_text("\u{201C}Yes\u{201D} it\u{2019}s"), "\"Yes\" it's");
    }

    #[test]
    fn value_after_colon_splits_on_first_only() {
        assert_eq!(value_after_colon("Deadline: 10/1/2026: extended"), "10/1/2026: extended");
        assert_eq!(value_after_colon("Up to $50"), "Up to $50");
        assert_eq!(value_after_colon("Award:"), "");
    }

    #[test]
    fn bare_label_needs_every_word_listed() {
        let words = &["claim", "deadline"];
        assert!(is_bare_label("Claim Deadline", words));
        assert!(is_bare_label("DEADLINE:", words));
        assert!(!is_bare_label("Claim Deadline 12/31/2026", words));
        assert!(!is_bare_label("", words));
        assert!(!is_bare_label("--", words));
    }

    #[test]
    fn following_line_skips_nested_repeats() {
        let l: Vec<String> = ["Award", "Award", "Up to $50"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(following_line(&l, 0), Some("Up to $50"));
        assert_eq!(following_line(&l, 2), None);
        assert_eq!(following_line(&l, 9), None);
    }
}
