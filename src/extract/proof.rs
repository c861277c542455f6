// src/extract/proof.rs
//! Proof-of-purchase requirement.
//!
//! Pages state this either inline ("Proof: No") or as a question heading
//! followed by the answer ("Proof Required?" / "Yes"). Every candidate is
//! scored and the strongest one wins, so a clear "not required" beats a
//! vague "yes" regardless of where each appears on the page.

use scraper::{node::Node, ElementRef, Html, Selector};

use crate::ingest::clean_text;

pub const PROOF_REQUIRED: &str = "Proof required";
pub const PROOF_NOT_REQUIRED: &str = "Proof not required";
pub const PROOF_MAY_BE_REQUIRED: &str = "Proof may be required";

const NEGATIVE_PHRASES: &[&str] = &["not required", "none required", "no proof"];
const MAYBE_PHRASES: &[&str] = &[
    "may be required",
    "may be needed",
    "might be required",
    "may require",
];

/// Tags that can act as a question heading with the answer in the next sibling.
const HEADING_TAGS: &[&str] = &["h2", "h3", "h4", "h5", "h6", "strong", "b", "dt", "th"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProofAnswer {
    Unknown,
    Required,
    MayBeRequired,
    NotRequired,
}

impl ProofAnswer {
    pub fn classify(raw: &str) -> Self {
        let lower = clean_text(raw).to_lowercase();
        let bare = lower
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string();
        let first_word = bare
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default();

        if NEGATIVE_PHRASES.iter().any(|p| lower.contains(p))
            || first_word == "no"
            || first_word == "none"
        {
            return Self::NotRequired;
        }
        if MAYBE_PHRASES.iter().any(|p| lower.contains(p)) {
            return Self::MayBeRequired;
        }
        if first_word == "yes"
            || matches!(bare.as_str(), "required" | "proof required" | "proof is required")
        {
            return Self::Required;
        }
        Self::Unknown
    }

    /// Confidence used to rank candidates; higher wins.
    pub fn score(self) -> u8 {
        match self {
            Self::NotRequired => 3,
            Self::MayBeRequired => 2,
            Self::Required => 1,
            Self::Unknown => 0,
        }
    }
}

/// Map a raw answer onto one of the canonical sentences, or pass it through.
pub fn normalize_proof_answer(raw: &str) -> String {
    match ProofAnswer::classify(raw) {
        ProofAnswer::NotRequired => PROOF_NOT_REQUIRED.to_string(),
        ProofAnswer::MayBeRequired => PROOF_MAY_BE_REQUIRED.to_string(),
        ProofAnswer::Required => PROOF_REQUIRED.to_string(),
        ProofAnswer::Unknown => clean_text(raw),
    }
}

/// Highest score wins; on ties the earliest candidate is kept.
pub fn best_candidate(candidates: &[(String, u8)]) -> Option<&str> {
    let mut best: Option<&(String, u8)> = None;
    for c in candidates {
        if best.map_or(true, |b| c.1 > b.1) {
            best = Some(c);
        }
    }
    best.map(|(text, _)| text.as_str())
}

/// Raw proof answers in document order, from both inline and heading shapes.
pub fn collect_candidates(doc: &Html) -> Vec<String> {
    let sel = Selector::parse("h2, h3, h4, h5, h6, p, li, td, dd, dt, th, strong, b")
        .expect("static selector");
    let mut out = Vec::new();

    for el in doc.select(&sel) {
        let text = element_text(&el);
        if !text.to_lowercase().contains("proof") {
            continue;
        }

        if let Some((label, value)) = text.split_once(':') {
            let value = value.trim();
            if label.to_lowercase().contains("proof") && !value.is_empty() {
                out.push(value.to_string());
                continue;
            }
        }

        if HEADING_TAGS.contains(&el.value().name()) {
            if let Some(answer) = answer_after(el, &text) {
                out.push(answer);
            }
        }
    }
    out
}

pub fn find_proof(doc: &Html) -> Option<String> {
    let scored: Vec<(String, u8)> = collect_candidates(doc)
        .into_iter()
        .map(|c| {
            let s = ProofAnswer::classify(&c).score();
            (c, s)
        })
        .collect();
    best_candidate(&scored).map(normalize_proof_answer)
}

fn element_text(el: &ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// First non-empty sibling after `el`. When `el` is the only content of its
/// parent (`<p><strong>Proof?</strong></p><p>Yes</p>`) the parent's sibling is used.
fn answer_after(el: ElementRef, heading_text: &str) -> Option<String> {
    for sib in el.next_siblings() {
        let text = match sib.value() {
            Node::Text(t) => clean_text(t),
            Node::Element(_) => ElementRef::wrap(sib)
                .map(|e| element_text(&e))
                .unwrap_or_default(),
            _ => continue,
        };
        if !text.is_empty() {
            return Some(text);
        }
    }

    let parent = el.parent().and_then(ElementRef::wrap)?;
    if element_text(&parent) == heading_text {
        return answer_after(parent, heading_text);
    }
    None
}
