// src/extract/reward.rs
//! Reward line detection.
//!
//! Keyword lines come first; the currency fallback only runs when no keyword
//! line survives the heading filter. The filter is what keeps FAQ headings
//! ("How much is the settlement award?") out of the payout field.

use crate::ingest::types::REWARD_NOT_LISTED;
use crate::ingest::{following_line, is_bare_label, value_after_colon};

pub const REWARD_KEYWORDS: &[&str] = &[
    "settlement award",
    "estimated award",
    "potential award",
    "award amount",
    "payout",
    "benefit amount",
    "cash payment",
    "compensation",
];

/// Values that read like a question yet still carry an answer.
const PENDING_MARKERS: &[&str] = &["varies", "vary", "pending", "tbd", "to be determined"];

const FAQ_PHRASES: &[&str] = &[
    "how much",
    "how do i",
    "how can i",
    "what is the",
    "what are the",
    "who is eligible",
    "am i eligible",
    "can i ",
    "frequently asked",
    "learn more",
    "click here",
];

/// Words a reward heading is made of; a candidate using only these has no value.
const LABEL_WORDS: &[&str] = &[
    "settlement", "award", "awards", "estimated", "potential", "amount", "amounts", "payout",
    "payouts", "benefit", "benefits", "cash", "payment", "payments", "compensation", "total",
    "your", "the", "details",
];

const FALLBACK_TERMS: &[&str] = &["award", "payment", "payout", "cash", "benefit"];

pub fn has_currency(s: &str) -> bool {
    s.contains(['$', '£', '€'])
}

/// True for candidates that are headings or questions rather than values.
pub fn is_bad_reward_heading(value: &str) -> bool {
    let lower = value.to_lowercase();
    let questionish = value.trim_end().ends_with('?')
        && !has_currency(value)
        && !PENDING_MARKERS.iter().any(|m| lower.contains(m));
    questionish
        || FAQ_PHRASES.iter().any(|p| lower.contains(p))
        || is_bare_label(value, LABEL_WORDS)
}

fn is_reward_value(line: &str) -> bool {
    let lower = line.to_lowercase();
    (has_currency(line) || PENDING_MARKERS.iter().any(|m| lower.contains(m)))
        && !is_bad_reward_heading(line)
}

/// Best reward text from block lines in document order; never empty.
pub fn find_reward(lines: &[String]) -> String {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !REWARD_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        let value = value_after_colon(line);
        if !value.is_empty() && !is_bad_reward_heading(&value) {
            return value;
        }
        // label on its own line, value in the next block
        if value.is_empty() || is_bare_label(&value, LABEL_WORDS) {
            if let Some(next) = following_line(lines, i).filter(|n| is_reward_value(n)) {
                return next.to_string();
            }
        }
    }

    for line in lines {
        let lower = line.to_lowercase();
        if !has_currency(line) || !FALLBACK_TERMS.iter().any(|t| lower.contains(t)) {
            continue;
        }
        if is_bad_reward_heading(line) {
            continue;
        }
        let value = value_after_colon(line);
        return if has_currency(&value) { value } else { line.clone() };
    }

    REWARD_NOT_LISTED.to_string()
}
