// src/extract/action.rs
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::ingest::clean_text;

pub const CTA_KEYWORDS: &[&str] = &[
    "file a claim",
    "file your claim",
    "submit a claim",
    "submit your claim",
    "start your claim",
    "make a claim",
    "claim form",
    "file claim",
    "submit claim",
    "claim now",
    "file now",
];

pub fn is_call_to_action(label: &str) -> bool {
    let lower = label.to_lowercase();
    CTA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// First link or button whose label reads like "file a claim", resolved
/// against the page URL.
pub fn find_action_url(doc: &Html, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let sel = Selector::parse("a[href], button").expect("static selector");

    doc.select(&sel)
        .filter(|el| is_call_to_action(&label_of(el)))
        .filter_map(|el| target_of(&el))
        .find_map(|target| resolve(&base, &target))
}

fn label_of(el: &ElementRef) -> String {
    let text = clean_text(&el.text().collect::<Vec<_>>().join(" "));
    if !text.is_empty() {
        return text;
    }
    let attrs = el.value();
    attrs
        .attr("aria-label")
        .or_else(|| attrs.attr("title"))
        .or_else(|| attrs.attr("value"))
        .map(clean_text)
        .unwrap_or_default()
}

fn target_of(el: &ElementRef) -> Option<String> {
    let v = el.value();
    if v.name() == "a" {
        return v.attr("href").map(|h| h.trim().to_string());
    }

    if let Some(t) = v
        .attr("formaction")
        .or_else(|| v.attr("data-href"))
        .or_else(|| v.attr("data-url"))
    {
        return Some(t.trim().to_string());
    }

    static RE_ONCLICK: OnceCell<Regex> = OnceCell::new();
    let re = RE_ONCLICK.get_or_init(|| {
        Regex::new(r#"(?:location(?:\.href)?\s*=\s*|window\.open\(\s*)['"]([^'"]+)['"]"#).unwrap()
    });
    let onclick = v.attr("onclick")?;
    re.captures(onclick).map(|c| c[1].to_string())
}

fn resolve(base: &Url, target: &str) -> Option<String> {
    if target.is_empty()
        || target.starts_with('#')
        || target.starts_with("javascript:")
        || target.starts_with("mailto:")
    {
        return None;
    }
    let u = base.join(target).ok()?;
    matches!(u.scheme(), "http" | "https").then(|| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.openclassactions.com/settlements/acme.php";

    #[test]
    fn first_cta_link_wins_and_resolves() {
        let doc = Html::parse_document(
            r#"<a href="/about.php">About</a>
               <a href="https://acmesettlement.com/claim">File a Claim</a>
               <a href="/other">Submit Claim</a>"#,
        );
        assert_eq!(
            find_action_url(&doc, PAGE).as_deref(),
            Some("https://acmesettlement.com/claim")
        );
    }

    #[test]
    fn relative_targets_resolve_against_page() {
        let doc = Html::parse_document(r#"<a href="claim.php">Claim Form</a>"#);
        assert_eq!(
            find_action_url(&doc, PAGE).as_deref(),
            Some("https://www.openclassactions.com/settlements/claim.php")
        );
    }

    #[test]
    fn buttons_use_data_href_or_onclick() {
        let doc = Html::parse_document(
            r#"<button data-href="https://x.example/claim">Start your claim</button>"#,
        );
        assert_eq!(find_action_url(&doc, PAGE).as_deref(), Some("https://x.example/claim"));

        let doc = Html::parse_document(
            r#"<button onclick="window.location.href='https://y.example/form'">File Now</button>"#,
        );
        assert_eq!(find_action_url(&doc, PAGE).as_deref(), Some("https://y.example/form"));
    }

    #[test]
    fn javascript_and_anchor_targets_are_skipped() {
        let doc = Html::parse_document(
            r##"<a href="javascript:void(0)">File a claim</a>
                <a href="#form">File a claim</a>
                <a title="Submit a claim" href="https://z.example/c"><img src="x.png"></a>"##,
        );
        assert_eq!(find_action_url(&doc, PAGE).as_deref(), Some("https://z.example/c"));
    }

    #[test]
    fn no_cta_is_none() {
        let doc = Html::parse_document(r#"<a href="/x">Read more</a><button>Share</button>"#);
        assert_eq!(find_action_url(&doc, PAGE), None);
    }
}
