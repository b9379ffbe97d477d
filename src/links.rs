//! Link extraction for batch scraping.
//!
//! Collects `<a href>` targets from a subtree, resolves them against a base
//! URL, applies [`LinkFilterOptions`] and removes duplicates that differ only
//! by `#fragment`. The first occurrence wins and keeps its original index.

use std::collections::HashSet;

use url::Url;

use crate::dom::{self, NodeRef, Selection};
use crate::options::LinkFilterOptions;
use crate::result::ExtractedLink;
use crate::url_utils;

/// Extract links from every anchor under `root`.
///
/// `index` is the anchor's position among all `a[href]` elements of `root`,
/// counted before filtering.
#[must_use]
pub fn extract_links(root: &Selection, base: Option<&Url>, filter: &LinkFilterOptions) -> Vec<ExtractedLink> {
    let base_str = base.map(ToString::to_string).unwrap_or_default();
    let patterns: Vec<&str> = filter
        .exclude_patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for (index, anchor) in root.select("a[href]").nodes().iter().enumerate() {
        let Some(href) = dom::node_attr(anchor, "href") else {
            continue;
        };
        let lower = href.to_ascii_lowercase();

        if href.starts_with('#') && filter.exclude_anchors {
            continue;
        }
        if lower.starts_with("javascript:") {
            if filter.exclude_javascript {
                continue;
            }
        } else if url_utils::is_non_page_scheme(&href) {
            continue;
        }

        let resolved = url_utils::resolve(&href, base);
        let url = if lower.starts_with("javascript:") {
            resolved
        } else {
            url_utils::strip_fragment(&resolved)
        };
        if url.is_empty() {
            continue;
        }

        if filter.same_domain_only && !url_utils::same_host(&url, &base_str) {
            continue;
        }
        if patterns.iter().any(|p| url.contains(p)) {
            continue;
        }
        if !seen.insert(url.clone()) {
            continue;
        }

        links.push(ExtractedLink {
            url,
            text: link_text(anchor),
            index,
        });
    }

    log::debug!("extracted {} links from subtree", links.len());
    links
}

/// Parse `html` and extract links from its body.
#[must_use]
pub fn extract_links_from_html(html: &str, base_url: Option<&str>, filter: &LinkFilterOptions) -> Vec<ExtractedLink> {
    let doc = dom::parse(html);
    let base = crate::metadata::document_base(&doc, base_url);
    extract_links(&doc.select("body"), base.as_ref(), filter)
}

/// Anchor text, falling back to `title` and then to an image's `alt`.
fn link_text(anchor: &NodeRef) -> String {
    let text = dom::normalized_text(anchor);
    if !text.is_empty() {
        return text;
    }
    if let Some(title) = dom::node_attr(anchor, "title") {
        return title;
    }
    Selection::from(*anchor)
        .select("img[alt]")
        .nodes()
        .iter()
        .find_map(|img| dom::node_attr(img, "alt"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    fn links(html: &str, filter: &LinkFilterOptions) -> Vec<ExtractedLink> {
        let doc = dom::parse(html);
        extract_links(&doc.select("body"), Some(&base()), filter)
    }

    #[test]
    fn test_resolves_and_indexes() {
        let found = links(r#"<a href="one">  One  </a><a href="/two">Two</a>"#, &LinkFilterOptions::default());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].url, "https://example.com/blog/one");
        assert_eq!(found[0].text, "One");
        assert_eq!(found[1].url, "https://example.com/two");
        assert_eq!(found[1].index, 1);
    }

    #[test]
    fn test_fragment_duplicates_keep_first() {
        let found = links(
            r##"<a href="#top">Top</a><a href="page#a">First</a><a href="page#b">Second</a><a href="page">Third</a>"##,
            &LinkFilterOptions::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "First");
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].url, "https://example.com/blog/page");
    }

    #[test]
    fn test_skips_special_schemes() {
        let found = links(
            r#"<a href="mailto:a@b.c">Mail</a><a href="tel:1">Call</a><a href="javascript:void(0)">JS</a><a href="x">X</a>"#,
            &LinkFilterOptions::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 3);
    }

    #[test]
    fn test_javascript_kept_when_allowed() {
        let filter = LinkFilterOptions {
            exclude_javascript: false,
            exclude_anchors: false,
            ..LinkFilterOptions::default()
        };
        let found = links(r##"<a href="javascript:go()">JS</a><a href="#s">S</a>"##, &filter);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].url, "javascript:go()");
    }

    #[test]
    fn test_same_domain_and_patterns() {
        let filter = LinkFilterOptions {
            same_domain_only: true,
            exclude_patterns: vec!["/tag/".to_string(), " ".to_string()],
            ..LinkFilterOptions::default()
        };
        let found = links(
            r#"<a href="https://other.com/x">Other</a><a href="/tag/rust">Tag</a><a href="/post">Post</a>"#,
            &filter,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://example.com/post");
    }

    #[test]
    fn test_link_text_fallbacks() {
        let found = links(
            r#"<a href="/a" title="Titled"></a><a href="/b"><img src="x.png" alt="Pic"></a>"#,
            &LinkFilterOptions::default(),
        );
        assert_eq!(found[0].text, "Titled");
        assert_eq!(found[1].text, "Pic");
    }

    #[test]
    fn test_from_html_uses_base_tag() {
        let found = extract_links_from_html(
            r#"<head><base href="https://docs.example.org/v1/"></head><body><a href="guide">Guide</a></body>"#,
            None,
            &LinkFilterOptions::default(),
        );
        assert_eq!(found[0].url, "https://docs.example.org/v1/guide");
    }
}
