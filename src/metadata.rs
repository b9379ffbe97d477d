//! Page metadata
//!
//! Reads descriptive `<meta>` tags, the document language and the canonical
//! link into the flat string map carried by `ScrapedContent::metadata`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::dom::{self, Document, Selection};
use crate::url_utils;

/// Metadata keys written by [`page_metadata`].
pub mod keys {
    /// Page description.
    pub const DESCRIPTION: &str = "description";
    /// Site name.
    pub const SITE_NAME: &str = "og:site_name";
    /// Preview image URL.
    pub const IMAGE: &str = "og:image";
    /// Document language.
    pub const LANG: &str = "lang";
    /// Canonical page URL.
    pub const CANONICAL: &str = "canonical";
    /// Publish date normalized to RFC 3339.
    pub const DATE_ISO: &str = "date:iso";
    /// Mode that produced the content.
    pub const EXTRACTION_MODE: &str = "extraction:mode";
    /// Mode requested before a fallback.
    pub const ORIGINAL_MODE: &str = "original:mode";
    /// Why a fallback happened.
    pub const FALLBACK_REASON: &str = "fallback:reason";
    /// Why the whole pipeline failed.
    pub const PIPELINE_ERROR: &str = "pipeline:error";
    /// Quality evaluator explanation.
    pub const QUALITY_REASON: &str = "quality:reason";
    /// Quality score of the selector candidate.
    pub const QUALITY_SELECTOR: &str = "quality:selector";
    /// Quality score of the Readability candidate.
    pub const QUALITY_READABILITY: &str = "quality:readability";
}

/// Base URL for resolving relative references: `<base href>` resolved
/// against the page URL, or the page URL itself.
#[must_use]
pub fn document_base(doc: &Document, page_url: Option<&str>) -> Option<Url> {
    let page = page_url.and_then(url_utils::parse_url);
    let base_href = dom::get_attribute(&doc.select("base[href]"), "href");

    match (base_href, page) {
        (Some(href), Some(page)) => page.join(href.trim()).ok().or(Some(page)),
        (Some(href), None) => url_utils::parse_url(&href),
        (None, page) => page,
    }
}

/// Descriptive metadata of a page. Relative image and canonical URLs are
/// resolved against `base`.
#[must_use]
pub fn page_metadata(doc: &Document, base: Option<&Url>) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();

    for node in doc.select("meta").nodes() {
        let meta = Selection::from(*node);

        let name = dom::get_attribute(&meta, "property")
            .or_else(|| dom::get_attribute(&meta, "name"))
            .unwrap_or_default()
            .to_lowercase();
        let content = dom::get_attribute(&meta, "content").unwrap_or_default();
        let content = content.trim();

        if name.is_empty() || content.is_empty() {
            continue;
        }

        let (key, value) = match name.as_str() {
            "description" | "og:description" | "twitter:description" => (keys::DESCRIPTION, content.to_string()),
            "og:site_name" | "application-name" => (keys::SITE_NAME, content.to_string()),
            "og:image" | "twitter:image" => (keys::IMAGE, url_utils::resolve(content, base)),
            "og:locale" => (keys::LANG, locale_language(content)),
            _ => continue,
        };
        result.entry(key.to_string()).or_insert(value);
    }

    if let Some(lang) = dom::get_attribute(&doc.select("html"), "lang") {
        let lang = lang.trim();
        if !lang.is_empty() {
            result.insert(keys::LANG.to_string(), lang.to_string());
        }
    }

    if let Some(href) = dom::get_attribute(&doc.select("link[rel=\"canonical\"]"), "href") {
        let href = url_utils::resolve(&href, base);
        if !href.is_empty() {
            result.insert(keys::CANONICAL.to_string(), href);
        }
    }

    result
}

/// `en_US` → `en`.
fn locale_language(locale: &str) -> String {
    locale.split(['_', '-']).next().unwrap_or(locale).to_lowercase()
}

/// Parse a date string from meta tags or DOM elements.
///
/// Supports RFC 3339, ISO 8601 without zone, and common written formats.
#[must_use]
pub fn parse_meta_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }

    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%B %d, %Y", // January 15, 2024
        "%b %d, %Y", // Jan 15, 2024
        "%d %B %Y",  // 15 January 2024
    ];

    for fmt in formats {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata() {
        let doc = dom::parse(
            r#"<html lang="de"><head>
            <meta name="description" content=" A page. ">
            <meta property="og:description" content="ignored, first wins">
            <meta property="og:site_name" content="Example">
            <meta property="og:image" content="/img/cover.png">
            <link rel="canonical" href="/post">
            </head><body></body></html>"#,
        );
        let base = Url::parse("https://example.com/blog/").unwrap();
        let meta = page_metadata(&doc, Some(&base));

        assert_eq!(meta.get(keys::DESCRIPTION).map(String::as_str), Some("A page."));
        assert_eq!(meta.get(keys::SITE_NAME).map(String::as_str), Some("Example"));
        assert_eq!(meta.get(keys::IMAGE).map(String::as_str), Some("https://example.com/img/cover.png"));
        assert_eq!(meta.get(keys::CANONICAL).map(String::as_str), Some("https://example.com/post"));
        assert_eq!(meta.get(keys::LANG).map(String::as_str), Some("de"));
    }

    #[test]
    fn test_locale_fallback_for_lang() {
        let doc = dom::parse(r#"<head><meta property="og:locale" content="en_GB"></head>"#);
        assert_eq!(page_metadata(&doc, None).get(keys::LANG).map(String::as_str), Some("en"));
    }

    #[test]
    fn test_document_base() {
        let doc = dom::parse(r#"<head><base href="/docs/"></head>"#);
        let base = document_base(&doc, Some("https://example.com/a/b")).unwrap();
        assert_eq!(base.as_str(), "https://example.com/docs/");

        let plain = dom::parse("<p>x</p>");
        assert_eq!(document_base(&plain, Some("https://example.com/a")).unwrap().as_str(), "https://example.com/a");
        assert!(document_base(&plain, None).is_none());
    }

    #[test]
    fn test_parse_meta_date() {
        assert!(parse_meta_date("2024-01-15T10:30:00Z").is_some());
        assert!(parse_meta_date("2024-01-15").is_some());
        assert!(parse_meta_date("January 15, 2024").is_some());
        assert!(parse_meta_date("yesterday").is_none());
    }
}
