//! Readability adapter.
//!
//! Runs the heuristic "main content" extractor from `dom_smoothie` on a
//! sanitized copy of the page. The input document is never modified.
//!
//! Steps:
//! 1. Sanitize the body: forbidden elements are removed, elements outside the
//!    allow-list are unwrapped, inline handlers and styles are stripped.
//! 2. Rebuild a fresh document from the sanitized body and the original head.
//! 3. Optionally mark structural containers as content candidates.
//! 4. Extract with a zero minimum-length floor.
//!
//! Failures are reported as `ReadabilityOutcome { success: false, .. }`.

use crate::dom::{self, Document, Selection};
use crate::options::ReadabilityConfig;

/// Elements removed together with their subtree.
pub const FORBIDDEN_TAGS: &str = "script, style, iframe, object, embed, noscript, template, frame, frameset, applet";

/// Elements kept in the sanitized body. Anything else is unwrapped.
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "audio", "b", "bdi", "bdo", "blockquote", "br",
    "caption", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl",
    "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "i", "img", "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "picture",
    "pre", "q", "s", "samp", "section", "small", "source", "span", "strong", "sub", "summary",
    "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul", "var", "video",
];

/// Class added to structural containers before scoring.
const BOOST_CLASS: &str = "content";

/// Article metadata reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadabilityMetadata {
    /// Article title.
    pub title: String,
    /// Author line.
    pub byline: String,
    /// Short summary.
    pub excerpt: String,
    /// Site name.
    pub site_name: String,
    /// Publication time as found in the page.
    pub published_time: String,
    /// Document language.
    pub lang: String,
}

/// Result of one Readability run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadabilityOutcome {
    /// Whether non-empty content was extracted.
    pub success: bool,
    /// Extracted article HTML.
    pub content: String,
    /// Plain text of the article.
    pub text: String,
    /// Article metadata.
    pub metadata: ReadabilityMetadata,
    /// Why extraction failed.
    pub error: Option<String>,
}

impl ReadabilityOutcome {
    /// Failed outcome with a reason.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Source of heuristic main-content extraction.
///
/// The pipeline holds one of these so tests can substitute a stub.
pub trait ReadabilityBackend: Send + Sync {
    /// Extract the main content of `doc`.
    fn extract(&self, doc: &Document, config: &ReadabilityConfig, url: Option<&str>) -> ReadabilityOutcome;
}

/// Backend built on `dom_smoothie`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomSmoothieBackend;

impl ReadabilityBackend for DomSmoothieBackend {
    fn extract(&self, doc: &Document, config: &ReadabilityConfig, url: Option<&str>) -> ReadabilityOutcome {
        extract_with_readability(doc, config, url)
    }
}

/// Sanitize, rebuild and run Readability on a copy of `doc`.
#[must_use]
pub fn extract_with_readability(doc: &Document, config: &ReadabilityConfig, url: Option<&str>) -> ReadabilityOutcome {
    let rebuilt = rebuild_document(doc);
    if config.boost_structural_tags {
        boost_structural_tags(&rebuilt);
    }
    run_extractor(rebuilt, config, url)
}

/// Fresh document from the sanitized body and the original head.
#[must_use]
pub fn rebuild_document(doc: &Document) -> Document {
    let head = doc.select("head").inner_html().to_string();
    let body = sanitize_html(&doc.select("body").inner_html());
    let lang = doc
        .select("html")
        .attr("lang")
        .map(|l| format!(" lang=\"{}\"", l.replace('"', "")))
        .unwrap_or_default();

    let rebuilt = dom::parse(&format!("<!DOCTYPE html><html{lang}><head>{head}</head><body>{body}</body></html>"));
    rebuilt.select(FORBIDDEN_TAGS).remove();
    rebuilt
}

/// Allow-list sanitize an HTML fragment and return the cleaned body HTML.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let doc = dom::parse(html);
    doc.select(FORBIDDEN_TAGS).remove();

    let body = doc.select("body");
    let elements: Vec<_> = body.select("*").nodes().to_vec();

    // Reverse document order: children are unwrapped before their parents.
    for node in elements.iter().rev() {
        let tag = dom::node_tag(node);
        let sel = Selection::from(*node);
        if !ALLOWED_TAGS.contains(&tag.as_str()) {
            let inner = sel.inner_html();
            sel.replace_with_html(inner);
            continue;
        }
        for (name, value) in dom::get_all_attributes(node) {
            let lower = name.to_ascii_lowercase();
            let scripted_url = (lower == "href" || lower == "src")
                && value.trim_start().to_ascii_lowercase().starts_with("javascript:");
            if lower.starts_with("on") || lower == "style" || scripted_url {
                sel.remove_attr(&name);
            }
        }
    }

    body.inner_html().to_string()
}

/// Mark `article`, `main`, `section` and heading-led `div`s as content.
fn boost_structural_tags(doc: &Document) {
    for node in doc.select("article, main, section, div").nodes() {
        let tag = dom::node_tag(node);
        let heading_led = tag == "div"
            && dom::element_children(node)
                .first()
                .is_some_and(|first| matches!(dom::node_tag(first).as_str(), "h1" | "h2" | "h3"));
        if tag != "div" || heading_led {
            let mut classes = dom::classes(node);
            if !classes.iter().any(|c| c == BOOST_CLASS) {
                classes.push(BOOST_CLASS.to_string());
                Selection::from(*node).set_attr("class", &classes.join(" "));
            }
        }
    }
}

#[cfg(feature = "readability")]
fn run_extractor(doc: Document, config: &ReadabilityConfig, url: Option<&str>) -> ReadabilityOutcome {
    use dom_smoothie::{Config, Readability};

    let cfg = Config {
        char_threshold: config.char_threshold,
        n_top_candidates: config.n_top_candidates,
        ..Default::default()
    };

    let mut reader = match Readability::with_document(doc, url, Some(cfg)) {
        Ok(reader) => reader,
        Err(e) => return ReadabilityOutcome::failure(format!("readability init failed: {e}")),
    };
    let article = match reader.parse() {
        Ok(article) => article,
        Err(e) => return ReadabilityOutcome::failure(format!("readability parse failed: {e}")),
    };

    let content = article.content.to_string();
    let text = article.text_content.to_string();
    if text.trim().is_empty() {
        return ReadabilityOutcome::failure("readability returned no content");
    }

    ReadabilityOutcome {
        success: true,
        content,
        text: text.trim().to_string(),
        metadata: ReadabilityMetadata {
            title: article.title.trim().to_string(),
            byline: article.byline.unwrap_or_default().trim().to_string(),
            excerpt: article.excerpt.unwrap_or_default().trim().to_string(),
            site_name: article.site_name.unwrap_or_default().trim().to_string(),
            published_time: article.published_time.unwrap_or_default().trim().to_string(),
            lang: article.lang.unwrap_or_default().trim().to_string(),
        },
        error: None,
    }
}

#[cfg(not(feature = "readability"))]
fn run_extractor(_doc: Document, _config: &ReadabilityConfig, _url: Option<&str>) -> ReadabilityOutcome {
    ReadabilityOutcome::failure("readability support is not compiled in")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_forbidden_and_handlers() {
        let html = r#"<article onclick="x()"><p style="color:red">Keep</p><script>bad()</script><iframe src="x"></iframe><a href="javascript:alert(1)">j</a></article>"#;
        let clean = sanitize_html(html);
        assert!(clean.contains("<article>"));
        assert!(clean.contains("<p>Keep</p>"));
        assert!(!clean.contains("script"));
        assert!(!clean.contains("iframe"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("style"));
        assert!(!clean.contains("javascript"));
    }

    #[test]
    fn test_sanitize_unwraps_unknown_elements() {
        let clean = sanitize_html("<my-widget><section><time datetime=\"2024\">May</time></section></my-widget>");
        assert!(!clean.contains("my-widget"));
        assert!(clean.contains("<section><time datetime=\"2024\">May</time></section>"));
    }

    #[test]
    fn test_rebuild_keeps_head_and_input_untouched() {
        let doc = dom::parse("<html lang=\"en\"><head><title>T</title></head><body><p>x</p><script>y()</script></body></html>");
        let rebuilt = rebuild_document(&doc);
        assert_eq!(rebuilt.select("title").text().to_string(), "T");
        assert_eq!(rebuilt.select("html").attr("lang").map(|l| l.to_string()), Some("en".to_string()));
        assert!(rebuilt.select("script").is_empty());
        assert_eq!(doc.select("script").length(), 1);
    }

    #[test]
    fn test_boost_marks_structural_containers() {
        let doc = dom::parse("<main><div><h2>T</h2><p>a</p></div><div><p>b</p></div><section class=\"x\">s</section></main>");
        boost_structural_tags(&doc);
        assert!(doc.select("main.content").exists());
        assert!(doc.select("section.x.content").exists());
        assert_eq!(doc.select("div.content").length(), 1);
    }

    #[cfg(feature = "readability")]
    #[test]
    fn test_short_structured_document_is_extracted() {
        let doc = dom::parse(
            "<html><head><title>Short post</title></head><body><article><h1>Short post</h1><p>Only a couple of sentences here. Still worth keeping.</p></article></body></html>",
        );
        let outcome = extract_with_readability(&doc, &ReadabilityConfig::default(), None);
        assert!(outcome.success, "{:?}", outcome.error);
        assert!(outcome.text.contains("couple of sentences"));
    }

    #[test]
    fn test_failure_outcome() {
        let outcome = ReadabilityOutcome::failure("boom");
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }
}
