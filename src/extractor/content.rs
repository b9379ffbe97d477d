//! Main content selection and formatting.
//!
//! Candidates, first hit wins:
//! 1. the `<article>` with the longest text (only without a custom selector)
//! 2. the first selector of the content list whose match has text
//! 3. all paragraphs over 30 characters, when there are more than three
//! 4. the document body
//!
//! The chosen subtree is converted to Markdown; images land in the caller's
//! accumulator.

use url::Url;

use crate::dom::{self, Document, NodeRef, Selection};
use crate::logger::Logger;
use crate::markdown::{self, ImageAccumulator};
use crate::options::SelectorOptions;
use crate::registry::{FieldType, SelectorRegistry};
use crate::result::{ElementInfo, ExtractedContent, FieldExtractionResult};
use crate::selector::SelectorGenerator;

/// Label recorded when the longest article wins.
pub const LONGEST_ARTICLE: &str = "article (longest)";

/// Label recorded for the synthesized paragraph set.
pub const PARAGRAPH_SET: &str = "p (synthesized)";

/// Label recorded when the whole body is used.
pub const BODY: &str = "body";

/// Tag name reported for content that is not one element.
pub const SYNTHETIC_TAG: &str = "#synthetic";

const MIN_PARAGRAPH_CHARS: usize = 30;
const MIN_PARAGRAPHS: usize = 3;

/// The subtree(s) chosen as main content.
#[derive(Debug, Clone)]
pub struct ContentSelection<'a> {
    /// Selector or label that produced the selection.
    pub label: String,
    /// Chosen elements in document order.
    pub nodes: Vec<NodeRef<'a>>,
}

impl ContentSelection<'_> {
    /// Whitespace-normalized text, elements separated by blank lines.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(dom::normalized_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Pick the main content of a page.
///
/// Returns `None` only when the page has no text at all.
#[must_use]
pub fn select_content<'a>(
    doc: &'a Document,
    registry: &SelectorRegistry,
    custom_selector: Option<&str>,
    logger: &dyn Logger,
) -> Option<ContentSelection<'a>> {
    let custom = custom_selector.map(str::trim).filter(|s| !s.is_empty());

    if custom.is_none() {
        if let Some(article) = longest_article(doc) {
            return Some(ContentSelection {
                label: LONGEST_ARTICLE.to_string(),
                nodes: vec![article],
            });
        }
    }

    let custom_list: Vec<String>;
    let selectors: &[String] = match custom {
        Some(selector) => {
            custom_list = vec![selector.to_string()];
            &custom_list
        }
        None => registry.selectors(FieldType::Content),
    };

    for selector in selectors {
        match dom::query_all(doc, selector) {
            Ok(matches) => {
                let hit = matches
                    .nodes()
                    .iter()
                    .find(|node| !dom::normalized_text(node).is_empty())
                    .copied();
                if let Some(node) = hit {
                    return Some(ContentSelection {
                        label: selector.clone(),
                        nodes: vec![node],
                    });
                }
            }
            Err(e) => logger.warn("content", &format!("skipping selector: {e}")),
        }
    }

    let paragraphs: Vec<NodeRef<'a>> = doc
        .select("p")
        .nodes()
        .iter()
        .filter(|p| dom::normalized_text(p).chars().count() > MIN_PARAGRAPH_CHARS)
        .copied()
        .collect();
    if paragraphs.len() > MIN_PARAGRAPHS {
        return Some(ContentSelection {
            label: PARAGRAPH_SET.to_string(),
            nodes: paragraphs,
        });
    }

    let body = dom::first_node(&doc.select("body"))?;
    if dom::normalized_text(&body).is_empty() {
        return None;
    }
    Some(ContentSelection {
        label: BODY.to_string(),
        nodes: vec![body],
    })
}

fn longest_article<'a>(doc: &'a Document) -> Option<NodeRef<'a>> {
    doc.select("article")
        .nodes()
        .iter()
        .map(|node| (dom::normalized_text(node).chars().count(), *node))
        .filter(|(len, _)| *len > 0)
        // First article wins ties.
        .fold(None, |best: Option<(usize, NodeRef<'a>)>, (len, node)| match best {
            Some((best_len, _)) if best_len >= len => best,
            _ => Some((len, node)),
        })
        .map(|(_, node)| node)
}

/// Select, convert and describe the main content.
///
/// The second value is the content field's selector record: one entry naming
/// the winning selector or label, empty when the page has no text.
#[must_use]
pub fn extract_content(
    doc: &Document,
    registry: &SelectorRegistry,
    custom_selector: Option<&str>,
    base: Option<&Url>,
    images: &mut ImageAccumulator,
    logger: &dyn Logger,
) -> (ExtractedContent, Vec<FieldExtractionResult>) {
    let Some(selection) = select_content(doc, registry, custom_selector, logger) else {
        logger.debug("content", "page has no text");
        return (ExtractedContent::default(), Vec::new());
    };
    logger.debug("content", &format!("selected {} ({} element(s))", selection.label, selection.nodes.len()));

    let markdown = markdown::nodes_to_markdown(&selection.nodes, base, images);
    let text = selection.text();
    let html = selection
        .nodes
        .iter()
        .map(|node| Selection::from(*node).html().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let element_info = element_info(doc, &selection);
    let record = FieldExtractionResult {
        selector: selection.label.clone(),
        content: text.clone(),
        all_content: vec![text.clone()],
    };

    (
        ExtractedContent {
            html,
            markdown,
            text,
            element_info: Some(element_info),
        },
        vec![record],
    )
}

fn element_info(doc: &Document, selection: &ContentSelection) -> ElementInfo {
    match selection.nodes.as_slice() {
        [node] => ElementInfo {
            tag_name: dom::node_tag(node),
            id: dom::node_attr(node, "id"),
            classes: dom::classes(node),
            selector: Some(SelectorGenerator::default().generate(doc, node, &SelectorOptions::default()).selector),
        },
        _ => ElementInfo {
            tag_name: SYNTHETIC_TAG.to_string(),
            ..ElementInfo::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;

    fn sentence(n: usize) -> String {
        "word ".repeat(n).trim_end().to_string()
    }

    #[test]
    fn test_longest_article_wins() {
        let html = format!(
            "<body><article><p>{}</p></article><article id=\"big\"><p>{}</p></article><main>{}</main></body>",
            sentence(10),
            sentence(100),
            sentence(20)
        );
        let doc = dom::parse(&html);
        let selection = select_content(&doc, &SelectorRegistry::new(), None, &MemoryLogger::new()).unwrap();
        assert_eq!(selection.label, LONGEST_ARTICLE);
        assert_eq!(dom::node_attr(&selection.nodes[0], "id").as_deref(), Some("big"));
    }

    #[test]
    fn test_custom_selector_skips_article_preference() {
        let html = format!("<article><p>{}</p></article><div class=\"story\">Story body</div>", sentence(50));
        let doc = dom::parse(&html);
        let selection = select_content(&doc, &SelectorRegistry::new(), Some(".story"), &MemoryLogger::new()).unwrap();
        assert_eq!(selection.label, ".story");
        assert_eq!(selection.text(), "Story body");
    }

    #[test]
    fn test_registry_order() {
        let doc = dom::parse("<main>Main text</main><div class=\"entry-content\">Entry text</div>");
        let selection = select_content(&doc, &SelectorRegistry::new(), None, &MemoryLogger::new()).unwrap();
        assert_eq!(selection.label, ".entry-content");
    }

    #[test]
    fn test_paragraph_set_needs_more_than_three() {
        let long = "This paragraph is comfortably longer than thirty characters.";
        let four = format!("<div><p>{long}</p><p>{long}</p><p>short</p><p>{long}</p><p>{long}</p></div>");
        let doc = dom::parse(&four);
        let selection = select_content(&doc, &SelectorRegistry::new(), None, &MemoryLogger::new()).unwrap();
        assert_eq!(selection.label, PARAGRAPH_SET);
        assert_eq!(selection.nodes.len(), 4);

        let three = format!("<div><p>{long}</p><p>{long}</p><p>{long}</p></div>");
        let doc = dom::parse(&three);
        let selection = select_content(&doc, &SelectorRegistry::new(), None, &MemoryLogger::new()).unwrap();
        assert_eq!(selection.label, BODY);
    }

    #[test]
    fn test_empty_page_has_no_content() {
        let doc = dom::parse("<html><body>   </body></html>");
        assert!(select_content(&doc, &SelectorRegistry::new(), None, &MemoryLogger::new()).is_none());
        let (content, records) = extract_content(&doc, &SelectorRegistry::new(), None, None, &mut ImageAccumulator::new(), &MemoryLogger::new());
        assert!(content.markdown.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_content_describes_element() {
        let doc = dom::parse(r#"<main><div class="post-content" id="post"><h2>Hi</h2><p>Body <img src="/a.png" alt="A"></p></div></main>"#);
        let mut images = ImageAccumulator::new();
        let (content, records) = extract_content(&doc, &SelectorRegistry::new(), None, None, &mut images, &MemoryLogger::new());

        assert_eq!(records[0].selector, ".post-content");
        assert_eq!(content.markdown, "## Hi\n\nBody ![A](/a.png)");
        let info = content.element_info.unwrap();
        assert_eq!(info.tag_name, "div");
        assert_eq!(info.id.as_deref(), Some("post"));
        assert_eq!(info.selector.as_deref(), Some("#post"));
        assert_eq!(images.len(), 1);
    }
}
