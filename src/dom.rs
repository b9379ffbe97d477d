//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate. Everything in this crate that
//! touches the tree goes through here, so selector parsing failures are
//! turned into `Error::InvalidSelector` in one place instead of panicking.

pub use dom_query::{Document, Matcher, NodeId, NodeRef, Selection};

use crate::{Error, Result};

// === Parsing ===

/// Parse an HTML string into a document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Selector Compilation ===

/// Compile a CSS selector, reporting parse failures as `InvalidSelector`.
pub fn compile(selector: &str) -> Result<Matcher> {
    Matcher::new(selector).map_err(|e| Error::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// All elements of the document matching `selector`.
pub fn query_all<'a>(doc: &'a Document, selector: &str) -> Result<Selection<'a>> {
    let matcher = compile(selector)?;
    Ok(doc.select_matcher(&matcher))
}

/// Number of document elements matching `selector`; invalid selectors count as zero.
#[must_use]
pub fn count_matches(doc: &Document, selector: &str) -> usize {
    query_all(doc, selector).map_or(0, |sel| sel.length())
}

/// Whether `selector` matches the node with the given id.
#[must_use]
pub fn selector_matches_node(doc: &Document, selector: &str, node_id: NodeId) -> bool {
    query_all(doc, selector).is_ok_and(|sel| sel.nodes().iter().any(|n| n.id == node_id))
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Attribute of a node, trimmed, `None` when missing or blank.
#[must_use]
pub fn node_attr(node: &NodeRef, name: &str) -> Option<String> {
    node.attr(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Class tokens of a node in source order.
#[must_use]
pub fn classes(node: &NodeRef) -> Vec<String> {
    node.attr("class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Get all attributes as key-value pairs
#[must_use]
pub fn get_all_attributes(node: &NodeRef) -> Vec<(String, String)> {
    node.attrs()
        .iter()
        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
        .collect()
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes().first().map(node_tag).filter(|t| !t.is_empty())
}

/// Lowercase tag name of a node; empty for non-elements.
#[must_use]
pub fn node_tag(node: &NodeRef) -> String {
    if !node.is_element() {
        return String::new();
    }
    node.node_name()
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_default()
}

// === Text Content ===

/// Trimmed text of a node with runs of whitespace collapsed.
#[must_use]
pub fn normalized_text(node: &NodeRef) -> String {
    node.text().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed text of a selection with runs of whitespace collapsed.
#[must_use]
pub fn normalized_text_of(sel: &Selection) -> String {
    sel.text().split_whitespace().collect::<Vec<_>>().join(" ")
}

// === Tree Navigation ===

/// Parent node when it is an element.
#[must_use]
pub fn parent_element<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    node.parent().filter(NodeRef::is_element)
}

/// Direct element children.
#[must_use]
pub fn element_children<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children().into_iter().filter(NodeRef::is_element).collect()
}

/// 1-based position of `node` among its parent's element children that share
/// its tag, and how many such siblings there are.
#[must_use]
pub fn same_tag_position(node: &NodeRef) -> (usize, usize) {
    let tag = node_tag(node);
    let Some(parent) = node.parent() else {
        return (1, 1);
    };
    let mut position = 1;
    let mut count = 0;
    for child in parent.children() {
        if child.is_element() && node_tag(&child) == tag {
            count += 1;
            if child.id == node.id {
                position = count;
            }
        }
    }
    (position, count.max(1))
}

/// First node of a selection.
#[must_use]
pub fn first_node<'a>(sel: &Selection<'a>) -> Option<NodeRef<'a>> {
    sel.nodes().first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select() {
        let doc = parse(r#"<div id="main" class="container wide">content</div>"#);
        let div = doc.select("div");

        assert_eq!(get_attribute(&div, "id"), Some("main".to_string()));
        assert_eq!(tag_name(&div), Some("div".to_string()));
        let node = first_node(&div).unwrap();
        assert_eq!(classes(&node), vec!["container", "wide"]);
        assert_eq!(node_tag(&node), "div");
    }

    #[test]
    fn test_invalid_selector_is_error() {
        let doc = parse("<p>x</p>");
        let err = query_all(&doc, "p[").unwrap_err();
        assert!(matches!(err, Error::InvalidSelector { .. }));
        assert_eq!(count_matches(&doc, "p["), 0);
    }

    #[test]
    fn test_same_tag_position() {
        let doc = parse(r#"<ul><li>a</li><span></span><li id="x">b</li><li>c</li></ul>"#);
        let node = first_node(&doc.select("#x")).unwrap();
        assert_eq!(same_tag_position(&node), (2, 3));
    }

    #[test]
    fn test_selector_matches_node() {
        let doc = parse(r#"<div><p class="a">1</p><p class="b">2</p></div>"#);
        let node = first_node(&doc.select("p.b")).unwrap();
        assert!(selector_matches_node(&doc, "div > p:nth-of-type(2)", node.id));
        assert!(!selector_matches_node(&doc, "p.a", node.id));
    }

    #[test]
    fn test_normalized_text() {
        let doc = parse("<p>  Hello \n\t world  </p>");
        let node = first_node(&doc.select("p")).unwrap();
        assert_eq!(normalized_text(&node), "Hello world");
    }

    #[test]
    fn test_all_attributes() {
        let doc = parse(r#"<a href="/x" data-id="7">t</a>"#);
        let node = first_node(&doc.select("a")).unwrap();
        let attrs = get_all_attributes(&node);
        assert!(attrs.contains(&("data-id".to_string(), "7".to_string())));
    }
}
