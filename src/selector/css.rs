//! Stable CSS selector synthesis.
//!
//! Strategies run in a fixed cascade and the first accepted candidate wins:
//! id, semantic attribute, stable classes, other attribute, parent-limited,
//! and finally an `nth-of-type` path. Every candidate is re-queried against
//! the document and only accepted when it matches the target element (and
//! nothing else unless multiple matches are allowed). The positional path is
//! unique by construction, so `generate` always returns a selector.

use std::fmt::Write as _;

use crate::dom::{self, Document, NodeRef};
use crate::options::{DynamicValueRules, SelectorOptions};
use crate::result::{SelectorResult, SelectorType};

use super::dynamic::{is_dynamic, stable_classes};

/// Attributes tried by the semantic strategy, in priority order.
pub const SEMANTIC_ATTRIBUTES: &[&str] = &[
    "data-testid",
    "data-cy",
    "data-id",
    "aria-label",
    "name",
    "title",
    "role",
];

/// Test-automation attributes score higher than accessibility attributes.
const TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-cy", "data-id"];

/// Attributes never used by the generic attribute strategy.
const ATTRIBUTE_BLOCKLIST: &[&str] = &["id", "class", "style", "src", "href", "srcset"];

/// Positional paths longer than this are shortened when the shorter form is
/// still unique.
const MAX_PATH_SEGMENTS: usize = 5;

/// Builds selectors that keep matching after unrelated page changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorGenerator {
    rules: DynamicValueRules,
}

impl SelectorGenerator {
    /// Generator using the given dynamic-value thresholds.
    #[must_use]
    pub fn new(rules: DynamicValueRules) -> Self {
        Self { rules }
    }

    /// Selector for `node`, which must be an element of `doc`.
    #[must_use]
    pub fn generate(&self, doc: &Document, node: &NodeRef, opts: &SelectorOptions) -> SelectorResult {
        if let Some(result) = self.by_id(doc, node, opts.allow_multiple) {
            return result;
        }
        if let Some(result) = self.by_semantic_attribute(doc, node, opts.allow_multiple) {
            return result;
        }
        if let Some(result) = self.by_classes(doc, node, opts.allow_multiple) {
            return result;
        }
        if let Some(result) = self.by_attribute(doc, node, opts.allow_multiple) {
            return result;
        }
        if let Some(result) = self.by_parent(doc, node, opts.max_ancestor_depth, opts.allow_multiple) {
            return result;
        }
        self.nth_path(doc, node)
    }

    fn by_id(&self, doc: &Document, node: &NodeRef, allow_multiple: bool) -> Option<SelectorResult> {
        let id = dom::node_attr(node, "id")?;
        if is_dynamic(&id, &self.rules) {
            return None;
        }
        let selector = format!("#{}", escape_identifier(&id));
        accept(doc, &selector, node, allow_multiple, 95, SelectorType::Id)
    }

    fn by_semantic_attribute(&self, doc: &Document, node: &NodeRef, allow_multiple: bool) -> Option<SelectorResult> {
        let tag = dom::node_tag(node);
        for attr in SEMANTIC_ATTRIBUTES {
            let Some(value) = dom::node_attr(node, attr) else {
                continue;
            };
            if value.contains('\n') || is_dynamic(&value, &self.rules) {
                continue;
            }
            let stability = if TEST_ATTRIBUTES.contains(attr) { 85 } else { 75 };
            let bare = attribute_selector(attr, &value);
            for selector in [bare.clone(), format!("{tag}{bare}")] {
                if let Some(result) = accept(doc, &selector, node, allow_multiple, stability, SelectorType::Semantic) {
                    return Some(result);
                }
            }
        }
        None
    }

    fn by_classes(&self, doc: &Document, node: &NodeRef, allow_multiple: bool) -> Option<SelectorResult> {
        let classes = stable_classes(node, &self.rules);
        if classes.is_empty() {
            return None;
        }
        let tag = dom::node_tag(node);
        let mut multi: Option<SelectorResult> = None;

        for len in (1..=classes.len()).rev() {
            let selector = class_selector(&tag, &classes[..len]);
            let count = matching_count(doc, &selector, node);
            if count == 1 {
                return Some(SelectorResult {
                    selector,
                    match_count: 1,
                    stability: 80,
                    selector_type: SelectorType::Class,
                });
            }
            if count > 1 && multi.is_none() {
                multi = Some(SelectorResult {
                    selector,
                    match_count: count,
                    stability: 70,
                    selector_type: SelectorType::Class,
                });
            }
        }

        multi.filter(|_| allow_multiple)
    }

    fn by_attribute(&self, doc: &Document, node: &NodeRef, allow_multiple: bool) -> Option<SelectorResult> {
        let tag = dom::node_tag(node);
        for (name, value) in dom::get_all_attributes(node) {
            if ATTRIBUTE_BLOCKLIST.contains(&name.as_str())
                || name.starts_with("on")
                || SEMANTIC_ATTRIBUTES.contains(&name.as_str())
                || !is_plain_identifier(&name)
            {
                continue;
            }
            if value.is_empty()
                || value.chars().any(char::is_whitespace)
                || value.chars().count() > 50
                || is_dynamic(&value, &self.rules)
            {
                continue;
            }
            let selector = format!("{tag}{}", attribute_selector(&name, &value));
            if let Some(result) = accept(doc, &selector, node, allow_multiple, 65, SelectorType::Attribute) {
                return Some(result);
            }
        }
        None
    }

    fn by_parent(
        &self,
        doc: &Document,
        node: &NodeRef,
        max_depth: usize,
        allow_multiple: bool,
    ) -> Option<SelectorResult> {
        let tag = dom::node_tag(node);
        let classes = stable_classes(node, &self.rules);
        let mut ancestor = dom::parent_element(node);
        let mut depth = 1;

        while let Some(anc) = ancestor {
            if depth > max_depth || dom::node_tag(&anc) == "html" {
                break;
            }
            if let Some(anchor) = self.anchor_selector(doc, &anc, max_depth.saturating_sub(depth)) {
                let mut candidates: Vec<(String, u8)> = Vec::new();
                if depth == 1 {
                    candidates.push((format!("{anchor} > {tag}"), 65));
                    for class in &classes {
                        candidates.push((format!("{anchor} > {tag}.{}", escape_identifier(class)), 60));
                    }
                }
                candidates.push((format!("{anchor} {tag}"), 55));
                for class in &classes {
                    candidates.push((format!("{anchor} {tag}.{}", escape_identifier(class)), 55));
                }

                for (selector, stability) in candidates {
                    if let Some(result) = accept(doc, &selector, node, allow_multiple, stability, SelectorType::ParentLimited) {
                        return Some(result);
                    }
                }
            }
            ancestor = dom::parent_element(&anc);
            depth += 1;
        }
        None
    }

    /// Unique selector for an ancestor, using the same cascade minus the
    /// positional path. `budget` bounds the recursion through further ancestors.
    fn anchor_selector(&self, doc: &Document, anc: &NodeRef, budget: usize) -> Option<String> {
        let found = self
            .by_id(doc, anc, false)
            .or_else(|| self.by_semantic_attribute(doc, anc, false))
            .or_else(|| self.by_classes(doc, anc, false))
            .or_else(|| self.by_attribute(doc, anc, false));
        if let Some(result) = found {
            return Some(result.selector);
        }

        let tag = dom::node_tag(anc);
        if matching_count(doc, &tag, anc) == 1 {
            return Some(tag);
        }
        if budget == 0 {
            return None;
        }
        self.by_parent(doc, anc, budget, false).map(|r| r.selector)
    }

    fn nth_path(&self, doc: &Document, node: &NodeRef) -> SelectorResult {
        let mut segments: Vec<String> = Vec::new();
        let mut anchor: Option<String> = None;
        let mut current = Some(*node);

        while let Some(n) = current {
            let tag = dom::node_tag(&n);
            if tag.is_empty() {
                break;
            }
            if n.id != node.id {
                if let Some(id) = dom::node_attr(&n, "id") {
                    let id_selector = format!("#{}", escape_identifier(&id));
                    if !is_dynamic(&id, &self.rules) && dom::count_matches(doc, &id_selector) == 1 {
                        anchor = Some(id_selector);
                        break;
                    }
                }
            }
            if tag == "html" || tag == "body" {
                segments.push(tag);
                break;
            }
            let (position, _) = dom::same_tag_position(&n);
            segments.push(format!("{tag}:nth-of-type({position})"));
            current = dom::parent_element(&n);
        }
        segments.reverse();

        let join = |parts: &[String]| -> String {
            let path = parts.join(" > ");
            match &anchor {
                Some(a) if path.is_empty() => a.clone(),
                Some(a) => format!("{a} > {path}"),
                None => path,
            }
        };
        let full = join(&segments);

        let selector = if segments.len() > MAX_PATH_SEGMENTS {
            let tail = &segments[segments.len() - MAX_PATH_SEGMENTS..];
            let short = match &anchor {
                Some(a) => format!("{a} {}", tail.join(" > ")),
                None => tail.join(" > "),
            };
            if matching_count(doc, &short, node) == 1 {
                short
            } else {
                full
            }
        } else {
            full
        };

        let match_count = dom::count_matches(doc, &selector).max(1);
        SelectorResult {
            selector,
            match_count,
            stability: 30,
            selector_type: SelectorType::NthPath,
        }
    }
}

/// Number of matches of `selector`, or zero when it does not match `node`.
fn matching_count(doc: &Document, selector: &str, node: &NodeRef) -> usize {
    match dom::query_all(doc, selector) {
        Ok(sel) if sel.nodes().iter().any(|n| n.id == node.id) => sel.length(),
        Ok(_) => 0,
        Err(err) => {
            log::debug!("selector candidate rejected: {err}");
            0
        }
    }
}

fn accept(
    doc: &Document,
    selector: &str,
    node: &NodeRef,
    allow_multiple: bool,
    stability: u8,
    selector_type: SelectorType,
) -> Option<SelectorResult> {
    let count = matching_count(doc, selector, node);
    if count == 1 || (allow_multiple && count > 1) {
        Some(SelectorResult {
            selector: selector.to_string(),
            match_count: count,
            stability,
            selector_type,
        })
    } else {
        None
    }
}

fn class_selector(tag: &str, classes: &[String]) -> String {
    let mut out = tag.to_string();
    for class in classes {
        out.push('.');
        out.push_str(&escape_identifier(class));
    }
    out
}

fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{name}=\"{}\"]", escape_attribute_value(value))
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Escape a string for use as a CSS identifier (`#id`, `.class`).
#[must_use]
pub fn escape_identifier(value: &str) -> String {
    if value == "-" {
        return "\\-".to_string();
    }
    let mut out = String::with_capacity(value.len() + 4);
    let starts_with_dash = value.starts_with('-');
    for (i, c) in value.chars().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && starts_with_dash));
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if leading_digit || c.is_control() {
            let _ = write!(out, "\\{:x} ", c as u32);
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Escape a string for use inside a double-quoted CSS attribute value.
#[must_use]
pub fn escape_attribute_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
