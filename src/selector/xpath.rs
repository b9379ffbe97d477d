//! XPath locators for "next page" controls.
//!
//! Pagination buttons are often styled links with no id, so they get their
//! own strategy list (rel, aria-label, text, title, next-ish classes, data
//! attributes, class plus text, positional path). Expressions are built as a
//! small typed AST that renders to XPath 1.0 text and can be evaluated against
//! a `dom_query` document; a strategy is only accepted when its expression
//! matches exactly one element.

use std::collections::HashSet;
use std::fmt;

use crate::dom::{self, Document, NodeId, NodeRef};
use crate::options::DynamicValueRules;
use crate::result::{XPathResult, XPathStrategy};

use super::dynamic::stable_classes;

/// Longest link text used by the text strategy.
const MAX_TEXT_LEN: usize = 20;

const NEXT_WORDS: &[&str] = &["next", "forward"];
const DATA_WORDS: &[&str] = &["next", "page"];

/// Filter applied to the nodes selected by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `@name='value'`
    AttrEquals(String, String),
    /// `contains(@name,'value')`
    AttrContains(String, String),
    /// Whole class token: `contains(concat(' ',normalize-space(@class),' '),' value ')`
    ClassToken(String),
    /// `normalize-space(.)='value'`
    TextEquals(String),
    /// 1-based position among same-tag siblings: `[n]`
    Position(usize),
}

impl Predicate {
    fn matches(&self, node: &NodeRef) -> bool {
        match self {
            Self::AttrEquals(name, value) => node.attr(name).is_some_and(|v| &*v == value.as_str()),
            Self::AttrContains(name, value) => node.attr(name).is_some_and(|v| v.contains(value.as_str())),
            Self::ClassToken(token) => dom::classes(node).iter().any(|c| c == token),
            Self::TextEquals(text) => dom::normalized_text(node) == *text,
            Self::Position(n) => dom::same_tag_position(node).0 == *n,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttrEquals(name, value) => write!(f, "[@{name}={}]", literal(value)),
            Self::AttrContains(name, value) => write!(f, "[contains(@{name},{})]", literal(value)),
            Self::ClassToken(token) => write!(
                f,
                "[contains(concat(' ',normalize-space(@class),' '),{})]",
                literal(&format!(" {token} "))
            ),
            Self::TextEquals(text) => write!(f, "[normalize-space(.)={}]", literal(text)),
            Self::Position(n) => write!(f, "[{n}]"),
        }
    }
}

/// Step axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/`
    Child,
    /// `//`
    Descendant,
}

/// One location step: axis, tag (`None` = `*`) and predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Axis from the previous context.
    pub axis: Axis,
    /// Element name.
    pub tag: Option<String>,
    /// Filters, all of which must hold.
    pub predicates: Vec<Predicate>,
}

impl Step {
    /// `//tag[...]`
    #[must_use]
    pub fn descendant(tag: &str, predicates: Vec<Predicate>) -> Self {
        Self {
            axis: Axis::Descendant,
            tag: Some(tag.to_string()),
            predicates,
        }
    }

    /// `/tag[...]`
    #[must_use]
    pub fn child(tag: &str, predicates: Vec<Predicate>) -> Self {
        Self {
            axis: Axis::Child,
            tag: Some(tag.to_string()),
            predicates,
        }
    }

    fn accepts(&self, node: &NodeRef) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if dom::node_tag(node) != *tag {
                return false;
            }
        }
        self.predicates.iter().all(|p| p.matches(node))
    }
}

/// An absolute location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    /// Steps from the document root.
    pub steps: Vec<Step>,
}

impl XPath {
    /// Path made of a single step.
    #[must_use]
    pub fn single(step: Step) -> Self {
        Self { steps: vec![step] }
    }

    /// Elements of `doc` the expression selects, in document order.
    #[must_use]
    pub fn evaluate<'a>(&self, doc: &'a Document) -> Vec<NodeRef<'a>> {
        let mut context: Vec<NodeRef<'a>> = vec![doc.root()];
        for step in &self.steps {
            let mut next: Vec<NodeRef<'a>> = Vec::new();
            let mut seen: HashSet<NodeId> = HashSet::new();
            for ctx in &context {
                let candidates = match step.axis {
                    Axis::Child => ctx.children(),
                    Axis::Descendant => ctx.descendants(),
                };
                for candidate in candidates {
                    if step.accepts(&candidate) && seen.insert(candidate.id) {
                        next.push(candidate);
                    }
                }
            }
            context = next;
        }
        context
    }

    /// Whether the expression selects exactly `node`.
    #[must_use]
    pub fn is_unique_match(&self, doc: &Document, node: &NodeRef) -> bool {
        let found = self.evaluate(doc);
        found.len() == 1 && found[0].id == node.id
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            f.write_str(match step.axis {
                Axis::Child => "/",
                Axis::Descendant => "//",
            })?;
            f.write_str(step.tag.as_deref().unwrap_or("*"))?;
            for predicate in &step.predicates {
                write!(f, "{predicate}")?;
            }
        }
        Ok(())
    }
}

/// XPath 1.0 string literal, using `concat()` when both quote kinds occur.
#[must_use]
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(",\"'\","))
}

/// Builds unique XPath locators for pagination controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextPageLocator {
    rules: DynamicValueRules,
}

impl NextPageLocator {
    /// Locator using the given dynamic-value thresholds.
    #[must_use]
    pub fn new(rules: DynamicValueRules) -> Self {
        Self { rules }
    }

    /// XPath for `node`. Always succeeds; the positional path is the last resort.
    #[must_use]
    pub fn generate(&self, doc: &Document, node: &NodeRef) -> XPathResult {
        for (strategy, xpath) in self.candidates(node) {
            if xpath.is_unique_match(doc, node) {
                return XPathResult {
                    xpath: xpath.to_string(),
                    match_count: 1,
                    strategy,
                };
            }
            log::debug!("next-page strategy {strategy:?} not unique: {xpath}");
        }

        let path = positional_path(node);
        let match_count = path.evaluate(doc).len();
        XPathResult {
            xpath: path.to_string(),
            match_count,
            strategy: XPathStrategy::Path,
        }
    }

    fn candidates(&self, node: &NodeRef) -> Vec<(XPathStrategy, XPath)> {
        let tag = dom::node_tag(node);
        let text = dom::normalized_text(node);
        let short_text = (!text.is_empty() && text.chars().count() <= MAX_TEXT_LEN).then_some(text);
        let mut out = Vec::new();
        let one = |predicates: Vec<Predicate>| XPath::single(Step::descendant(&tag, predicates));

        if let Some(rel) = node.attr("rel") {
            if rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")) {
                out.push((XPathStrategy::RelNext, one(vec![Predicate::AttrEquals("rel".into(), rel.to_string())])));
            }
        }

        if let Some(label) = dom::node_attr(node, "aria-label") {
            out.push((XPathStrategy::AriaLabel, one(vec![Predicate::AttrEquals("aria-label".into(), label)])));
        }

        if let Some(text) = &short_text {
            out.push((XPathStrategy::Text, one(vec![Predicate::TextEquals(text.clone())])));
        }

        if let Some(title) = dom::node_attr(node, "title") {
            out.push((XPathStrategy::Title, one(vec![Predicate::AttrEquals("title".into(), title)])));
        }

        let next_class = dom::classes(node)
            .into_iter()
            .find(|c| NEXT_WORDS.iter().any(|w| c.to_ascii_lowercase().contains(w)));
        if let Some(class) = next_class {
            out.push((XPathStrategy::NextClass, one(vec![Predicate::AttrContains("class".into(), class.clone())])));
            if let Some(text) = &short_text {
                out.push((
                    XPathStrategy::NextClass,
                    one(vec![Predicate::AttrContains("class".into(), class), Predicate::TextEquals(text.clone())]),
                ));
            }
        }

        for (name, value) in dom::get_all_attributes(node) {
            if !name.starts_with("data-") || value.is_empty() {
                continue;
            }
            let haystack = format!("{name} {value}").to_ascii_lowercase();
            if DATA_WORDS.iter().any(|w| haystack.contains(w)) {
                out.push((XPathStrategy::DataAttribute, one(vec![Predicate::AttrEquals(name, value)])));
            }
        }

        if let Some(text) = &short_text {
            for class in stable_classes(node, &self.rules) {
                out.push((
                    XPathStrategy::ClassText,
                    one(vec![Predicate::ClassToken(class), Predicate::TextEquals(text.clone())]),
                ));
            }
        }

        out
    }
}

/// `/html/body/div[2]/a[1]`: unique by construction.
#[must_use]
pub fn positional_path(node: &NodeRef) -> XPath {
    let mut steps = Vec::new();
    let mut current = Some(*node);
    while let Some(n) = current {
        let tag = dom::node_tag(&n);
        if tag.is_empty() {
            break;
        }
        let (position, _) = dom::same_tag_position(&n);
        steps.push(Step::child(&tag, vec![Predicate::Position(position)]));
        current = dom::parent_element(&n);
    }
    steps.reverse();
    XPath { steps }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(html: &str, target: &str) -> XPathResult {
        let doc = dom::parse(html);
        let node = dom::first_node(&doc.select(target)).unwrap();
        NextPageLocator::default().generate(&doc, &node)
    }

    #[test]
    fn test_rel_next_first() {
        let result = locate(r#"<a href="/p2" rel="next" aria-label="Next page">Next</a>"#, "a");
        assert_eq!(result.xpath, "//a[@rel='next']");
        assert_eq!(result.strategy, XPathStrategy::RelNext);
    }

    #[test]
    fn test_aria_label() {
        let result = locate(r#"<button aria-label="Go to next page">›</button>"#, "button");
        assert_eq!(result.xpath, "//button[@aria-label='Go to next page']");
    }

    #[test]
    fn test_short_text() {
        let html = r#"<a href="/1">1</a><a href="/2">2</a><a href="/n">Next »</a>"#;
        let result = locate(html, r#"a[href="/n"]"#);
        assert_eq!(result.xpath, "//a[normalize-space(.)='Next »']");
        assert_eq!(result.strategy, XPathStrategy::Text);
    }

    #[test]
    fn test_ambiguous_text_falls_through_to_class() {
        let html = r#"<a class="pager-next" href="/2">More</a><a href="/x">More</a>"#;
        let result = locate(html, "a.pager-next");
        assert_eq!(result.xpath, "//a[contains(@class,'pager-next')]");
        assert_eq!(result.strategy, XPathStrategy::NextClass);
    }

    #[test]
    fn test_data_attribute() {
        let html = r#"<span data-action="load-page">Load more items please now</span><span>x</span>"#;
        let result = locate(html, "span[data-action]");
        assert_eq!(result.strategy, XPathStrategy::DataAttribute);
        assert_eq!(result.xpath, "//span[@data-action='load-page']");
    }

    #[test]
    fn test_positional_fallback() {
        let html = r#"<div><a>x</a></div><div><a>x</a></div>"#;
        let doc = dom::parse(html);
        let node = dom::first_node(&doc.select("div:nth-of-type(2) a")).unwrap();
        let result = NextPageLocator::default().generate(&doc, &node);
        assert_eq!(result.strategy, XPathStrategy::Path);
        assert_eq!(result.xpath, "/html[1]/body[1]/div[2]/a[1]");
        assert_eq!(result.match_count, 1);
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(literal("next"), "'next'");
        assert_eq!(literal("it's"), "\"it's\"");
        assert_eq!(literal(r#"a'b"c"#), r#"concat('a',"'",'b"c')"#);
    }

    #[test]
    fn test_evaluate_class_token_is_whole_word() {
        let doc = dom::parse(r#"<a class="next-link">a</a><a class="next">b</a>"#);
        let xpath = XPath::single(Step::descendant("a", vec![Predicate::ClassToken("next".into())]));
        assert_eq!(xpath.evaluate(&doc).len(), 1);
    }
}
