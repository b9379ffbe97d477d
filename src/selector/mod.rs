//! Stable selector synthesis.
//!
//! Given an element a user picked on a page, derive a locator that should keep
//! matching that element after unrelated page changes:
//!
//! - `css`: CSS selector cascade (id, semantic attribute, classes, attribute,
//!   parent-limited, `nth-of-type` path) with a stability score
//! - `xpath`: XPath locator for "next page" controls
//! - `dynamic`: heuristics that reject generated ids and class names
//!
//! # Example
//!
//! ```rust
//! use markscrape::dom;
//! use markscrape::options::SelectorOptions;
//! use markscrape::selector::generate_selector;
//!
//! let doc = dom::parse(r#"<main><h2 data-testid="headline">Hi</h2></main>"#);
//! let picked = doc.select("h2");
//! let result = generate_selector(&doc, &picked, &SelectorOptions::default()).unwrap();
//! assert_eq!(result.selector, r#"[data-testid="headline"]"#);
//! ```

pub mod css;
pub mod dynamic;
pub mod xpath;

pub use css::SelectorGenerator;
pub use xpath::{NextPageLocator, XPath};

use crate::dom::{self, Document, NodeRef, Selection};
use crate::options::{DynamicValueRules, SelectorOptions};
use crate::result::{SelectorResult, XPathResult};

/// Element a selection points at; text nodes resolve to their parent element.
fn target_element<'a>(element: &Selection<'a>) -> Option<NodeRef<'a>> {
    let node = dom::first_node(element)?;
    if node.is_element() {
        Some(node)
    } else {
        dom::parent_element(&node)
    }
}

/// Stable CSS selector for the first element of `element`.
///
/// Returns `None` only when the selection is empty.
#[must_use]
pub fn generate_selector(doc: &Document, element: &Selection, opts: &SelectorOptions) -> Option<SelectorResult> {
    let node = target_element(element)?;
    Some(SelectorGenerator::new(DynamicValueRules::default()).generate(doc, &node, opts))
}

/// XPath locator for a "next page" control.
///
/// Returns `None` only when the selection is empty.
#[must_use]
pub fn generate_next_page_xpath(doc: &Document, element: &Selection) -> Option<XPathResult> {
    let node = target_element(element)?;
    Some(NextPageLocator::new(DynamicValueRules::default()).generate(doc, &node))
}
