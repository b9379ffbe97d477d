//! Field extraction: title, author and date.
//!
//! Every selector of a field's list is tried and every one that yields a
//! value is recorded, so callers can show alternatives. The first recorded
//! value wins. Invalid selectors are logged and skipped.

use crate::dom::{self, Document, NodeRef};
use crate::logger::Logger;
use crate::registry::{FieldType, SelectorRegistry};
use crate::result::FieldExtractionResult;

/// Value of one matched element.
///
/// `meta` elements yield their `content` attribute, `time` elements their
/// `datetime` attribute (text when absent), everything else its trimmed,
/// whitespace-collapsed text.
#[must_use]
pub fn element_value(node: &NodeRef) -> String {
    match dom::node_tag(node).as_str() {
        "meta" => dom::node_attr(node, "content").unwrap_or_default(),
        "time" => dom::node_attr(node, "datetime").unwrap_or_else(|| dom::normalized_text(node)),
        _ => dom::normalized_text(node),
    }
}

/// Run one selector and collect the non-empty values of all its matches.
///
/// Returns `None` when the selector is invalid or nothing matched with a value.
pub fn run_selector(doc: &Document, selector: &str, logger: &dyn Logger) -> Option<FieldExtractionResult> {
    let matches = match dom::query_all(doc, selector) {
        Ok(matches) => matches,
        Err(e) => {
            logger.warn("fields", &format!("skipping selector: {e}"));
            return None;
        }
    };

    let all_content: Vec<String> = matches
        .nodes()
        .iter()
        .map(element_value)
        .filter(|v| !v.is_empty())
        .collect();

    let content = all_content.first()?.clone();
    Some(FieldExtractionResult {
        selector: selector.to_string(),
        content,
        all_content,
    })
}

/// Extract one field.
///
/// A non-blank `custom_selector` replaces the registry list entirely.
#[must_use]
pub fn extract_field(
    doc: &Document,
    registry: &SelectorRegistry,
    field: FieldType,
    custom_selector: Option<&str>,
    logger: &dyn Logger,
) -> Vec<FieldExtractionResult> {
    let custom: Vec<String>;
    let selectors: &[String] = match custom_selector.map(str::trim).filter(|s| !s.is_empty()) {
        Some(selector) => {
            custom = vec![selector.to_string()];
            &custom
        }
        None => registry.selectors(field),
    };

    let results: Vec<FieldExtractionResult> = selectors
        .iter()
        .filter_map(|selector| run_selector(doc, selector, logger))
        .collect();

    logger.debug(
        "fields",
        &format!("{field}: {} of {} selectors matched", results.len(), selectors.len()),
    );
    results
}
