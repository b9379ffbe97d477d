//! Fallback stage: selector extraction after Readability or hybrid failed.

use url::Url;

use crate::dom::Document;
use crate::logger::Logger;
use crate::metadata::keys;
use crate::options::ExtractionOptions;
use crate::registry::SelectorRegistry;
use crate::result::ScrapedContent;
use crate::{Error, Result};

use super::modes::scrape_with_selectors;

/// Rerun selector mode and record why.
///
/// The result carries `original:mode` (the mode that failed) and a
/// human-readable `fallback:reason` built from `cause`.
pub fn fall_back_to_selectors(
    doc: &Document,
    registry: &SelectorRegistry,
    options: &ExtractionOptions,
    base: Option<&Url>,
    cause: Option<&Error>,
    logger: &dyn Logger,
) -> Result<ScrapedContent> {
    let cause = cause.map_or_else(|| "unknown error".to_string(), ToString::to_string);
    logger.info("fallback", &format!("{} failed ({cause}), using selectors", options.mode));

    let mut content = scrape_with_selectors(doc, registry, options, base, logger)?;
    content
        .metadata
        .insert(keys::ORIGINAL_MODE.to_string(), options.mode.as_str().to_string());
    content.metadata.insert(
        keys::FALLBACK_REASON.to_string(),
        format!("{} mode failed: {cause}", options.mode),
    );
    Ok(content)
}
