//! # markscrape
//!
//! Adaptive main-content scraping to Markdown.
//!
//! A page is scraped by an extraction pipeline that chooses among CSS
//! selector lists, a Readability heuristic and a hybrid of both arbitrated by
//! a content-quality score, falling back to selectors when Readability
//! fails. Alongside it the crate synthesizes stable CSS selectors and
//! next-page XPaths for picked elements, extracts outbound links, and
//! batch-scrapes linked pages with bounded concurrency.
//!
//! ## Quick Start
//!
//! ```rust
//! use markscrape::{scrape_html, ExtractionMode, ExtractionOptions};
//!
//! let html = r#"<html><head><title>My Article</title></head>
//! <body><main><h1>My Article</h1><p>Main content here.</p></main></body></html>"#;
//!
//! let content = scrape_html(html, &ExtractionOptions::with_mode(ExtractionMode::Selector));
//! assert_eq!(content.title, "My Article");
//! assert_eq!(content.cleaned_content, "# My Article\n\nMain content here.");
//! ```
//!
//! ## Features
//!
//! - **Extraction pipeline**: selector, Readability and hybrid modes with fallback
//! - **Selector synthesis**: id, semantic, class, attribute, scoped and positional strategies
//! - **Markdown**: headings, lists, code, tables and images with resolved URLs
//! - **Batch scraping**: chunked concurrency, retry, pause/resume/cancel, progress

/// Error types.
pub mod error;

/// Option structs loaded from settings JSON.
pub mod options;

/// Result types.
pub mod result;

/// Selector lists per field, with overrides.
pub mod registry;

/// Injected logging capability.
pub mod logger;

/// DOM helpers over `dom_query`.
pub mod dom;

/// URL parsing, resolution and normalization.
pub mod url_utils;

/// Charset detection for fetched pages.
pub mod encoding;

/// Stable CSS selector and next-page XPath synthesis.
pub mod selector;

/// HTML to Markdown conversion.
pub mod markdown;

/// Markdown normalization and image reference scanning.
pub mod text_cleaning;

/// Page metadata from `<meta>` tags.
pub mod metadata;

/// Readability adapter.
pub mod readability;

/// Content quality scoring.
pub mod quality;

/// Extraction pipeline.
pub mod extractor;

/// Outbound link extraction.
pub mod links;

/// Batch scraping of linked pages.
pub mod batch;

// Public API - re-exports
pub use batch::{BatchScrapeController, Fetcher, ReqwestFetcher};
pub use error::{Error, Result};
pub use extractor::{ExtractionPipeline, PipelineOutcome, PipelineStatus};
pub use links::extract_links;
pub use options::{BatchScrapeOptions, ExtractionMode, ExtractionOptions, LinkFilterOptions, SelectorOptions};
pub use quality::evaluate_content_quality;
pub use registry::{FieldType, SelectorRegistry};
pub use result::{BatchProgress, BatchScrapeResult, ExtractedLink, ScrapedContent, SeedLink, SelectorResult, XPathResult};
pub use selector::{generate_next_page_xpath, generate_selector};

/// Scrape an HTML string with the default pipeline.
///
/// Never fails: when no strategy produces content the result is empty apart
/// from `metadata["pipeline:error"]`.
#[must_use]
pub fn scrape_html(html: &str, options: &ExtractionOptions) -> ScrapedContent {
    let doc = dom::parse(html);
    ExtractionPipeline::default().run(&doc, options).content
}

/// Scrape raw HTML bytes, detecting their charset first.
///
/// ```rust
/// use markscrape::{scrape_bytes, ExtractionMode, ExtractionOptions};
///
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body><main><p>Caf\xE9</p></main></body></html>";
/// let content = scrape_bytes(html, &ExtractionOptions::with_mode(ExtractionMode::Selector));
/// assert_eq!(content.cleaned_content, "Caf\u{e9}");
/// ```
#[must_use]
pub fn scrape_bytes(html: &[u8], options: &ExtractionOptions) -> ScrapedContent {
    scrape_html(&encoding::decode_body(html, None), options)
}
