//! Result types produced by extraction, selector synthesis and batch scraping.
//!
//! All of these are plain values: created per run, serialized for whoever
//! consumes them, never persisted by this crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::options::ExtractionMode;
use crate::registry::FieldType;

/// Strategy that produced a CSS selector, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorType {
    /// `#id`
    Id,
    /// Test/ARIA/semantic attribute.
    Semantic,
    /// Stable class combination.
    Class,
    /// Any other stable attribute.
    Attribute,
    /// Selector scoped under a stable ancestor.
    ParentLimited,
    /// Positional `nth-of-type` path.
    NthPath,
}

/// A synthesized CSS selector for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorResult {
    /// CSS selector text.
    pub selector: String,
    /// Elements the selector matches in the document it was built against.
    pub match_count: usize,
    /// Heuristic 0-100 confidence that the selector survives page changes.
    pub stability: u8,
    /// Strategy used.
    #[serde(rename = "type")]
    pub selector_type: SelectorType,
}

/// Strategy that produced a next-page XPath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XPathStrategy {
    /// `rel="next"`
    RelNext,
    /// `aria-label`
    AriaLabel,
    /// Exact short link text.
    Text,
    /// `title` attribute.
    Title,
    /// Class mentioning next/forward, optionally with text.
    NextClass,
    /// `data-*` attribute mentioning next/page.
    DataAttribute,
    /// Stable class plus text.
    ClassText,
    /// Positional path.
    Path,
}

/// A synthesized XPath locator for a "next page" control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XPathResult {
    /// XPath expression.
    pub xpath: String,
    /// Elements it matches (1 for every accepted strategy).
    pub match_count: usize,
    /// Strategy used.
    pub strategy: XPathStrategy,
}

/// One selector's contribution to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldExtractionResult {
    /// Selector as written in the registry or custom override.
    pub selector: String,
    /// Value from the first matching element.
    pub content: String,
    /// Non-empty values from every matching element.
    pub all_content: Vec<String>,
}

/// Winning value of a field: the first entry with non-empty content.
#[must_use]
pub fn field_winner(results: &[FieldExtractionResult]) -> &str {
    results
        .iter()
        .map(|r| r.content.as_str())
        .find(|c| !c.is_empty())
        .unwrap_or("")
}

/// Per-field selector results with every field key present.
#[must_use]
pub fn empty_selector_results() -> BTreeMap<FieldType, Vec<FieldExtractionResult>> {
    FieldType::ALL.iter().map(|f| (*f, Vec::new())).collect()
}

/// Description of the element a content extraction came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Lowercase tag name; `"#synthetic"` for joined paragraph sets.
    pub tag_name: String,
    /// `id` attribute, when present.
    pub id: Option<String>,
    /// Class list.
    pub classes: Vec<String>,
    /// Stable selector for the element, when it is a single real element.
    pub selector: Option<String>,
}

/// Main content taken from a DOM subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    /// Outer HTML of the chosen subtree.
    pub html: String,
    /// Markdown rendering.
    pub markdown: String,
    /// Plain text.
    pub text: String,
    /// Where it came from.
    pub element_info: Option<ElementInfo>,
}

/// An image referenced by extracted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image URL.
    pub src: String,
    /// Alt text.
    pub alt: String,
    /// Title attribute.
    pub title: String,
    /// Position across the whole extraction run.
    pub index: usize,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    /// Title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Markdown of the main content.
    pub article_content: String,
    /// Normalized Markdown.
    pub cleaned_content: String,
    /// Byline.
    pub author: String,
    /// Publication date as found on the page.
    pub publish_date: String,
    /// Free-form metadata, including pipeline diagnostics.
    pub metadata: BTreeMap<String, String>,
    /// Images referenced by the content.
    pub images: Vec<ImageInfo>,
    /// Per-field selector matches. Always has all four field keys.
    pub selector_results: BTreeMap<FieldType, Vec<FieldExtractionResult>>,
}

impl Default for ScrapedContent {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            article_content: String::new(),
            cleaned_content: String::new(),
            author: String::new(),
            publish_date: String::new(),
            metadata: BTreeMap::new(),
            images: Vec::new(),
            selector_results: empty_selector_results(),
        }
    }
}

impl ScrapedContent {
    /// Empty content for a URL.
    #[must_use]
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Selector results for one field.
    #[must_use]
    pub fn field_results(&self, field: FieldType) -> &[FieldExtractionResult] {
        self.selector_results.get(&field).map_or(&[], Vec::as_slice)
    }
}

/// Which candidate the quality evaluator preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// Selector-mode content.
    Selector,
    /// Readability content.
    Readability,
}

/// Scores of both candidates, 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    /// Score of the selector candidate.
    pub selector: f64,
    /// Score of the Readability candidate.
    pub readability: f64,
}

/// Outcome of comparing two Markdown candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityEvaluation {
    /// The preferred candidate's text.
    pub better_content: String,
    /// Which candidate that is.
    pub winner: ContentSource,
    /// Human-readable explanation.
    pub reason: String,
    /// Both scores.
    pub scores: QualityScores,
}

/// A link chosen for batch scraping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLink {
    /// Absolute URL.
    pub url: String,
    /// Anchor text.
    pub text: String,
}

impl SeedLink {
    /// Seed link from URL and text.
    #[must_use]
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// An outbound link found in a DOM subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    /// Absolute URL.
    pub url: String,
    /// Trimmed anchor text.
    pub text: String,
    /// Position among all anchors of the subtree.
    pub index: usize,
}

impl From<ExtractedLink> for SeedLink {
    fn from(link: ExtractedLink) -> Self {
        Self {
            url: link.url,
            text: link.text,
        }
    }
}

/// Result for one batch-scraped URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchScrapeResult {
    /// URL as given.
    pub url: String,
    /// Whether content was produced.
    pub success: bool,
    /// Page title, or the seed link text when none was found.
    pub title: String,
    /// Markdown content.
    pub content: String,
    /// Failure message of the last attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Extraction method that produced (or was attempted for) the content.
    pub method: ExtractionMode,
}

/// Live state of a batch job, re-emitted to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Links in the job.
    pub total: usize,
    /// Finished links; always equals `results.len()`.
    pub completed: usize,
    /// URL most recently started, cleared at the end of each chunk.
    pub current: Option<String>,
    /// Finished results in completion order.
    pub results: Vec<BatchScrapeResult>,
    /// Job start.
    pub start_time: DateTime<Utc>,
    /// Pause flag at emission time.
    pub is_paused: bool,
}

impl BatchProgress {
    /// Fresh progress for `total` links.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            current: None,
            results: Vec::new(),
            start_time: Utc::now(),
            is_paused: false,
        }
    }

    /// Append a finished result and keep `completed` in step.
    pub fn record(&mut self, result: BatchScrapeResult) {
        self.results.push(result);
        self.completed = self.results.len();
    }

    /// Time since the job started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }

    /// Completion percentage, 0-100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}
