//! Configuration options for extraction, selector synthesis and batch scraping.
//!
//! Every struct here deserializes from the camelCase JSON a settings screen
//! would persist, and `Default` carries the tuned constants. The quality
//! weights and the dynamic-value thresholds are empirical; they are exposed as
//! plain fields so callers can tune them without code changes.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::FieldType;
use crate::{Error, Result};

/// Which extraction strategy the pipeline runs first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Registry/custom CSS selectors only. This is also the fallback target.
    Selector,
    /// Heuristic main-content detection.
    Readability,
    /// Run both and keep the higher-quality content.
    #[default]
    Hybrid,
}

impl ExtractionMode {
    /// Lowercase name used in metadata values.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::Readability => "readability",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for the Readability adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadabilityConfig {
    /// Minimum text length a candidate needs. Zero keeps short documents.
    ///
    /// Default: `0`
    pub char_threshold: usize,

    /// Number of top-scoring candidates compared when picking the article root.
    ///
    /// Default: `5`
    pub n_top_candidates: usize,

    /// Give `article`, `section`, `main` and heading-led containers a positive
    /// content hint before scoring, so well-structured pages win over div soup.
    ///
    /// Default: `true`
    pub boost_structural_tags: bool,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            char_threshold: 0,
            n_top_candidates: 5,
            boost_structural_tags: true,
        }
    }
}

/// Weights and thresholds of the content quality evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QualityConfig {
    /// Points for content length.
    pub length_weight: f64,
    /// Points for paragraph count.
    pub paragraph_weight: f64,
    /// Points for Markdown heading count.
    pub heading_weight: f64,
    /// Points for a low density of raw HTML tags.
    pub tag_density_weight: f64,
    /// Length tiers in characters, highest first. Reaching tier `i` awards
    /// `length_weight * (4 - i) / 4`.
    pub length_thresholds: [usize; 3],
    /// A blank-line-separated chunk must exceed this many characters to count
    /// as a paragraph.
    pub min_paragraph_chars: usize,
    /// Paragraph count at which the paragraph score saturates.
    pub paragraph_target: usize,
    /// Heading count at which the heading score saturates.
    pub heading_target: usize,
    /// Tags per 100 characters at which the density score reaches zero.
    pub max_tag_density: f64,
    /// Score differences at or below this margin are decided by length.
    pub tie_margin: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            length_weight: 40.0,
            paragraph_weight: 20.0,
            heading_weight: 20.0,
            tag_density_weight: 20.0,
            length_thresholds: [1000, 500, 200],
            min_paragraph_chars: 20,
            paragraph_target: 5,
            heading_target: 4,
            max_tag_density: 5.0,
            tie_margin: 10.0,
        }
    }
}

/// Options of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionOptions {
    /// Strategy to start with.
    pub mode: ExtractionMode,

    /// Per-field selector that replaces the registry list for that field.
    pub custom_selectors: Option<HashMap<FieldType, String>>,

    /// Readability adapter settings; `None` uses the defaults.
    pub readability_config: Option<ReadabilityConfig>,

    /// Quality evaluator settings used by hybrid mode.
    pub quality: QualityConfig,

    /// URL of the page, used for `ScrapedContent::url` and link resolution
    /// when the document has no `<base href>`.
    pub url: Option<String>,
}

impl ExtractionOptions {
    /// Options for the given mode with everything else defaulted.
    #[must_use]
    pub fn with_mode(mode: ExtractionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Parse options from settings JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Custom selector for a field, ignoring blank entries.
    #[must_use]
    pub fn custom_selector(&self, field: FieldType) -> Option<&str> {
        self.custom_selectors
            .as_ref()
            .and_then(|m| m.get(&field))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Options for the stable selector generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorOptions {
    /// Accept selectors that match several elements (list items, cards).
    ///
    /// Default: `false`
    pub allow_multiple: bool,

    /// How many ancestors the parent-limited strategy may climb.
    ///
    /// Default: `3`
    pub max_ancestor_depth: usize,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            allow_multiple: false,
            max_ancestor_depth: 3,
        }
    }
}

/// Thresholds of the "looks generated" heuristic for ids, classes and
/// attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DynamicValueRules {
    /// Pure hex strings at least this long are generated.
    ///
    /// Default: `8`
    pub min_hex_len: usize,

    /// Pure digit strings at least this long are generated.
    ///
    /// Default: `6`
    pub min_numeric_len: usize,

    /// Hex strings must also contain a digit to count (`deadbeef` does not).
    ///
    /// Default: `true`
    pub hex_requires_digit: bool,

    /// Also flag values that merely contain a digit run of
    /// `min_numeric_len` or more (`post-123456`), not only all-digit values.
    ///
    /// Default: `true`
    pub embedded_numeric_runs: bool,
}

impl Default for DynamicValueRules {
    fn default() -> Self {
        Self {
            min_hex_len: 8,
            min_numeric_len: 6,
            hex_requires_digit: true,
            embedded_numeric_runs: true,
        }
    }
}

/// Options of one batch scrape job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchScrapeOptions {
    /// Links fetched per chunk.
    ///
    /// Default: `3`
    pub concurrency: usize,

    /// Per-request timeout in milliseconds.
    ///
    /// Default: `30000`
    pub timeout: u64,

    /// Additional attempts after a failed one.
    ///
    /// Default: `2`
    pub retry_count: usize,

    /// Pause between chunks and between retry attempts, in milliseconds.
    ///
    /// Default: `1000`
    pub delay_between_requests: u64,
}

impl Default for BatchScrapeOptions {
    fn default() -> Self {
        Self {
            concurrency: 3,
            timeout: 30_000,
            retry_count: 2,
            delay_between_requests: 1000,
        }
    }
}

impl BatchScrapeOptions {
    /// Parse options from settings JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Inter-chunk and inter-attempt delay as a `Duration`.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests)
    }

    /// Chunk size, never zero.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Filters applied by the link extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkFilterOptions {
    /// Keep only links on the base URL's host.
    ///
    /// Default: `false`
    pub same_domain_only: bool,

    /// Drop in-page `#anchor` links.
    ///
    /// Default: `true`
    pub exclude_anchors: bool,

    /// Drop `javascript:` pseudo-links.
    ///
    /// Default: `true`
    #[serde(rename = "excludeJavaScript")]
    pub exclude_javascript: bool,

    /// Drop links whose URL contains any of these substrings.
    ///
    /// Default: empty
    pub exclude_patterns: Vec<String>,
}

impl Default for LinkFilterOptions {
    fn default() -> Self {
        Self {
            same_domain_only: false,
            exclude_anchors: true,
            exclude_javascript: true,
            exclude_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quality_weights_sum_to_hundred() {
        let q = QualityConfig::default();
        let total = q.length_weight + q.paragraph_weight + q.heading_weight + q.tag_density_weight;
        assert!((total - 100.0).abs() < f64::EPSILON);
        assert_eq!(q.length_thresholds, [1000, 500, 200]);
        assert!((q.tie_margin - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extraction_options_from_json() {
        let opts = ExtractionOptions::from_json(
            r#"{"mode":"readability","customSelectors":{"title":"h1.headline"}}"#,
        )
        .unwrap();

        assert_eq!(opts.mode, ExtractionMode::Readability);
        assert_eq!(opts.custom_selector(FieldType::Title), Some("h1.headline"));
        assert_eq!(opts.custom_selector(FieldType::Author), None);
        assert!(opts.readability_config.is_none());
    }

    #[test]
    fn test_blank_custom_selector_is_ignored() {
        let mut map = HashMap::new();
        map.insert(FieldType::Content, "   ".to_string());
        let opts = ExtractionOptions {
            custom_selectors: Some(map),
            ..ExtractionOptions::default()
        };
        assert_eq!(opts.custom_selector(FieldType::Content), None);
    }

    #[test]
    fn test_batch_options_from_json_partial() {
        let opts = BatchScrapeOptions::from_json(r#"{"concurrency":5,"retryCount":0}"#).unwrap();
        assert_eq!(opts.concurrency, 5);
        assert_eq!(opts.retry_count, 0);
        assert_eq!(opts.timeout, 30_000);
        assert_eq!(opts.delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_batch_chunk_size_never_zero() {
        let opts = BatchScrapeOptions {
            concurrency: 0,
            ..BatchScrapeOptions::default()
        };
        assert_eq!(opts.chunk_size(), 1);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ExtractionOptions::from_json("{mode:").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_link_filter_javascript_key() {
        let opts: LinkFilterOptions =
            serde_json::from_str(r#"{"excludeJavaScript":false,"sameDomainOnly":true}"#).unwrap();
        assert!(!opts.exclude_javascript);
        assert!(opts.same_domain_only);
        assert!(opts.exclude_anchors);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ExtractionMode::Hybrid.to_string(), "hybrid");
        assert_eq!(ExtractionMode::default(), ExtractionMode::Hybrid);
    }
}
