//! Content quality evaluation.
//!
//! Scores two Markdown candidates on four independent signals and picks the
//! better one:
//!
//! | Signal      | Default points | Measure                                    |
//! |-------------|----------------|--------------------------------------------|
//! | Length      | 40             | character count against 1000/500/200 tiers |
//! | Paragraphs  | 20             | blank-line separated chunks over 20 chars  |
//! | Headings    | 20             | lines starting with `#` to `######`        |
//! | Tag density | 20             | fewer raw HTML tags per 100 chars is better |
//!
//! Weights, tiers and the tie margin come from [`QualityConfig`].

use std::sync::LazyLock;

use regex::Regex;

use crate::options::QualityConfig;
use crate::result::{ContentSource, QualityEvaluation, QualityScores};

#[allow(clippy::expect_used)]
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{1,6}\s+\S").expect("valid regex")
});

/// Raw tags, optionally preceded by an escaping backslash.
#[allow(clippy::expect_used)]
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\?</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid regex")
});

/// Score breakdown of one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityBreakdown {
    /// Length points.
    pub length: f64,
    /// Paragraph points.
    pub paragraphs: f64,
    /// Heading points.
    pub headings: f64,
    /// Tag density points.
    pub tag_density: f64,
}

impl QualityBreakdown {
    /// Sum of all signals, 0-100 with default weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.length + self.paragraphs + self.headings + self.tag_density
    }
}

/// Score one Markdown candidate. Empty content scores zero on every signal.
#[must_use]
pub fn score_content(content: &str, config: &QualityConfig) -> QualityBreakdown {
    let content = content.trim();
    if content.is_empty() {
        return QualityBreakdown::default();
    }
    let chars = content.chars().count();

    let tier = config
        .length_thresholds
        .iter()
        .position(|&threshold| chars >= threshold)
        .unwrap_or(config.length_thresholds.len());
    let length = config.length_weight * (4 - tier) as f64 / 4.0;

    let paragraphs = content
        .split("\n\n")
        .filter(|chunk| chunk.trim().chars().count() > config.min_paragraph_chars)
        .count();
    let paragraphs = config.paragraph_weight * saturate(paragraphs, config.paragraph_target);

    let headings = HEADING_RE.find_iter(content).count();
    let headings = config.heading_weight * saturate(headings, config.heading_target);

    let tags = HTML_TAG_RE
        .find_iter(content)
        .filter(|m| !m.as_str().starts_with('\\'))
        .count();
    let density = tags as f64 * 100.0 / chars as f64;
    let tag_density = if config.max_tag_density > 0.0 {
        config.tag_density_weight * (1.0 - density / config.max_tag_density).max(0.0)
    } else {
        0.0
    };

    QualityBreakdown {
        length,
        paragraphs,
        headings,
        tag_density,
    }
}

fn saturate(count: usize, target: usize) -> f64 {
    if target == 0 {
        return 1.0;
    }
    (count as f64 / target as f64).min(1.0)
}

/// Compare the selector and Readability candidates.
///
/// A score lead above `config.tie_margin` wins outright; otherwise the longer
/// text wins, and equal lengths keep the selector candidate.
#[must_use]
pub fn evaluate_content_quality(selector: &str, readability: &str, config: &QualityConfig) -> QualityEvaluation {
    let selector_score = score_content(selector, config).total();
    let readability_score = score_content(readability, config).total();
    let diff = readability_score - selector_score;

    let (winner, reason) = if diff.abs() > config.tie_margin {
        if diff > 0.0 {
            (
                ContentSource::Readability,
                format!("readability scored higher ({readability_score:.1} vs {selector_score:.1})"),
            )
        } else {
            (
                ContentSource::Selector,
                format!("selector scored higher ({selector_score:.1} vs {readability_score:.1})"),
            )
        }
    } else {
        let selector_len = selector.trim().chars().count();
        let readability_len = readability.trim().chars().count();
        if readability_len > selector_len {
            (
                ContentSource::Readability,
                format!(
                    "scores within {:.0} points ({readability_score:.1} vs {selector_score:.1}); readability content is longer ({readability_len} vs {selector_len} chars)",
                    config.tie_margin
                ),
            )
        } else {
            (
                ContentSource::Selector,
                format!(
                    "scores within {:.0} points ({selector_score:.1} vs {readability_score:.1}); selector content is at least as long ({selector_len} vs {readability_len} chars)",
                    config.tie_margin
                ),
            )
        }
    };

    let better_content = match winner {
        ContentSource::Selector => selector,
        ContentSource::Readability => readability,
    };

    QualityEvaluation {
        better_content: better_content.to_string(),
        winner,
        reason,
        scores: QualityScores {
            selector: selector_score,
            readability: readability_score,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QualityConfig {
        QualityConfig::default()
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(score_content("   ", &config()).total(), 0.0);
    }

    #[test]
    fn test_length_tiers() {
        let cfg = config();
        assert_eq!(score_content(&"a".repeat(1000), &cfg).length, 40.0);
        assert_eq!(score_content(&"a".repeat(500), &cfg).length, 30.0);
        assert_eq!(score_content(&"a".repeat(200), &cfg).length, 20.0);
        assert_eq!(score_content("a", &cfg).length, 10.0);
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = "# One\n\nA paragraph that is long enough.\n\n## Two\n\nAnother paragraph long enough.\n\n#not a heading";
        let score = score_content(md, &config());
        assert_eq!(score.headings, 10.0);
        assert_eq!(score.paragraphs, 8.0);
    }

    #[test]
    fn test_tag_density_penalty() {
        let clean = score_content("Plain text without tags at all here.", &config());
        let tagged = score_content("<div><span>x</span></div>", &config());
        let escaped = score_content(r"Use \<div\> to wrap things in markup.", &config());
        assert_eq!(clean.tag_density, 20.0);
        assert_eq!(tagged.tag_density, 0.0);
        assert_eq!(escaped.tag_density, 20.0);
    }

    #[test]
    fn test_tie_prefers_longer() {
        let eval = evaluate_content_quality("short", "a bit longer", &config());
        assert_eq!(eval.winner, ContentSource::Readability);
        assert!(eval.reason.contains("longer"));
    }

    #[test]
    fn test_custom_weights() {
        let cfg = QualityConfig {
            tie_margin: 0.0,
            length_weight: 0.0,
            ..QualityConfig::default()
        };
        let eval = evaluate_content_quality("# A\n\n# B", "plain words only", &cfg);
        assert_eq!(eval.winner, ContentSource::Selector);
        assert!(!eval.reason.is_empty());
    }
}
