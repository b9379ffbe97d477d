//! Content quality arbitration between selector and Readability output.

use markscrape::evaluate_content_quality;
use markscrape::options::QualityConfig;
use markscrape::quality::score_content;
use markscrape::result::ContentSource;

fn structured_article() -> String {
    let paragraph = "This paragraph carries enough prose to count towards the score. ".repeat(4);
    format!(
        "# Heading one\n\n{paragraph}\n\n## Heading two\n\n{paragraph}\n\n### Heading three\n\n{paragraph}\n\n{paragraph}"
    )
}

#[test]
fn structured_markdown_beats_short_text() {
    let long = structured_article();
    let eval = evaluate_content_quality("short text", &long, &QualityConfig::default());

    assert_eq!(eval.winner, ContentSource::Readability);
    assert_eq!(eval.better_content, long);
    assert!(eval.scores.readability - eval.scores.selector > 10.0);
    assert!(eval.reason.starts_with("readability scored higher"));
}

#[test]
fn leaked_markup_loses_to_clean_markdown() {
    let clean = structured_article();
    let leaked = format!("<div class=\"wrap\"><span>{}</span></div>", "<b>x</b> ".repeat(200));
    let eval = evaluate_content_quality(&clean, &leaked, &QualityConfig::default());

    assert_eq!(eval.winner, ContentSource::Selector);
    assert_eq!(score_content(&leaked, &QualityConfig::default()).tag_density, 0.0);
}

#[test]
fn close_scores_fall_back_to_length() {
    let a = "A single paragraph of reasonable length.";
    let b = "A single paragraph of reasonable length, slightly longer.";

    let eval = evaluate_content_quality(a, b, &QualityConfig::default());
    assert_eq!(eval.winner, ContentSource::Readability);
    assert!(eval.reason.contains("longer"));

    let same = evaluate_content_quality(a, a, &QualityConfig::default());
    assert_eq!(same.winner, ContentSource::Selector);
}

#[test]
fn weights_load_from_settings_json() {
    let config: QualityConfig =
        serde_json::from_str(r#"{"headingWeight": 0, "lengthWeight": 80, "tieMargin": 0}"#).expect("valid json");
    assert_eq!(config.paragraph_weight, 20.0);

    let headings_only = "# A\n\n## B\n\n### C";
    let prose = "word ".repeat(250);
    let eval = evaluate_content_quality(headings_only, &prose, &config);
    assert_eq!(eval.winner, ContentSource::Readability);
}
