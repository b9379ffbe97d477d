//! Finalize stage: runs on every successful path and on total failure.

use crate::metadata::{keys, parse_meta_date};
use crate::result::{empty_selector_results, ScrapedContent};
use crate::text_cleaning::{clean_content, extract_images_from_markdown};

/// Recompute `cleaned_content`, backfill `images` from Markdown when empty,
/// restore missing selector-result keys and normalize the publish date.
pub fn finalize(content: &mut ScrapedContent) {
    content.cleaned_content = clean_content(&content.article_content);

    if content.images.is_empty() {
        content.images = extract_images_from_markdown(&content.article_content);
    }

    for (field, results) in empty_selector_results() {
        content.selector_results.entry(field).or_insert(results);
    }

    if let Some(date) = parse_meta_date(&content.publish_date) {
        content
            .metadata
            .insert(keys::DATE_ISO.to_string(), date.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldType;

    #[test]
    fn test_finalize_cleans_and_backfills() {
        let mut content = ScrapedContent {
            article_content: "# Title\n\n\n\nText  here !\n\n![a](/a.png)".to_string(),
            publish_date: "2024-05-06".to_string(),
            ..ScrapedContent::default()
        };
        content.selector_results.remove(&FieldType::Date);

        finalize(&mut content);

        assert_eq!(content.cleaned_content, "# Title\n\nText here!\n\n![a](/a.png)");
        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].src, "/a.png");
        assert!(content.selector_results.contains_key(&FieldType::Date));
        assert_eq!(content.metadata.get(keys::DATE_ISO).map(String::as_str), Some("2024-05-06T00:00:00+00:00"));
    }

    #[test]
    fn test_existing_images_are_kept() {
        let mut content = ScrapedContent {
            article_content: "![a](/a.png) ![b](/b.png)".to_string(),
            ..ScrapedContent::default()
        };
        content.images.push(crate::result::ImageInfo {
            src: "/only.png".to_string(),
            ..Default::default()
        });
        finalize(&mut content);
        assert_eq!(content.images.len(), 1);
    }
}
