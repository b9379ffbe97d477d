//! The three extraction strategies.
//!
//! Each builds a complete `ScrapedContent` from a document. They are free
//! functions over their inputs, so the pipeline can rerun them freely.

use url::Url;

use crate::dom::{self, Document};
use crate::logger::Logger;
use crate::markdown::{self, ImageAccumulator};
use crate::metadata::{self, keys};
use crate::options::{ExtractionMode, ExtractionOptions, QualityConfig};
use crate::quality::evaluate_content_quality;
use crate::readability::ReadabilityBackend;
use crate::registry::{FieldType, SelectorRegistry};
use crate::result::{empty_selector_results, field_winner, ContentSource, ScrapedContent};
use crate::{Error, Result};

use super::content::extract_content;
use super::fields::extract_field;

/// Selector-mode extraction: registry or custom selectors for every field.
///
/// Fails with `Error::NoContent` when no content could be selected.
pub fn scrape_with_selectors(
    doc: &Document,
    registry: &SelectorRegistry,
    options: &ExtractionOptions,
    base: Option<&Url>,
    logger: &dyn Logger,
) -> Result<ScrapedContent> {
    let mut images = ImageAccumulator::new();
    let mut selector_results = empty_selector_results();

    for field in [FieldType::Title, FieldType::Author, FieldType::Date] {
        let results = extract_field(doc, registry, field, options.custom_selector(field), logger);
        selector_results.insert(field, results);
    }

    let (content, content_results) = extract_content(
        doc,
        registry,
        options.custom_selector(FieldType::Content),
        base,
        &mut images,
        logger,
    );
    selector_results.insert(FieldType::Content, content_results);

    if content.markdown.trim().is_empty() {
        return Err(Error::NoContent);
    }

    let winner = |field: FieldType| field_winner(selector_results.get(&field).map_or(&[], Vec::as_slice)).to_string();

    let mut meta = metadata::page_metadata(doc, base);
    meta.insert(keys::EXTRACTION_MODE.to_string(), ExtractionMode::Selector.as_str().to_string());

    Ok(ScrapedContent {
        title: winner(FieldType::Title),
        url: page_url(options, base),
        article_content: content.markdown,
        cleaned_content: String::new(),
        author: winner(FieldType::Author),
        publish_date: winner(FieldType::Date),
        metadata: meta,
        images: images.into_images(),
        selector_results,
    })
}

/// Readability-mode extraction.
///
/// Fails with `Error::Readability` when the backend reports failure or its
/// content renders to empty Markdown.
pub fn scrape_with_readability(
    doc: &Document,
    backend: &dyn ReadabilityBackend,
    options: &ExtractionOptions,
    base: Option<&Url>,
    logger: &dyn Logger,
) -> Result<ScrapedContent> {
    let config = options.readability_config.clone().unwrap_or_default();
    let url = page_url(options, base);
    let outcome = backend.extract(doc, &config, (!url.is_empty()).then_some(url.as_str()));

    if !outcome.success {
        let reason = outcome.error.unwrap_or_else(|| "no content".to_string());
        return Err(Error::Readability(reason));
    }

    let mut images = ImageAccumulator::new();
    let markdown = markdown::html_to_markdown(&outcome.content, base, &mut images);
    if markdown.trim().is_empty() {
        return Err(Error::Readability("content rendered to empty markdown".to_string()));
    }
    logger.debug("readability", &format!("{} chars of markdown", markdown.len()));

    let article = outcome.metadata;
    let title = if article.title.is_empty() {
        dom::normalized_text_of(&doc.select("title"))
    } else {
        article.title
    };

    let mut meta = metadata::page_metadata(doc, base);
    for (key, value) in [
        (keys::DESCRIPTION, article.excerpt),
        (keys::SITE_NAME, article.site_name),
        (keys::LANG, article.lang),
    ] {
        if !value.is_empty() {
            meta.entry(key.to_string()).or_insert(value);
        }
    }
    meta.insert(keys::EXTRACTION_MODE.to_string(), ExtractionMode::Readability.as_str().to_string());

    Ok(ScrapedContent {
        title,
        url,
        article_content: markdown,
        cleaned_content: String::new(),
        author: article.byline,
        publish_date: article.published_time,
        metadata: meta,
        images: images.into_images(),
        selector_results: empty_selector_results(),
    })
}

/// Combine a selector pass and a Readability pass.
///
/// Content is the quality evaluator's pick. Title, author and date follow the
/// winning source (Readability also when the selector pass found no title).
/// Selector results and images always come from the selector pass.
#[must_use]
pub fn merge_hybrid(selector: ScrapedContent, readability: ScrapedContent, quality: &QualityConfig) -> ScrapedContent {
    let evaluation = evaluate_content_quality(&selector.article_content, &readability.article_content, quality);
    let use_readability_fields = evaluation.winner == ContentSource::Readability || selector.title.is_empty();

    let mut merged = selector;
    merged.article_content = evaluation.better_content;

    if use_readability_fields {
        let prefer = |primary: String, fallback: String| if primary.is_empty() { fallback } else { primary };
        merged.title = prefer(readability.title, std::mem::take(&mut merged.title));
        merged.author = prefer(readability.author, std::mem::take(&mut merged.author));
        merged.publish_date = prefer(readability.publish_date, std::mem::take(&mut merged.publish_date));
    }

    for (key, value) in readability.metadata {
        merged.metadata.entry(key).or_insert(value);
    }
    merged.metadata.insert(keys::EXTRACTION_MODE.to_string(), ExtractionMode::Hybrid.as_str().to_string());
    merged.metadata.insert(keys::QUALITY_REASON.to_string(), evaluation.reason);
    merged
        .metadata
        .insert(keys::QUALITY_SELECTOR.to_string(), format!("{:.1}", evaluation.scores.selector));
    merged
        .metadata
        .insert(keys::QUALITY_READABILITY.to_string(), format!("{:.1}", evaluation.scores.readability));
    merged
}

fn page_url(options: &ExtractionOptions, base: Option<&Url>) -> String {
    options
        .url
        .clone()
        .or_else(|| base.map(ToString::to_string))
        .unwrap_or_default()
}
