//! Batch scrape controller.
//!
//! Links are processed in chunks of `concurrency`. A chunk's requests run
//! together and the whole chunk finishes before the next one starts, with
//! `delay_between_requests` between chunks. Pause and cancel are checked
//! between chunks only; requests already started always complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;

use crate::dom;
use crate::extractor::{extract_field, select_content};
use crate::logger::LogFacade;
use crate::markdown::{self, ImageAccumulator};
use crate::metadata::document_base;
use crate::options::{BatchScrapeOptions, ExtractionMode, ReadabilityConfig};
use crate::readability::{DomSmoothieBackend, ReadabilityBackend};
use crate::registry::{FieldType, SelectorRegistry};
use crate::result::{field_winner, BatchProgress, BatchScrapeResult, SeedLink};
use crate::text_cleaning::clean_content;
use crate::{Error, Result};

use super::fetcher::Fetcher;

/// Interval at which a paused job checks whether it may continue.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[allow(clippy::expect_used)]
static HEAD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid regex"));

/// Runs one batch job. Share it behind an `Arc` to pause, resume or cancel
/// from another task while [`execute`](Self::execute) runs.
pub struct BatchScrapeController {
    options: BatchScrapeOptions,
    fetcher: Arc<dyn Fetcher>,
    registry: SelectorRegistry,
    readability: Arc<dyn ReadabilityBackend>,
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl BatchScrapeController {
    /// Controller using the default registry and Readability backend.
    #[must_use]
    pub fn new(options: BatchScrapeOptions, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            options,
            fetcher,
            registry: SelectorRegistry::new(),
            readability: Arc::new(DomSmoothieBackend),
            paused: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Use `registry` for the selector fallback.
    #[must_use]
    pub fn with_registry(mut self, registry: SelectorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the Readability backend.
    #[must_use]
    pub fn with_readability_backend(mut self, backend: Arc<dyn ReadabilityBackend>) -> Self {
        self.readability = backend;
        self
    }

    /// Options of this job.
    #[must_use]
    pub fn options(&self) -> &BatchScrapeOptions {
        &self.options
    }

    /// Defer the next chunk until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        log::info!("batch paused");
    }

    /// Let a paused job continue.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        log::info!("batch resumed");
    }

    /// Start no further chunks.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        log::info!("batch cancelled");
    }

    /// Whether the job is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Whether the job was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Scrape `links`, reporting progress through `on_progress`.
    ///
    /// Progress is emitted once before the first chunk, when each link
    /// starts, when each link finishes, and when each chunk ends. The
    /// returned results are in link order; links never started because of
    /// cancellation are absent.
    pub async fn execute<F>(&self, links: &[SeedLink], on_progress: F) -> Vec<BatchScrapeResult>
    where
        F: Fn(&BatchProgress) + Send + Sync,
    {
        let progress = Mutex::new(BatchProgress::new(links.len()));
        let chunk_size = self.options.chunk_size();
        let chunk_count = links.len().div_ceil(chunk_size);
        let mut slots: Vec<Option<BatchScrapeResult>> = vec![None; links.len()];

        log::info!("batch of {} links in {chunk_count} chunks", links.len());
        self.emit(&progress, &on_progress);

        let indexed: Vec<(usize, &SeedLink)> = links.iter().enumerate().collect();
        for (chunk_no, chunk) in indexed.chunks(chunk_size).enumerate() {
            if self.is_cancelled() {
                log::info!("stopping before chunk {}/{chunk_count}", chunk_no + 1);
                break;
            }
            self.wait_while_paused().await;
            if self.is_cancelled() {
                log::info!("stopping before chunk {}/{chunk_count}", chunk_no + 1);
                break;
            }

            let jobs = chunk
                .iter()
                .map(|&(index, link)| self.scrape_link(index, link, &progress, &on_progress));
            for (index, result) in join_all(jobs).await {
                slots[index] = Some(result);
            }

            update(&progress, |p| p.current = None);
            self.emit(&progress, &on_progress);

            if chunk_no + 1 < chunk_count && !self.is_cancelled() {
                tokio::time::sleep(self.options.delay()).await;
            }
        }

        let results: Vec<BatchScrapeResult> = slots.into_iter().flatten().collect();
        let succeeded = results.iter().filter(|r| r.success).count();
        log::info!("batch finished: {succeeded}/{} succeeded", results.len());
        results
    }

    async fn wait_while_paused(&self) {
        while self.is_paused() && !self.is_cancelled() {
            tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
        }
    }

    async fn scrape_link<F>(
        &self,
        index: usize,
        link: &SeedLink,
        progress: &Mutex<BatchProgress>,
        on_progress: &F,
    ) -> (usize, BatchScrapeResult)
    where
        F: Fn(&BatchProgress) + Send + Sync,
    {
        update(progress, |p| p.current = Some(link.url.clone()));
        self.emit(progress, on_progress);

        let max_attempts = self.options.retry_count + 1;
        let mut attempt = 1;
        let result = loop {
            match self.attempt(link).await {
                Ok(result) => break result,
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    log::warn!("{} failed (attempt {attempt}/{max_attempts}): {e}", link.url);
                    attempt += 1;
                    tokio::time::sleep(self.options.delay()).await;
                }
                Err(e) => {
                    log::warn!("{} failed after {attempt} attempt(s): {e}", link.url);
                    break failed_result(link, &e);
                }
            }
        };

        update(progress, |p| p.record(result.clone()));
        self.emit(progress, on_progress);
        (index, result)
    }

    async fn attempt(&self, link: &SeedLink) -> Result<BatchScrapeResult> {
        let html = match tokio::time::timeout(self.options.timeout_duration(), self.fetcher.fetch(&link.url)).await {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(Error::Timeout {
                    after_ms: self.options.timeout,
                })
            }
        };
        self.convert(link, &html)
    }

    /// Turn a fetched page into a result. Readability first, then content
    /// selection when Readability finds nothing. Fails with
    /// `Error::NoContent` when both come up empty.
    fn convert(&self, link: &SeedLink, html: &str) -> Result<BatchScrapeResult> {
        let html = inject_base(html, &link.url);
        let doc = dom::parse(&html);
        let base = document_base(&doc, Some(&link.url));
        let mut images = ImageAccumulator::new();

        let outcome = self
            .readability
            .extract(&doc, &ReadabilityConfig::default(), Some(&link.url));
        if outcome.success {
            let content = clean_content(&markdown::html_to_markdown(&outcome.content, base.as_ref(), &mut images));
            if !content.is_empty() {
                return Ok(BatchScrapeResult {
                    url: link.url.clone(),
                    success: true,
                    title: title_or(&outcome.metadata.title, link),
                    content,
                    error: None,
                    method: ExtractionMode::Readability,
                });
            }
        }
        log::debug!("readability found nothing on {}, selecting content", link.url);

        let logger = LogFacade;
        let content = select_content(&doc, &self.registry, None, &logger)
            .map(|selection| clean_content(&markdown::nodes_to_markdown(&selection.nodes, base.as_ref(), &mut images)))
            .unwrap_or_default();
        if content.is_empty() {
            return Err(Error::NoContent);
        }

        let titles = extract_field(&doc, &self.registry, FieldType::Title, None, &logger);
        Ok(BatchScrapeResult {
            url: link.url.clone(),
            success: true,
            title: title_or(field_winner(&titles), link),
            content,
            error: None,
            method: ExtractionMode::Selector,
        })
    }

    fn emit<F>(&self, progress: &Mutex<BatchProgress>, on_progress: &F)
    where
        F: Fn(&BatchProgress),
    {
        let mut guard = progress.lock().unwrap_or_else(PoisonError::into_inner);
        guard.is_paused = self.is_paused();
        on_progress(&guard);
    }
}

fn update(progress: &Mutex<BatchProgress>, f: impl FnOnce(&mut BatchProgress)) {
    f(&mut progress.lock().unwrap_or_else(PoisonError::into_inner));
}

fn failed_result(link: &SeedLink, error: &Error) -> BatchScrapeResult {
    // An empty page went through content selection last.
    let method = if matches!(error, Error::NoContent) {
        ExtractionMode::Selector
    } else {
        ExtractionMode::Readability
    };
    BatchScrapeResult {
        url: link.url.clone(),
        success: false,
        title: link.text.clone(),
        content: String::new(),
        error: Some(error.to_string()),
        method,
    }
}

fn title_or(title: &str, link: &SeedLink) -> String {
    let title = title.trim();
    if title.is_empty() {
        link.text.clone()
    } else {
        title.to_string()
    }
}

/// Insert `<base href>` for `url` at the start of the head, so that relative
/// references resolve against the fetched page.
#[must_use]
pub fn inject_base(html: &str, url: &str) -> String {
    let tag = format!(r#"<base href="{}">"#, url.replace('&', "&amp;").replace('"', "&quot;"));
    match HEAD_OPEN_RE.find(html) {
        Some(head) => format!("{}{tag}{}", &html[..head.end()], &html[head.end()..]),
        None => format!("{tag}{html}"),
    }
}
