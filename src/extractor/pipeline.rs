//! Extraction pipeline.
//!
//! Drives the state machine in [`super::state`]: dispatch on the requested
//! mode, run the stage, fall back to selectors when Readability or hybrid
//! fails, finalize. Every stage runs through [`super::instrument::wrap`].
//!
//! The pipeline holds only read-only collaborators; all per-run state lives
//! in a `PipelineContext`, so one pipeline can serve concurrent runs.

use std::sync::Arc;

use serde::Serialize;

use crate::dom::Document;
use crate::logger::{LogFacade, Logger};
use crate::metadata::{document_base, keys};
use crate::options::ExtractionOptions;
use crate::readability::{DomSmoothieBackend, ReadabilityBackend};
use crate::registry::SelectorRegistry;
use crate::result::ScrapedContent;
use crate::{Error, Result};

use super::fallback::fall_back_to_selectors;
use super::finalize::finalize;
use super::instrument;
use super::modes::{merge_hybrid, scrape_with_readability, scrape_with_selectors};
use super::state::{PipelineContext, PipelineEvent, PipelineState};

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Content was produced.
    Success,
    /// Every strategy failed; content is empty apart from metadata.
    Failed,
}

/// Result of one run. Always carries finalized content.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Terminal status.
    pub status: PipelineStatus,
    /// Finalized content; on failure `metadata["pipeline:error"]` says why.
    pub content: ScrapedContent,
    /// States visited, ending with the terminal one.
    pub trace: Vec<PipelineState>,
}

impl PipelineOutcome {
    /// Whether the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

/// Adaptive extraction over selector, Readability and hybrid strategies.
#[derive(Clone)]
pub struct ExtractionPipeline {
    registry: SelectorRegistry,
    logger: Arc<dyn Logger>,
    readability: Arc<dyn ReadabilityBackend>,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(SelectorRegistry::new(), Arc::new(LogFacade))
    }
}

impl ExtractionPipeline {
    /// Pipeline with the given selector registry and logger, using the
    /// `dom_smoothie` Readability backend.
    #[must_use]
    pub fn new(registry: SelectorRegistry, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            logger,
            readability: Arc::new(DomSmoothieBackend),
        }
    }

    /// Replace the Readability backend.
    #[must_use]
    pub fn with_readability_backend(mut self, backend: Arc<dyn ReadabilityBackend>) -> Self {
        self.readability = backend;
        self
    }

    /// Selector registry in use.
    #[must_use]
    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Run the state machine on `doc`. Never fails; see [`PipelineOutcome`].
    #[must_use]
    pub fn run(&self, doc: &Document, options: &ExtractionOptions) -> PipelineOutcome {
        let base = document_base(doc, options.url.as_deref());
        let mut ctx = PipelineContext::new(options, base);
        let mut state = PipelineState::ModeSelect;

        while !state.is_terminal() {
            ctx.trace.push(state);
            let event = self.step(state, doc, &mut ctx);
            state = match state.next(event) {
                Some(next) => next,
                None => {
                    ctx.last_error = Some(Error::Pipeline(format!("{state} cannot handle {event:?}")));
                    PipelineState::Failed
                }
            };
        }
        ctx.trace.push(state);

        match (state, ctx.content.take()) {
            (PipelineState::Success, Some(content)) => {
                self.logger.info("pipeline", &format!("finished via {}", trace_summary(&ctx.trace)));
                PipelineOutcome {
                    status: PipelineStatus::Success,
                    content,
                    trace: ctx.trace,
                }
            }
            _ => self.failed(ctx),
        }
    }

    fn step(&self, state: PipelineState, doc: &Document, ctx: &mut PipelineContext) -> PipelineEvent {
        let logger = self.logger.as_ref();
        let result = match state {
            PipelineState::ModeSelect => return PipelineEvent::Dispatch(ctx.options.mode),
            PipelineState::Finalize => {
                let finalized = instrument::wrap(logger, state.as_str(), || match ctx.content.as_mut() {
                    Some(content) => {
                        finalize(content);
                        Ok(())
                    }
                    None => Err(Error::NoContent),
                })();
                return match finalized {
                    Ok(()) => PipelineEvent::Succeeded,
                    Err(e) => {
                        ctx.last_error = Some(e);
                        PipelineEvent::Failed
                    }
                };
            }
            PipelineState::Success | PipelineState::Failed => return PipelineEvent::Failed,
            PipelineState::Selector => {
                let ctx = &*ctx;
                instrument::wrap(logger, state.as_str(), || {
                    scrape_with_selectors(doc, &self.registry, ctx.options, ctx.base.as_ref(), logger)
                })()
            }
            PipelineState::Readability => {
                let ctx = &*ctx;
                instrument::wrap(logger, state.as_str(), || {
                    scrape_with_readability(doc, self.readability.as_ref(), ctx.options, ctx.base.as_ref(), logger)
                })()
            }
            PipelineState::Hybrid => {
                let ctx = &*ctx;
                instrument::wrap(logger, state.as_str(), || self.hybrid(doc, ctx))()
            }
            PipelineState::Fallback => {
                let ctx = &*ctx;
                instrument::wrap(logger, state.as_str(), || {
                    fall_back_to_selectors(
                        doc,
                        &self.registry,
                        ctx.options,
                        ctx.base.as_ref(),
                        ctx.last_error.as_ref(),
                        logger,
                    )
                })()
            }
        };

        match result {
            Ok(content) => {
                ctx.content = Some(content);
                PipelineEvent::Succeeded
            }
            Err(e) => {
                ctx.last_error = Some(e);
                PipelineEvent::Failed
            }
        }
    }

    fn hybrid(&self, doc: &Document, ctx: &PipelineContext) -> Result<ScrapedContent> {
        let logger = self.logger.as_ref();
        let base = ctx.base.as_ref();

        let selector = scrape_with_selectors(doc, &self.registry, ctx.options, base, logger).unwrap_or_else(|e| {
            logger.debug("hybrid", &format!("selector pass empty: {e}"));
            ScrapedContent::empty(ctx.url())
        });
        let readability = scrape_with_readability(doc, self.readability.as_ref(), ctx.options, base, logger)?;

        Ok(merge_hybrid(selector, readability, &ctx.options.quality))
    }

    fn failed(&self, ctx: PipelineContext) -> PipelineOutcome {
        let reason = ctx.failure_reason();
        self.logger.error("pipeline", &format!("extraction failed: {reason}"));

        let mut content = ScrapedContent::empty(ctx.url());
        content.metadata.insert(keys::PIPELINE_ERROR.to_string(), reason);
        if ctx.trace.contains(&PipelineState::Fallback) {
            content
                .metadata
                .insert(keys::ORIGINAL_MODE.to_string(), ctx.options.mode.as_str().to_string());
        }
        finalize(&mut content);

        PipelineOutcome {
            status: PipelineStatus::Failed,
            content,
            trace: ctx.trace,
        }
    }
}

fn trace_summary(trace: &[PipelineState]) -> String {
    trace.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" -> ")
}
