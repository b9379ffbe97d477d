//! Pipeline states, transitions and per-run context.
//!
//! ```text
//! ModeSelect ─┬─> Selector ──────────────┬─> Finalize ─> Success
//!             ├─> Readability ─┬─────────┤
//!             └─> Hybrid ──────┴─> Fallback
//! Selector and Fallback failures go to Failed.
//! ```

use std::fmt;

use url::Url;

use crate::options::{ExtractionMode, ExtractionOptions};
use crate::result::ScrapedContent;
use crate::Error;

/// One state of the extraction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Dispatch on the requested mode.
    ModeSelect,
    /// CSS-selector extraction.
    Selector,
    /// Readability extraction.
    Readability,
    /// Both, arbitrated by the quality evaluator.
    Hybrid,
    /// Selector extraction after a Readability or hybrid failure.
    Fallback,
    /// Cleaning and image backfill.
    Finalize,
    /// Terminal: content produced.
    Success,
    /// Terminal: every option exhausted.
    Failed,
}

impl PipelineState {
    /// Stage name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModeSelect => "modeSelect",
            Self::Selector => "selector",
            Self::Readability => "readability",
            Self::Hybrid => "hybrid",
            Self::Fallback => "fallback",
            Self::Finalize => "finalize",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Whether the machine stops here.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Transition table. `None` marks an event the state does not accept.
    #[must_use]
    pub fn next(self, event: PipelineEvent) -> Option<Self> {
        use PipelineEvent::{Dispatch, Failed, Succeeded};

        match (self, event) {
            (Self::ModeSelect, Dispatch(ExtractionMode::Selector)) => Some(Self::Selector),
            (Self::ModeSelect, Dispatch(ExtractionMode::Readability)) => Some(Self::Readability),
            (Self::ModeSelect, Dispatch(ExtractionMode::Hybrid)) => Some(Self::Hybrid),

            (Self::Selector | Self::Readability | Self::Hybrid | Self::Fallback, Succeeded) => Some(Self::Finalize),
            (Self::Selector | Self::Fallback, Failed) => Some(Self::Failed),
            (Self::Readability | Self::Hybrid, Failed) => Some(Self::Fallback),

            (Self::Finalize, Succeeded) => Some(Self::Success),
            (Self::Finalize, Failed) => Some(Self::Failed),

            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Leave `ModeSelect` for the given mode.
    Dispatch(ExtractionMode),
    /// The stage produced content.
    Succeeded,
    /// The stage failed; the error is in the context.
    Failed,
}

/// Mutable state of one pipeline run. Created per run and never shared.
#[derive(Debug)]
pub struct PipelineContext<'o> {
    /// Options of this run.
    pub options: &'o ExtractionOptions,
    /// Base for resolving relative URLs.
    pub base: Option<Url>,
    /// Content produced so far.
    pub content: Option<ScrapedContent>,
    /// Most recent stage failure.
    pub last_error: Option<Error>,
    /// States visited, in order.
    pub trace: Vec<PipelineState>,
}

impl<'o> PipelineContext<'o> {
    /// Fresh context for one run.
    #[must_use]
    pub fn new(options: &'o ExtractionOptions, base: Option<Url>) -> Self {
        Self {
            options,
            base,
            content: None,
            last_error: None,
            trace: Vec::new(),
        }
    }

    /// Page URL as given in the options.
    #[must_use]
    pub fn url(&self) -> &str {
        self.options.url.as_deref().unwrap_or_default()
    }

    /// Human-readable description of the last failure.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(|| "unknown error".to_string(), ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_dispatch() {
        for (mode, state) in [
            (ExtractionMode::Selector, PipelineState::Selector),
            (ExtractionMode::Readability, PipelineState::Readability),
            (ExtractionMode::Hybrid, PipelineState::Hybrid),
        ] {
            assert_eq!(PipelineState::ModeSelect.next(PipelineEvent::Dispatch(mode)), Some(state));
        }
    }

    #[test]
    fn test_selector_cannot_fall_back() {
        assert_eq!(PipelineState::Selector.next(PipelineEvent::Failed), Some(PipelineState::Failed));
        assert_eq!(PipelineState::Fallback.next(PipelineEvent::Failed), Some(PipelineState::Failed));
    }

    #[test]
    fn test_readability_and_hybrid_fall_back() {
        assert_eq!(PipelineState::Readability.next(PipelineEvent::Failed), Some(PipelineState::Fallback));
        assert_eq!(PipelineState::Hybrid.next(PipelineEvent::Failed), Some(PipelineState::Fallback));
        assert_eq!(PipelineState::Fallback.next(PipelineEvent::Succeeded), Some(PipelineState::Finalize));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for state in [PipelineState::Success, PipelineState::Failed] {
            assert!(state.is_terminal());
            assert_eq!(state.next(PipelineEvent::Succeeded), None);
            assert_eq!(state.next(PipelineEvent::Failed), None);
        }
        assert_eq!(PipelineState::Selector.next(PipelineEvent::Dispatch(ExtractionMode::Hybrid)), None);
    }

    #[test]
    fn test_context_failure_reason() {
        let options = ExtractionOptions::default();
        let mut ctx = PipelineContext::new(&options, None);
        assert_eq!(ctx.failure_reason(), "unknown error");
        ctx.last_error = Some(Error::NoContent);
        assert_eq!(ctx.failure_reason(), "no extractable content found");
        assert_eq!(ctx.url(), "");
    }
}
