//! Adaptive content extraction.
//!
//! # Module Structure
//!
//! - `fields`: title, author and date from selector lists
//! - `content`: main content selection and Markdown conversion
//! - `modes`: selector, Readability and hybrid strategies
//! - `state`: pipeline states, transition table and run context
//! - `fallback`: selector rerun after a Readability or hybrid failure
//! - `finalize`: cleaning and image backfill
//! - `instrument`: start/done/error logging around stages
//! - `pipeline`: the state machine driver
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use markscrape::dom;
//! use markscrape::extractor::ExtractionPipeline;
//! use markscrape::logger::LogFacade;
//! use markscrape::options::{ExtractionMode, ExtractionOptions};
//! use markscrape::registry::SelectorRegistry;
//!
//! let pipeline = ExtractionPipeline::new(SelectorRegistry::new(), Arc::new(LogFacade));
//! let doc = dom::parse("<main><h1>Hello</h1><p>World</p></main>");
//! let outcome = pipeline.run(&doc, &ExtractionOptions::with_mode(ExtractionMode::Selector));
//! assert_eq!(outcome.content.title, "Hello");
//! ```

pub mod content;
pub mod fallback;
pub mod fields;
pub mod finalize;
pub mod instrument;
pub mod modes;
pub mod pipeline;
pub mod state;

pub use content::{extract_content, select_content, ContentSelection};
pub use fields::extract_field;
pub use pipeline::{ExtractionPipeline, PipelineOutcome, PipelineStatus};
pub use state::{PipelineContext, PipelineEvent, PipelineState};
