//! Batch scraping of linked pages.
//!
//! - `fetcher`: the [`Fetcher`] seam and its `reqwest` implementation
//! - `controller`: chunked, pausable, cancellable, retrying job runner
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use markscrape::batch::{BatchScrapeController, ReqwestFetcher};
//! use markscrape::options::BatchScrapeOptions;
//! use markscrape::result::SeedLink;
//!
//! # async fn run() -> markscrape::Result<()> {
//! let controller = BatchScrapeController::new(BatchScrapeOptions::default(), Arc::new(ReqwestFetcher::new()?));
//! let links = vec![SeedLink::new("https://example.com/", "Example")];
//! let results = controller
//!     .execute(&links, |p| println!("{}/{}", p.completed, p.total))
//!     .await;
//! assert_eq!(results.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod fetcher;

pub use controller::{inject_base, BatchScrapeController, PAUSE_POLL_INTERVAL};
pub use fetcher::{Fetcher, ReqwestFetcher, ACCEPT_HTML, USER_AGENT};
