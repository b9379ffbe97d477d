//! Command-line front end.
//!
//! `markscrape extract [FILE]` scrapes one HTML document (stdin when no
//! file is given) and prints the `ScrapedContent` as JSON.
//! `markscrape batch URL...` fetches and converts each URL and prints the
//! results as JSON; progress is logged to stderr.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use markscrape::{
    scrape_html, BatchScrapeController, BatchScrapeOptions, ExtractionMode, ExtractionOptions, ReqwestFetcher,
    SeedLink,
};

#[derive(Parser)]
#[command(name = "markscrape", version, about = "Scrape web pages to Markdown")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the main content of one HTML document.
    Extract {
        /// Extraction mode.
        #[arg(long, value_enum)]
        mode: Option<Mode>,
        /// Page URL, used to resolve relative links and images.
        #[arg(long)]
        url: Option<String>,
        /// ExtractionOptions JSON file; `--mode` and `--url` override it.
        #[arg(long)]
        options: Option<PathBuf>,
        /// HTML file; reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Fetch and convert many pages.
    Batch {
        /// Pages fetched at once.
        #[arg(long)]
        concurrency: Option<usize>,
        /// Extra attempts per failed page.
        #[arg(long)]
        retries: Option<usize>,
        /// Per-request timeout in milliseconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Delay between chunks and retries in milliseconds.
        #[arg(long)]
        delay: Option<u64>,
        /// URLs to scrape.
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Selector,
    Readability,
    Hybrid,
}

impl From<Mode> for ExtractionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Selector => Self::Selector,
            Mode::Readability => Self::Readability,
            Mode::Hybrid => Self::Hybrid,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let result = match Cli::parse().command {
        Command::Extract {
            mode,
            url,
            options,
            file,
        } => extract(mode, url, options, file),
        Command::Batch {
            concurrency,
            retries,
            timeout,
            delay,
            urls,
        } => {
            let defaults = BatchScrapeOptions::default();
            let options = BatchScrapeOptions {
                concurrency: concurrency.unwrap_or(defaults.concurrency),
                retry_count: retries.unwrap_or(defaults.retry_count),
                timeout: timeout.unwrap_or(defaults.timeout),
                delay_between_requests: delay.unwrap_or(defaults.delay_between_requests),
            };
            batch(options, urls).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn extract(
    mode: Option<Mode>,
    url: Option<String>,
    options_file: Option<PathBuf>,
    file: Option<PathBuf>,
) -> Result<(), String> {
    let mut options = match options_file {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
            ExtractionOptions::from_json(&json).map_err(|e| e.to_string())?
        }
        None => ExtractionOptions::default(),
    };
    if let Some(mode) = mode {
        options.mode = mode.into();
    }
    if url.is_some() {
        options.url = url;
    }

    let html = match file {
        Some(path) => {
            let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
            markscrape::encoding::decode_body(&bytes, None)
        }
        None => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            html
        }
    };

    print_json(&scrape_html(&html, &options))
}

async fn batch(options: BatchScrapeOptions, urls: Vec<String>) -> Result<(), String> {
    let fetcher = ReqwestFetcher::new().map_err(|e| e.to_string())?;
    let controller = BatchScrapeController::new(options, Arc::new(fetcher));
    let links: Vec<SeedLink> = urls.into_iter().map(|url| SeedLink::new(url, String::new())).collect();

    let results = controller
        .execute(&links, |progress| {
            if let Some(current) = &progress.current {
                log::info!("[{}/{}] {current}", progress.completed, progress.total);
            }
        })
        .await;

    print_json(&results)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
