//! HTTP access for batch scraping.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};

use crate::encoding::decode_body;
use crate::{Error, Result};

/// Desktop browser User-Agent sent with every request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// `Accept` header sent with every request.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Source of page HTML.
///
/// Implementations return `Error::Http`, `Error::Timeout` or
/// `Error::Request` for failures that may succeed on a later attempt.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return its body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Fetcher with the default desktop User-Agent and gzip support.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        log::debug!("fetched {} bytes from {url}", body.len());

        Ok(decode_body(&body, content_type.as_deref()))
    }
}
