//! Page fetching.
//!
//! The crawl engine only sees the [`PageFetcher`] trait, so tests can swap
//! in an in-memory site. [`HttpFetcher`] is the `reqwest`-backed default.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use sitecrawl_shared::{Result, SiteCrawlError};
use tracing::debug;
use url::Url;

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("SiteCrawl/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// A downloaded page. Any status is returned as-is; the caller decides
/// what counts as success.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl FetchedPage {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of pages for the crawler.
///
/// Returns `Err` only for transport failures (timeout, DNS, refused
/// connection, unreadable body).
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage>> + Send;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// `reqwest`-backed fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| SiteCrawlError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SiteCrawlError::Network(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        let body = response
            .text()
            .await
            .map_err(|e| SiteCrawlError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}
