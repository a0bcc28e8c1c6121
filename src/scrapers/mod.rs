//! Web search and page scraping.
//!
//! The lookup pipeline talks to the web in two phases, each with its own
//! submodule:
//!
//! 1. **Searching**: [`duckduckgo`] turns a query into candidate URLs
//! 2. **Fetching**: [`page`] turns one URL into a [`PageResult`]
//!
//! Both go through [`Scraper`], so the pipeline can be driven by
//! [`WebScraper`] in production and by an in-memory double in tests.
//!
//! # Failure model
//!
//! Neither phase returns an error. A failed search is an empty candidate
//! list and a failed fetch is `None`; the failure is logged where it happens.

pub mod dom;
pub mod duckduckgo;
pub mod page;

use crate::models::PageResult;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Browser user agent sent with every outbound request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// The two web operations the lookup pipeline depends on.
pub trait Scraper {
    /// Candidate URLs for `query`, best first. Empty on failure.
    fn search(&self, query: &str) -> impl Future<Output = Vec<String>> + Send;

    /// Summary of the page at `url`, or `None` if it could not be fetched.
    fn fetch_page(&self, url: &str) -> impl Future<Output = Option<PageResult>> + Send;
}

/// [`Scraper`] backed by DuckDuckGo's HTML results and plain HTTP fetches.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    search_url: String,
}

impl WebScraper {
    pub fn new(client: Client, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl Scraper for WebScraper {
    async fn search(&self, query: &str) -> Vec<String> {
        duckduckgo::search(&self.client, &self.search_url, query).await
    }

    async fn fetch_page(&self, url: &str) -> Option<PageResult> {
        page::fetch_page(&self.client, url).await
    }
}

/// Build the HTTP client shared by every search and page fetch.
///
/// `timeout` bounds each request end to end, body included.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
