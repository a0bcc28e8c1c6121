//! The lookup pipeline: search, fetch, rank.
//!
//! ```text
//! NewsQuery ─► validate category ─► build query ─► search (≤ 6 links)
//!           ─► fetch first 4 concurrently ─► drop failures
//!           ─► sort by date, newest first ─► keep 5
//! ```

use crate::models::{Category, NewsQuery, PageResult};
use crate::scrapers::Scraper;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// How many candidate pages are fetched per lookup.
pub const MAX_PAGE_FETCHES: usize = 4;

/// How many results a lookup returns at most.
pub const MAX_RESULTS: usize = 5;

/// Search-engine directive appended to every query. Passed through verbatim.
pub const TLD_EXCLUSION: &str =
    "-inurl:(.in, .com, .org, .net, .gov, .edu, .uk, .au, .ca, .us, .co, .co.in)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid category")]
    InvalidCategory(String),
}

/// Search query for a snippet within a category.
pub fn build_query(news_text: &str, category: Category) -> String {
    format!("{news_text} {category} news {TLD_EXCLUSION}")
}

/// Look up recent coverage for `query`.
///
/// # Returns
///
/// Up to [`MAX_RESULTS`] page summaries, newest first. An empty list when the
/// search found nothing or no candidate page could be fetched.
///
/// # Errors
///
/// [`PipelineError::InvalidCategory`] if `query.category` is not a known
/// [`Category`]. This is checked before any network traffic.
#[instrument(level = "info", skip_all, fields(category = %query.category))]
pub async fn get_news_results<S: Scraper>(
    scraper: &S,
    query: &NewsQuery,
) -> Result<Vec<PageResult>, PipelineError> {
    let category: Category = query
        .category
        .parse()
        .map_err(|_| PipelineError::InvalidCategory(query.category.clone()))?;

    let search_query = build_query(&query.news_text, category);
    debug!(%search_query, "Built search query");

    let links = scraper.search(&search_query).await;
    if links.is_empty() {
        warn!("No search results found");
        return Ok(Vec::new());
    }
    info!(count = links.len(), "Discovered candidate links");

    let pages: Vec<Option<PageResult>> = stream::iter(links.into_iter().take(MAX_PAGE_FETCHES))
        .map(|url| async move {
            let page = scraper.fetch_page(&url).await;
            match &page {
                Some(_) => debug!(%url, "Fetched candidate"),
                None => debug!(%url, "Dropped candidate"),
            }
            page
        })
        .buffered(MAX_PAGE_FETCHES)
        .collect()
        .await;

    let results: Vec<PageResult> = pages
        .into_iter()
        .flatten()
        .sorted_by(|a, b| b.date.cmp(&a.date))
        .take(MAX_RESULTS)
        .collect();

    if results.is_empty() {
        warn!("No valid results after fetching");
    } else {
        info!(count = results.len(), "Returning results");
    }
    Ok(results)
}
