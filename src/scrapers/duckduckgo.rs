//! DuckDuckGo HTML search.
//!
//! Queries the script-free result page at `https://duckduckgo.com/html/` and
//! collects the outbound links of the top results. DuckDuckGo wraps each
//! outbound link in a redirect of the form
//! `//duckduckgo.com/l/?uddg=<percent-encoded target>&rut=...`, which
//! [`decode_redirect_url`] unwraps.

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Default result page endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://duckduckgo.com/html/";

/// How many result links are read off the page.
pub const MAX_SEARCH_LINKS: usize = 6;

const REDIRECT_PARAM: &str = "uddg=";

static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__url").expect("static selector"));

/// Unwrap a DuckDuckGo redirect link into its destination.
///
/// Takes the value after the first `uddg=` up to the next `&` and
/// percent-decodes it. Links without the parameter, and values that do not
/// decode to valid UTF-8, are returned unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     decode_redirect_url("https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rest"),
///     "https://example.com/page",
/// );
/// ```
pub fn decode_redirect_url(href: &str) -> String {
    let Some(pos) = href.find(REDIRECT_PARAM) else {
        return href.to_string();
    };
    let encoded = href[pos + REDIRECT_PARAM.len()..]
        .split('&')
        .next()
        .unwrap_or_default();

    match urlencoding::decode(encoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!(%href, error = %e, "Could not decode redirect link; keeping it as is");
            href.to_string()
        }
    }
}

/// Build the result page URL for `query`.
fn search_page_url(search_url: &str, query: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(search_url, &[("q", query)])
}

/// Pull candidate links out of a result page.
///
/// Reads the `href` of the first [`MAX_SEARCH_LINKS`] result links, unwraps
/// redirects, and keeps only absolute `http`/`https` targets in page order.
pub fn extract_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .take(MAX_SEARCH_LINKS)
        .filter_map(|element| element.value().attr("href"))
        .map(decode_redirect_url)
        .filter(|link| link.starts_with("http"))
        .collect()
}

/// Run one search and return up to [`MAX_SEARCH_LINKS`] candidate URLs.
///
/// Any failure (bad endpoint, connect error, timeout, unreadable body) is
/// logged and yields an empty list.
#[instrument(level = "info", skip_all, fields(%search_url))]
pub async fn search(client: &Client, search_url: &str, query: &str) -> Vec<String> {
    let url = match search_page_url(search_url, query) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Search failed: invalid search endpoint");
            return Vec::new();
        }
    };

    debug!(%query, "Searching DuckDuckGo");
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Search failed");
            return Vec::new();
        }
    };
    debug!(status = %response.status(), "Search page responded");

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Search failed while reading result page");
            return Vec::new();
        }
    };

    let links = extract_result_links(&body);
    info!(count = links.len(), "Found candidate links");
    debug!(links = ?links, "Candidate links");
    links
}
