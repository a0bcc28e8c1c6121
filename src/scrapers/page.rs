//! Candidate page fetching and field extraction.
//!
//! Each candidate URL is fetched once and reduced to a [`PageResult`]:
//!
//! | Field | Source | Fallback |
//! |-------|--------|----------|
//! | `headline` | `<title>` (150 chars) | the URL |
//! | `description` | `<meta name="description">`, then `og:description` (200 chars) | first `<p>`, then a placeholder |
//! | `date` | `article:published_time` meta, then `<time>` | today's local date |
//!
//! Nothing here returns an error: a page that cannot be fetched or read is
//! simply `None`.

use crate::models::PageResult;
use crate::scrapers::dom::{Document, Node};
use crate::utils::{format_date, local_today, truncate_chars};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode};
use scraper::Html;
use tracing::{debug, instrument};

pub const MAX_HEADLINE_CHARS: usize = 150;
pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const NO_DESCRIPTION: &str = "No description available";

/// Offset-less timestamp layouts accepted after RFC 3339 fails.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts RFC 3339 does not cover (space separator, no seconds).
const OFFSET_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Fetch one page and summarize it.
///
/// # Returns
///
/// `None` when the request fails, times out, answers with anything other
/// than `200 OK`, or the body cannot be read.
///
/// The body is decoded with the charset named in `Content-Type` (UTF-8 when
/// absent); undecodable bytes are dropped.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_page(client: &Client, url: &str) -> Option<PageResult> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Fetch failed");
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        debug!(status = %response.status(), "Page returned non-200 status");
        return None;
    }

    let body = match response.text().await {
        Ok(body) => body.replace(char::REPLACEMENT_CHARACTER, ""),
        Err(e) => {
            debug!(error = %e, "Failed reading page body");
            return None;
        }
    };

    let page = parse_page(&body, url, local_today());
    debug!(headline = %page.headline, date = %page.date, "Fetched page");
    Some(page)
}

/// Extract headline, description and date from a page body.
///
/// `today` is used when the page carries no parseable publication date.
pub fn parse_page(html: &str, url: &str, today: NaiveDate) -> PageResult {
    let document = Html::parse_document(html);

    PageResult {
        headline: extract_headline(&document, url),
        description: extract_description(&document),
        source_link: url.to_string(),
        date: extract_date(&document, today),
    }
}

fn extract_headline<D: Document>(document: &D, url: &str) -> String {
    let title = document
        .find("title", &[])
        .map(|title| title.stripped_text())
        .unwrap_or_default();

    if title.is_empty() {
        url.to_string()
    } else {
        truncate_chars(&title, MAX_HEADLINE_CHARS)
    }
}

fn extract_description<D: Document>(document: &D) -> String {
    let meta = document
        .find("meta", &[("name", "description")])
        .or_else(|| document.find("meta", &[("property", "og:description")]));

    let description = meta
        .and_then(|tag| tag.attr("content").map(str::trim).map(str::to_string))
        .unwrap_or_default();
    if !description.is_empty() {
        return truncate_chars(&description, MAX_DESCRIPTION_CHARS);
    }

    match document.find("p", &[]).map(|p| p.stripped_text()) {
        Some(text) if !text.is_empty() => truncate_chars(&text, MAX_DESCRIPTION_CHARS),
        _ => NO_DESCRIPTION.to_string(),
    }
}

/// Publication date of the page as `YYYY-MM-DD`.
///
/// Reads `content`, then `datetime`, from the `article:published_time` meta
/// tag or else the first `<time>` element; empty attributes count as absent.
/// Falls back to `today` when there is no such tag or its value is not an
/// ISO-8601 date/timestamp.
pub fn extract_date<D: Document>(document: &D, today: NaiveDate) -> String {
    let raw = document
        .find("meta", &[("property", "article:published_time")])
        .or_else(|| document.find("time", &[]))
        .and_then(|tag| {
            tag.attr("content")
                .filter(|v| !v.is_empty())
                .or_else(|| tag.attr("datetime").filter(|v| !v.is_empty()))
                .map(str::to_string)
        });

    let date = raw
        .as_deref()
        .and_then(parse_iso_date)
        .unwrap_or(today);
    format_date(date)
}

/// Calendar date of an ISO-8601 date or timestamp, in the timestamp's own offset.
///
/// The year must be exactly four digits and at least 0001; signed and
/// expanded years are rejected.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim().replace('Z', "+00:00");
    let bytes = value.as_bytes();
    if bytes.len() < 5 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }

    parse_iso_date_unchecked(&value).filter(|date| (1..=9999).contains(&date.year()))
}

fn parse_iso_date_unchecked(value: &str) -> Option<NaiveDate> {

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.date_naive());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
