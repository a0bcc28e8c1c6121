//! Data models for lookup requests and the page summaries returned to callers.
//!
//! This module defines the core data structures used throughout the service:
//! - [`NewsQuery`]: The request body accepted by `POST /api/analyze`
//! - [`Category`]: The closed set of news categories a query may target
//! - [`PageResult`]: Headline, description and date extracted from one page
//! - [`AnalyzeResponse`] and [`StatusResponse`]: JSON response envelopes
//! - [`VerifyRequest`] and [`VerificationReport`]: body and answer of `POST /api/verify`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A lookup request as posted by the client.
///
/// `category` is kept as a raw string so that an unknown category reaches the
/// pipeline and is rejected there with a `400`, instead of failing body
/// deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsQuery {
    /// Free-text snippet of the news item being looked up.
    pub news_text: String,
    /// One of the [`Category`] names, e.g. `"tech"`.
    pub category: String,
}

/// News categories accepted by the lookup pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Education,
    Finance,
    Politics,
    World,
    India,
    Tech,
    Entertainment,
    Sports,
    Science,
}

impl Category {
    /// Every accepted category, in the order they are advertised.
    pub const ALL: [Category; 9] = [
        Category::Education,
        Category::Finance,
        Category::Politics,
        Category::World,
        Category::India,
        Category::Tech,
        Category::Entertainment,
        Category::Sports,
        Category::Science,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "education",
            Category::Finance => "finance",
            Category::Politics => "politics",
            Category::World => "world",
            Category::India => "india",
            Category::Tech => "tech",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Science => "science",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Matching is exact: `"Tech"` and `" tech"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Summary of one fetched page.
///
/// # Fields
///
/// * `headline` - Page title, at most 150 characters, or the URL when untitled
/// * `description` - Meta/first-paragraph description, at most 200 characters
/// * `source_link` - The URL that was fetched
/// * `date` - Publication date as `YYYY-MM-DD`, or the fetch date if unknown
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageResult {
    pub headline: String,
    pub description: String,
    pub source_link: String,
    pub date: String,
}

/// Body of a successful `POST /api/analyze` response.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<PageResult>,
}

/// A verification request as posted by the client.
///
/// Both fields are optional at the JSON level so that a missing or empty one
/// is reported as a `400` rather than a body error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifyRequest {
    pub text: Option<String>,
    pub category: Option<String>,
}

/// The model's assessment of a news snippet against recent coverage.
///
/// Field names on the wire are the ones the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VerificationReport {
    /// 0 (not credible) to 100 (fully corroborated).
    #[serde(rename = "trustScore")]
    pub trust_score: f64,
    pub analysis: String,
    /// Starts with the list of sources the snippet was checked against.
    #[serde(rename = "sourceandrelated")]
    pub source_and_related: String,
    #[serde(rename = "potentialBiases")]
    pub potential_biases: Vec<String>,
    pub recommendation: String,
}

/// Body of the liveness endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
