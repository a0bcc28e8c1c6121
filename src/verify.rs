//! News verification against recent coverage.
//!
//! ```text
//! VerifyRequest ─► lookup pipeline (same as /api/analyze)
//!               ─► prompt with the results as context
//!               ─► chat completion ─► VerificationReport
//! ```
//!
//! The model sits behind [`AskAsync`]; [`LlmClient`] speaks the
//! OpenAI-compatible `/chat/completions` protocol. A failed or malformed
//! completion is an error, there are no retries.

use crate::config::ApiKey;
use crate::models::{NewsQuery, PageResult, VerificationReport, VerifyRequest};
use crate::pipeline::{self, PipelineError};
use crate::scrapers::Scraper;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde_json::{Value, json};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";

const NO_SOURCES: &str = "No specific sources available from the news data. ";
const NO_CONTEXT: &str = "No recent news data available";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("News text and category are required")]
    MissingFields,

    #[error("Invalid category")]
    InvalidCategory(String),

    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion endpoint answered {0}")]
    Status(reqwest::StatusCode),

    #[error("completion has no message content")]
    EmptyCompletion,

    #[error("completion is not a valid report: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("trustScore {0} is outside 0..=100")]
    TrustScoreOutOfRange(f64),
}

impl From<PipelineError> for VerifyError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidCategory(category) => VerifyError::InvalidCategory(category),
        }
    }
}

/// Async access to a language model.
pub trait AskAsync {
    /// Send `prompt` and return the model's reply text.
    fn ask(&self, prompt: &str) -> impl Future<Output = Result<String, VerifyError>> + Send;
}

/// [`AskAsync`] over an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<ApiKey>,
}

impl LlmClient {
    /// `endpoint` is the API base, e.g. `https://host/v1`; `/chat/completions`
    /// is appended. `timeout` bounds each completion request.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<ApiKey>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

impl AskAsync for LlmClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<String, VerifyError> {
        let t0 = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Completion request rejected");
            return Err(VerifyError::Status(status));
        }

        let reply: Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .ok_or(VerifyError::EmptyCompletion)?;

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Completion received");
        Ok(content.to_string())
    }
}

/// Opening sentence of `sourceandrelated`, naming every result's link.
pub fn sources_text(results: &[PageResult]) -> String {
    let sources: Vec<&str> = results
        .iter()
        .map(|r| r.source_link.as_str())
        .filter(|link| !link.is_empty())
        .collect();

    if sources.is_empty() {
        NO_SOURCES.to_string()
    } else {
        format!("Verified against sources: {}. ", sources.join(", "))
    }
}

fn news_context(results: &[PageResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }
    results
        .iter()
        .map(|r| {
            format!(
                "Headline: {}\nDescription: {}\nSource: {}\nDate: {}",
                r.headline, r.description, r.source_link, r.date
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt asking the model to judge `text` against `results`.
pub fn build_prompt(text: &str, category: &str, results: &[PageResult]) -> String {
    let sources = sources_text(results);
    format!(
        "You are a news verification system analyzing user-submitted news against provided recent news data.
First translate the News Content to English if needed.
Then verify the News Content against the provided news context and the specified category.
If the news content doesn't match the given category, say that an invalid category was selected.
Analyze credibility based on matches with the news context, source reliability, and content consistency.
Include the list of sources from the news context in the \"sourceandrelated\" field, starting with \"{sources}\".
Respond with ONLY a JSON object in this exact format:

News Category: {category}
News Content: {text}
Recent News Context:
{context}

{{
  \"trustScore\": (number 0-100),
  \"analysis\": (string, 1-2 sentences),
  \"sourceandrelated\": (string, 2-4 sentences starting with \"{sources}\"),
  \"potentialBiases\": (array of 1-3 strings),
  \"recommendation\": (string)
}}
",
        context = news_context(results),
    )
}

/// Drop a surrounding Markdown code fence, with or without a `json` tag.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse a completion into a report.
///
/// # Errors
///
/// [`VerifyError::Parse`] when the text is not a JSON object with the five
/// report fields of the right types, [`VerifyError::TrustScoreOutOfRange`]
/// when `trustScore` is outside 0 to 100.
pub fn parse_report(completion: &str) -> Result<VerificationReport, VerifyError> {
    let report: VerificationReport = serde_json::from_str(strip_code_fence(completion))?;
    if !(0.0..=100.0).contains(&report.trust_score) {
        return Err(VerifyError::TrustScoreOutOfRange(report.trust_score));
    }
    Ok(report)
}

/// Verify a news snippet: look up recent coverage, then ask the model.
///
/// # Errors
///
/// [`VerifyError::MissingFields`] when `text` or `category` is missing or
/// empty and [`VerifyError::InvalidCategory`] for an unknown category; neither
/// touches the network. Any other variant means the model call failed or its
/// answer was unusable.
#[instrument(level = "info", skip_all)]
pub async fn verify_news<S, A>(
    scraper: &S,
    llm: &A,
    request: &VerifyRequest,
) -> Result<VerificationReport, VerifyError>
where
    S: Scraper + Sync,
    A: AskAsync + Sync,
{
    let (text, category) = match (request.text.as_deref(), request.category.as_deref()) {
        (Some(text), Some(category)) if !text.is_empty() && !category.is_empty() => {
            (text, category)
        }
        _ => return Err(VerifyError::MissingFields),
    };

    let query = NewsQuery {
        news_text: text.to_string(),
        category: category.to_string(),
    };
    let results = pipeline::get_news_results(scraper, &query).await?;
    info!(context_items = results.len(), "Gathered news context");

    let completion = llm.ask(&build_prompt(text, category, &results)).await?;
    let report = parse_report(&completion).inspect_err(|e| {
        warn!(
            error = %e,
            completion = %truncate_for_log(&completion, 200),
            "Unusable completion"
        )
    })?;

    info!(trust_score = report.trust_score, "Verification complete");
    Ok(report)
}
