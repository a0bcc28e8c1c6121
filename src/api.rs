//! HTTP API for the lookup pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `POST` | `/api/analyze` | `{"results": [...]}` |
//! | `POST` | `/api/verify` | `VerificationReport`, only when an LLM is configured |
//! | `GET` | `/health` | `{"status": "ok"}` |
//! | `GET` | `/` | `{"status": "ok"}` |
//!
//! # Errors
//!
//! | Status | Body | Cause |
//! |--------|------|-------|
//! | 400 | `{"detail": "Invalid category"}` | unknown category |
//! | 400 | `{"detail": "News text and category are required"}` | verify body lacks a field |
//! | 422 | `{"detail": "..."}` | body is not valid JSON of the expected shape |
//! | 502 | `{"error": "Failed to verify news"}` | LLM call failed or answered garbage |
//! | 500 | `{"error": "Internal server error"}` | anything else, panics included |
//!
//! Search and fetch failures are not errors here: they shrink the result list.

use crate::models::{
    AnalyzeResponse, NewsQuery, StatusResponse, VerificationReport, VerifyRequest,
};
use crate::pipeline::{self, PipelineError};
use crate::scrapers::Scraper;
use crate::verify::{AskAsync, VerifyError, verify_news};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Failures surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid category")]
    InvalidCategory,

    #[error("News text and category are required")]
    MissingFields,

    #[error("{0}")]
    MalformedBody(String),

    /// Detail is logged, never sent.
    #[error("verification failed: {0}")]
    Verification(String),

    /// Detail is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidCategory(_) => ApiError::InvalidCategory,
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::MissingFields => ApiError::MissingFields,
            VerifyError::InvalidCategory(_) => ApiError::InvalidCategory,
            other => ApiError::Verification(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidCategory => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": ApiError::InvalidCategory.to_string() })),
            )
                .into_response(),
            ApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": ApiError::MissingFields.to_string() })),
            )
                .into_response(),
            ApiError::Verification(detail) => {
                error!(%detail, "Verification failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Failed to verify news" })),
                )
                    .into_response()
            }
            ApiError::MalformedBody(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": detail })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!(%detail, "Analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Handler state: the scraper, plus the model when verification is enabled.
pub struct AppState<S, A> {
    scraper: Arc<S>,
    llm: Option<Arc<A>>,
}

impl<S, A> Clone for AppState<S, A> {
    fn clone(&self) -> Self {
        Self {
            scraper: Arc::clone(&self.scraper),
            llm: self.llm.clone(),
        }
    }
}

/// Build the application router around `scraper`.
///
/// `POST /api/verify` is only routed when `llm` is given. `allowed_origin` is
/// the single origin permitted to call the API with credentials; its request
/// methods and headers are mirrored back.
pub fn router<S, A>(scraper: Arc<S>, llm: Option<Arc<A>>, allowed_origin: HeaderValue) -> Router
where
    S: Scraper + Send + Sync + 'static,
    A: AskAsync + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let mut routes = Router::new()
        .route("/", get(status))
        .route("/health", get(status))
        .route("/api/analyze", post(analyze::<S, A>));
    if llm.is_some() {
        routes = routes.route("/api/verify", post(verify::<S, A>));
    }

    routes
        .with_state(AppState { scraper, llm })
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

#[instrument(level = "info", skip_all)]
async fn analyze<S, A>(
    State(state): State<AppState<S, A>>,
    body: Result<Json<NewsQuery>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError>
where
    S: Scraper + Send + Sync + 'static,
    A: AskAsync + Send + Sync + 'static,
{
    let Json(query) = body?;
    let results = pipeline::get_news_results(state.scraper.as_ref(), &query).await?;
    if results.is_empty() {
        warn!(
            news_text = %crate::utils::truncate_for_log(&query.news_text, 120),
            category = %query.category,
            "No results for query"
        );
    }
    info!(count = results.len(), "Analysis complete");
    Ok(Json(AnalyzeResponse { results }))
}

#[instrument(level = "info", skip_all)]
async fn verify<S, A>(
    State(state): State<AppState<S, A>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerificationReport>, ApiError>
where
    S: Scraper + Send + Sync + 'static,
    A: AskAsync + Send + Sync + 'static,
{
    let Json(request) = body?;
    let llm = state
        .llm
        .as_deref()
        .ok_or_else(|| ApiError::Internal("verify routed without a model".to_string()))?;
    let report = verify_news(state.scraper.as_ref(), llm, &request).await?;
    Ok(Json(report))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    ApiError::Internal(detail).into_response()
}
