//! Runtime settings.
//!
//! Settings are resolved once at startup, each field independently:
//!
//! 1. command-line flag or its environment variable ([`Cli`])
//! 2. the YAML file named by `--config`
//! 3. the defaults below
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 10000
//! allowed_origin: https://gemini-server-xi.vercel.app
//! search_url: https://duckduckgo.com/html/
//! timeout_secs: 5
//! # Optional: enables POST /api/verify
//! llm_url: https://generativelanguage.googleapis.com/v1beta/openai
//! llm_model: gemini-2.0-flash
//! llm_timeout_secs: 30
//! ```
//!
//! The LLM API key is read only from `--llm-api-key` / `LLM_API_KEY` or the
//! `llm_api_key` file key, and is redacted from `Debug` output.

use crate::cli::Cli;
use crate::scrapers::duckduckgo::DEFAULT_SEARCH_URL;
use crate::verify::DEFAULT_LLM_MODEL;
use axum::http::HeaderValue;
use serde::Deserialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://gemini-server-xi.vercel.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("allowed_origin {0:?} is not a valid origin header value")]
    InvalidOrigin(String),

    #[error("search_url {0:?} is not an absolute http(s) URL")]
    InvalidSearchUrl(String),

    #[error("llm_url {0:?} is not an absolute http(s) URL")]
    InvalidLlmUrl(String),

    #[error("{0} must be at least 1")]
    InvalidTimeout(&'static str),
}

/// Secret API key; `Debug` never shows it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl FromStr for ApiKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ApiKey(s.to_string()))
    }
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub search_url: String,
    pub timeout_secs: u64,
    /// Base URL of an OpenAI-compatible API; verification is off when unset.
    pub llm_url: Option<String>,
    pub llm_model: String,
    pub llm_api_key: Option<ApiKey>,
    pub llm_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            llm_url: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Parse settings from YAML. Missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML settings file.
    #[instrument(level = "info", skip_all, fields(%path))]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let settings = Self::from_yaml(&text)?;
        info!("Loaded configuration file");
        Ok(settings)
    }

    /// Overlay any values given on the command line or via environment.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(origin) = &cli.allowed_origin {
            self.allowed_origin = origin.clone();
        }
        if let Some(search_url) = &cli.search_url {
            self.search_url = search_url.clone();
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(llm_url) = &cli.llm_url {
            self.llm_url = Some(llm_url.clone());
        }
        if let Some(llm_model) = &cli.llm_model {
            self.llm_model = llm_model.clone();
        }
        if let Some(llm_api_key) = &cli.llm_api_key {
            self.llm_api_key = Some(llm_api_key.clone());
        }
        if let Some(llm_timeout_secs) = cli.llm_timeout_secs {
            self.llm_timeout_secs = llm_timeout_secs;
        }
        self
    }

    /// Resolve settings from the CLI, its optional config file, and defaults.
    pub async fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let base = match &cli.config {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        let settings = base.merge_cli(cli);
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.allowed_origin_header()?;
        if !is_http_url(&self.search_url) {
            return Err(ConfigError::InvalidSearchUrl(self.search_url.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("timeout_secs"));
        }
        if let Some(llm_url) = &self.llm_url {
            if !is_http_url(llm_url) {
                return Err(ConfigError::InvalidLlmUrl(llm_url.clone()));
            }
            if self.llm_timeout_secs == 0 {
                return Err(ConfigError::InvalidTimeout("llm_timeout_secs"));
            }
        }
        Ok(())
    }

    pub fn allowed_origin_header(&self) -> Result<HeaderValue, ConfigError> {
        HeaderValue::from_str(&self.allowed_origin)
            .map_err(|_| ConfigError::InvalidOrigin(self.allowed_origin.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 10000);
        assert_eq!(settings.allowed_origin, "https://gemini-server-xi.vercel.app");
        assert_eq!(settings.search_url, "https://duckduckgo.com/html/");
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("port: 8080\nallowed_origin: http://localhost:5173\n")
            .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.allowed_origin, "http://localhost:5173");
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_unknown_yaml_key_rejected() {
        assert!(matches!(
            Settings::from_yaml("prot: 8080\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let file = Settings::from_yaml("host: 10.0.0.1\nport: 8080\n").unwrap();
        let cli = Cli {
            port: Some(9090),
            timeout_secs: Some(2),
            ..Cli::default()
        };

        let merged = file.merge_cli(&cli);
        assert_eq!(merged.host, "10.0.0.1");
        assert_eq!(merged.port, 9090);
        assert_eq!(merged.timeout_secs, 2);
    }

    #[test]
    fn test_invalid_origin() {
        let settings = Settings {
            allowed_origin: "https://bad\norigin".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidOrigin(_))));
    }

    #[test]
    fn test_invalid_search_url() {
        for search_url in ["duckduckgo.com/html/", "ftp://duckduckgo.com/html/"] {
            let settings = Settings {
                search_url: search_url.to_string(),
                ..Settings::default()
            };
            assert!(matches!(settings.validate(), Err(ConfigError::InvalidSearchUrl(_))));
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidTimeout("timeout_secs"))
        ));
    }

    #[test]
    fn test_llm_disabled_by_default() {
        let settings = Settings::default();
        assert!(settings.llm_url.is_none());
        assert_eq!(settings.llm_model, "gemini-2.0-flash");
        assert_eq!(settings.llm_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_llm_settings_from_yaml_and_cli() {
        let file = Settings::from_yaml(
            "llm_url: http://localhost:11434/v1\nllm_model: llama3\nllm_api_key: from-file\n",
        )
        .unwrap();
        assert_eq!(file.llm_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(file.llm_api_key.as_ref().map(ApiKey::expose), Some("from-file"));

        let cli = Cli {
            llm_model: Some("gemini-2.0-flash".to_string()),
            llm_api_key: Some("from-env".parse().unwrap()),
            ..Cli::default()
        };
        let merged = file.merge_cli(&cli);
        assert_eq!(merged.llm_model, "gemini-2.0-flash");
        assert_eq!(merged.llm_api_key.as_ref().map(ApiKey::expose), Some("from-env"));
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_invalid_llm_url() {
        let settings = Settings {
            llm_url: Some("localhost:11434".to_string()),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidLlmUrl(_))));
    }

    #[test]
    fn test_zero_llm_timeout_rejected_only_when_enabled() {
        let disabled = Settings {
            llm_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(disabled.validate().is_ok());

        let enabled = Settings {
            llm_url: Some("http://localhost:11434/v1".to_string()),
            ..disabled
        };
        assert!(matches!(
            enabled.validate(),
            Err(ConfigError::InvalidTimeout("llm_timeout_secs"))
        ));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let settings = Settings {
            llm_api_key: Some("sk-very-secret".parse().unwrap()),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_resolve_without_file() {
        let cli = Cli {
            host: Some("127.0.0.1".to_string()),
            ..Cli::default()
        };
        let settings = Settings::resolve(&cli).await.unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[tokio::test]
    async fn test_resolve_from_file() {
        let path = std::env::temp_dir().join(format!("news_lookup_{}.yaml", std::process::id()));
        tokio::fs::write(&path, "port: 7070\ntimeout_secs: 3\n").await.unwrap();

        let cli = Cli {
            config: Some(path.to_string_lossy().into_owned()),
            ..Cli::default()
        };
        let settings = Settings::resolve(&cli).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(settings.port, 7070);
        assert_eq!(settings.timeout_secs, 3);
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let cli = Cli {
            config: Some("/nonexistent/news_lookup.yaml".to_string()),
            ..Cli::default()
        };
        assert!(matches!(
            Settings::resolve(&cli).await,
            Err(ConfigError::Read { .. })
        ));
    }
}
