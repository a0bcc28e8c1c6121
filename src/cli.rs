//! Command-line interface definitions for the news lookup server.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also come from an environment variable or the YAML file
//! named by `--config`; see [`crate::config::Settings`] for precedence.

use crate::config::ApiKey;
use clap::Parser;

/// Command-line arguments for the news lookup server.
///
/// All fields are optional: anything left unset falls back to the config
/// file, then to built-in defaults.
///
/// # Examples
///
/// ```sh
/// # Serve on the defaults (0.0.0.0:10000)
/// news_lookup
///
/// # Local development against a different frontend
/// news_lookup --host 127.0.0.1 --port 8080 --allowed-origin http://localhost:5173
///
/// # Settings from a file, port from the platform
/// PORT=3000 news_lookup -c ./news_lookup.yaml
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "NEWS_LOOKUP_CONFIG")]
    pub config: Option<String>,

    /// Interface to bind
    #[arg(long, env = "NEWS_LOOKUP_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// The one browser origin allowed to call the API with credentials
    #[arg(long, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Search result page endpoint
    #[arg(long, env = "SEARCH_URL")]
    pub search_url: Option<String>,

    /// Per-request timeout for the search and each page fetch, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Base URL of an OpenAI-compatible API; enables `POST /api/verify`
    #[arg(long, env = "LLM_URL")]
    pub llm_url: Option<String>,

    /// Model name sent with each completion request
    #[arg(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Bearer token for the LLM API
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<ApiKey>,

    /// Timeout for each completion request, in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS")]
    pub llm_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_lookup",
            "--config",
            "./news_lookup.yaml",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--allowed-origin",
            "http://localhost:5173",
            "--search-url",
            "http://localhost:9000/html/",
            "--timeout-secs",
            "3",
        ]);

        assert_eq!(cli.config.as_deref(), Some("./news_lookup.yaml"));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.allowed_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(cli.search_url.as_deref(), Some("http://localhost:9000/html/"));
        assert_eq!(cli.timeout_secs, Some(3));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["news_lookup", "-c", "/etc/news.yaml", "-p", "9999"]);

        assert_eq!(cli.config.as_deref(), Some("/etc/news.yaml"));
        assert_eq!(cli.port, Some(9999));
    }

    #[test]
    fn test_cli_llm_flags() {
        let cli = Cli::parse_from([
            "news_lookup",
            "--llm-url",
            "http://localhost:11434/v1",
            "--llm-model",
            "llama3",
            "--llm-api-key",
            "sk-test",
            "--llm-timeout-secs",
            "45",
        ]);

        assert_eq!(cli.llm_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(cli.llm_model.as_deref(), Some("llama3"));
        assert_eq!(cli.llm_api_key.as_ref().map(ApiKey::expose), Some("sk-test"));
        assert_eq!(cli.llm_timeout_secs, Some(45));
        assert!(!format!("{cli:?}").contains("sk-test"));
    }

    #[test]
    fn test_env_variable_names() {
        use clap::CommandFactory;
        use std::ffi::OsStr;

        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(OsStr::to_os_string)
        };

        for (id, env) in [
            ("config", "NEWS_LOOKUP_CONFIG"),
            ("host", "NEWS_LOOKUP_HOST"),
            ("port", "PORT"),
            ("allowed_origin", "ALLOWED_ORIGIN"),
            ("search_url", "SEARCH_URL"),
            ("timeout_secs", "REQUEST_TIMEOUT_SECS"),
            ("llm_url", "LLM_URL"),
            ("llm_api_key", "LLM_API_KEY"),
        ] {
            assert_eq!(env_of(id).as_deref(), Some(OsStr::new(env)), "argument {id}");
        }
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["news_lookup", "--port", "99999"]).is_err());
    }
}
