use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_CACHE_TTL_SECONDS: u64 = 86_400;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DEEP_RESEARCH_MODEL: &str = "o3-deep-research";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
///
/// Nothing is strictly required at startup: a missing `OPENAI_API_KEY` only
/// surfaces as a configuration error once a request reaches an OpenAI call.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_ttl: Duration,
    pub use_deep_research: bool,
    pub allow_search_fallback: bool,
    pub strict_deep_research: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub deep_research_model: String,
    /// Empty in the environment means "reuse `deep_research_model`".
    pub deep_research_fallback_model: Option<String>,
    pub chat_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            use_deep_research: true,
            allow_search_fallback: false,
            strict_deep_research: false,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            deep_research_model: DEFAULT_DEEP_RESEARCH_MODEL.to_string(),
            deep_research_fallback_model: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let ttl_seconds = match optional_env("RAG_SEARCH_CACHE_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("RAG_SEARCH_CACHE_TTL_SECONDS must be a non-negative integer")?,
            None => DEFAULT_CACHE_TTL_SECONDS,
        };

        Ok(Config {
            cache_ttl: Duration::from_secs(ttl_seconds),
            use_deep_research: env_flag("RAG_USE_DEEP_RESEARCH", defaults.use_deep_research),
            allow_search_fallback: env_flag(
                "RAG_ALLOW_DUCKDUCKGO_FALLBACK",
                defaults.allow_search_fallback,
            ),
            strict_deep_research: env_flag(
                "RAG_DEEP_RESEARCH_STRICT",
                defaults.strict_deep_research,
            ),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            embedding_model: optional_env("OPENAI_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            deep_research_model: optional_env("OPENAI_DEEP_RESEARCH_MODEL")
                .unwrap_or(defaults.deep_research_model),
            deep_research_fallback_model: optional_env("OPENAI_DEEP_RESEARCH_FALLBACK_MODEL"),
            chat_model: optional_env("OPENAI_MODEL_NAME").unwrap_or(defaults.chat_model),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    /// The model used for the tool-less retry of a failed deep research call.
    pub fn fallback_model(&self) -> &str {
        self.deep_research_fallback_model
            .as_deref()
            .unwrap_or(&self.deep_research_model)
    }
}

/// Reads an env var, treating unset and blank values the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw),
        Err(_) => default,
    }
}

/// Only the literal `true` (any case) enables a flag.
fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}
