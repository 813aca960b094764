use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_PAPERS_URL: &str = "https://huggingface.co/papers";
const DEFAULT_SITE_URL: &str = "https://dailypapers.dev";
const DEFAULT_GENERATION_URL: &str =
    "https://router.huggingface.co/hf-inference/models/Qwen/Qwen2.5-72B-Instruct/v1/chat/completions";
const DEFAULT_GENERATION_MODEL: &str = "Qwen/Qwen2.5-72B-Instruct";
const DEFAULT_SYNTHESIS_URL: &str = "https://api.deepinfra.com/v1/openai/audio/speech";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Runtime configuration, read from the environment.
///
/// Every knob except the service credentials and the update secret has a
/// default, so a bare process starts and serves the uncached paths. The
/// binary loads `.env` (if present) before calling [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream paper listing.
    pub papers_url: String,
    /// Public site root, used as the summary item's link.
    pub site_url: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Cache store connection string; caching is disabled when unset.
    pub kv_url: Option<String>,
    /// Credential for the text-generation service.
    pub hf_api_key: Option<String>,
    /// Chat-completions endpoint of the text-generation service.
    pub generation_url: String,
    /// Model identifier sent with every generation request.
    pub generation_model: String,
    /// Credential for the speech-synthesis service.
    pub deepinfra_api_key: Option<String>,
    /// Speech endpoint of the synthesis service.
    pub synthesis_url: String,
    /// Shared secret required by the cache-refresh trigger.
    pub update_key: Option<String>,
    pub max_papers: usize,
    pub cache_ttl: Duration,
    pub scrape_timeout: Duration,
    pub generation_timeout: Duration,
    pub synthesis_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            papers_url: env_or("PAPERS_URL", DEFAULT_PAPERS_URL),
            site_url: env_or("SITE_URL", DEFAULT_SITE_URL),
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            kv_url: env_opt("KV_URL"),
            hf_api_key: env_opt("HF_API_KEY"),
            generation_url: env_or("GENERATION_URL", DEFAULT_GENERATION_URL),
            generation_model: env_or("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            deepinfra_api_key: env_opt("DEEPINFRA_API_KEY"),
            synthesis_url: env_or("SYNTHESIS_URL", DEFAULT_SYNTHESIS_URL),
            update_key: env_opt("UPDATE_KEY"),
            max_papers: env_parse("MAX_PAPERS", 50)?,
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", 24 * 60 * 60)?),
            scrape_timeout: Duration::from_secs(env_parse("SCRAPE_TIMEOUT_SECS", 30)?),
            generation_timeout: Duration::from_secs(env_parse("GENERATION_TIMEOUT_SECS", 90)?),
            synthesis_timeout: Duration::from_secs(env_parse("SYNTHESIS_TIMEOUT_SECS", 30)?),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {name} value {raw:?}: {e}"))),
        None => Ok(default),
    }
}
