use crate::{Error, Result, TtlMs};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub transfer_timeout: Duration,
    pub cache_ttl: TtlMs,
    pub cache_max_entries: u64,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub token_path: Option<PathBuf>,
    pub download_dir: PathBuf,
}

impl ClientConfig {
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 60_000;
    pub const DEFAULT_CACHE_TTL_MS: u64 = 5_000;
    pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
    const DEFAULT_DOWNLOAD_DIR: &str = ".";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is this with
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("HERITAGE_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| Self::DEFAULT_API_BASE_URL.to_string());

        Self {
            api_base_url,
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "HERITAGE_REQUEST_TIMEOUT_MS",
                Self::DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            transfer_timeout: Duration::from_millis(parse_or(
                &lookup,
                "HERITAGE_TRANSFER_TIMEOUT_MS",
                Self::DEFAULT_TRANSFER_TIMEOUT_MS,
            )),
            cache_ttl: TtlMs(parse_or(
                &lookup,
                "HERITAGE_CACHE_TTL_MS",
                Self::DEFAULT_CACHE_TTL_MS,
            )),
            cache_max_entries: parse_or(
                &lookup,
                "HERITAGE_CACHE_MAX_ENTRIES",
                Self::DEFAULT_CACHE_MAX_ENTRIES,
            ),
            retry_attempts: parse_or(
                &lookup,
                "HERITAGE_RETRY_ATTEMPTS",
                Self::DEFAULT_RETRY_ATTEMPTS,
            ),
            retry_delay: Duration::from_millis(parse_or(
                &lookup,
                "HERITAGE_RETRY_DELAY_MS",
                Self::DEFAULT_RETRY_DELAY_MS,
            )),
            token_path: lookup("HERITAGE_TOKEN_PATH").map(PathBuf::from),
            download_dir: lookup("HERITAGE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_DOWNLOAD_DIR)),
        }
    }

    /// Join a request path onto the base URL. Absolute URLs pass through.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(Error::InvalidConfig(format!(
                "api base url '{}' must start with http:// or https://",
                self.api_base_url
            )));
        }
        if self.request_timeout.is_zero() || self.transfer_timeout.is_zero() {
            return Err(Error::InvalidConfig("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
