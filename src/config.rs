// Configuration module: every tunable the client uses is read once from the
// environment into a `Config` value which is then handed down explicitly to
// the validator and the transfer client.

use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// The liveness probe always uses a short, fixed budget.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Problems with an otherwise parsed configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backend host cannot be empty")]
    EmptyHost,

    #[error("invalid hostname or IP address: {0}")]
    InvalidHost(String),

    #[error("unsupported protocol '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub request_timeout: Duration,
    pub max_upload_size: u64,
    pub chunk_size: usize,
    pub download_timeout: Duration,
    /// Advisory only; no transfer is retried automatically.
    pub upload_retries: u32,
    /// Advisory only; no transfer is retried automatically.
    pub download_retries: u32,
    pub progress_interval: Duration,
    pub color: bool,
    pub development: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.into(),
            request_timeout: Duration::from_millis(30_000),
            max_upload_size: DEFAULT_MAX_FILE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            download_timeout: Duration::from_millis(60_000),
            upload_retries: 3,
            download_retries: 3,
            progress_interval: Duration::from_millis(100),
            color: true,
            development: false,
        }
    }
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Missing or
    /// unparsable entries silently fall back to their defaults, as do
    /// numeric zeros.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str| text(key).and_then(|v| v.parse::<u64>().ok()).filter(|n| *n > 0);

        Config {
            host: text("SHAREIO_HOST").unwrap_or(defaults.host),
            port: text("SHAREIO_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .filter(|p| *p > 0)
                .unwrap_or(defaults.port),
            scheme: text("SHAREIO_PROTOCOL")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(defaults.scheme),
            request_timeout: number("SHAREIO_TIMEOUT")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            max_upload_size: number("MAX_FILE_SIZE").unwrap_or(defaults.max_upload_size),
            chunk_size: number("UPLOAD_CHUNK_SIZE")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.chunk_size),
            download_timeout: number("DOWNLOAD_TIMEOUT")
                .map(Duration::from_millis)
                .unwrap_or(defaults.download_timeout),
            upload_retries: number("UPLOAD_RETRIES")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.upload_retries),
            download_retries: number("DOWNLOAD_RETRIES")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.download_retries),
            progress_interval: number("PROGRESS_UPDATE_INTERVAL")
                .map(Duration::from_millis)
                .unwrap_or(defaults.progress_interval),
            color: text("NO_COLOR").as_deref() != Some("true"),
            development: text("SHAREIO_ENV").as_deref() == Some("development"),
        }
    }

    /// Base URL of the backend service, e.g. `http://localhost:8080`.
    pub fn backend_url(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("{}://[{}]:{}", self.scheme, self.host, self.port),
            _ => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    /// Check that the host and scheme can form a usable URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if !is_valid_host(&self.host) {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }
        match self.scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Accepts `localhost`, IPv4/IPv6 literals and RFC 1123 hostnames (no TLD
/// required).
fn is_valid_host(host: &str) -> bool {
    if host == "localhost" || host.parse::<IpAddr>().is_ok() {
        return true;
    }
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
