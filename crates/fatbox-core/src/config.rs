//! Configuration module
//!
//! Settings are read from the environment (after loading `.env` when present)
//! with defaults for everything, then validated once at startup.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SERVER_PORT: u16 = 3000;
const SCRATCH_DIR: &str = "/tmp";
const MAX_UPLOAD_SIZE_MB: usize = 1024;
const UPSTREAM_TIMEOUT_SECS: u64 = 300;
const UPSTREAM_MAX_RETRIES: u32 = 1;
const UPSTREAM_RETRY_BASE_DELAY_MS: u64 = 500;
const MAX_UPSTREAM_RETRIES: u32 = 3;

const POMF_UPLOAD_URL: &str = "https://pomf.lain.la/upload.php";
const CATBOX_API_URL: &str = "https://catbox.moe/user/api.php";
const LITTERBOX_API_URL: &str = "https://litterbox.catbox.moe/resources/internals/api.php";

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Upload endpoints of the external hosts
#[derive(Clone, Debug)]
pub struct HostingEndpoints {
    pub pomf_upload_url: String,
    pub catbox_api_url: String,
    pub litterbox_api_url: String,
}

impl Default for HostingEndpoints {
    fn default() -> Self {
        Self {
            pomf_upload_url: POMF_UPLOAD_URL.to_string(),
            catbox_api_url: CATBOX_API_URL.to_string(),
            litterbox_api_url: LITTERBOX_API_URL.to_string(),
        }
    }
}

/// Outbound call policy shared by all hosts
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// Budget for a single attempt (connect, send body, read response)
    pub timeout: Duration,
    /// Additional attempts after a transient failure
    pub max_retries: u32,
    /// Delay before a retry; random jitter is added on top
    pub retry_base_delay: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SECS),
            max_retries: UPSTREAM_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(UPSTREAM_RETRY_BASE_DELAY_MS),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
    /// Root holding the `uploads/` (chunk sessions) and `temp/` (assembled and
    /// direct-upload files) scratch directories
    pub scratch_dir: PathBuf,
    pub max_upload_size_bytes: usize,
    pub upstream: UpstreamConfig,
    pub endpoints: HostingEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            log_format: LogFormat::Compact,
            scratch_dir: PathBuf::from(SCRATCH_DIR),
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            upstream: UpstreamConfig::default(),
            endpoints: HostingEndpoints::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup. Unset keys take their
    /// defaults; set keys that fail to parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        let max_upload_size_mb: usize = parse_or(&lookup, "MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)?;

        let upstream = UpstreamConfig {
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "UPSTREAM_TIMEOUT_SECS",
                UPSTREAM_TIMEOUT_SECS,
            )?),
            max_retries: parse_or(&lookup, "UPSTREAM_MAX_RETRIES", UPSTREAM_MAX_RETRIES)?,
            retry_base_delay: Duration::from_millis(parse_or(
                &lookup,
                "UPSTREAM_RETRY_BASE_DELAY_MS",
                UPSTREAM_RETRY_BASE_DELAY_MS,
            )?),
        };

        let endpoints = HostingEndpoints {
            pomf_upload_url: lookup("POMF_UPLOAD_URL")
                .unwrap_or(defaults.endpoints.pomf_upload_url),
            catbox_api_url: lookup("CATBOX_API_URL").unwrap_or(defaults.endpoints.catbox_api_url),
            litterbox_api_url: lookup("LITTERBOX_API_URL")
                .unwrap_or(defaults.endpoints.litterbox_api_url),
        };

        Ok(Config {
            server_port: parse_or(&lookup, "PORT", SERVER_PORT)?,
            environment,
            cors_origins,
            log_format,
            scratch_dir: lookup("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            max_upload_size_bytes: max_upload_size_mb.saturating_mul(1024 * 1024),
            upstream,
            endpoints,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than 0"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.upstream.timeout.is_zero() {
            return Err(anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be greater than 0"));
        }

        if self.upstream.max_retries > MAX_UPSTREAM_RETRIES {
            return Err(anyhow::anyhow!(
                "UPSTREAM_MAX_RETRIES must be at most {}",
                MAX_UPSTREAM_RETRIES
            ));
        }

        if self.scratch_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("SCRATCH_DIR must not be empty"));
        }

        for (name, url) in [
            ("POMF_UPLOAD_URL", &self.endpoints.pomf_upload_url),
            ("CATBOX_API_URL", &self.endpoints.catbox_api_url),
            ("LITTERBOX_API_URL", &self.endpoints.litterbox_api_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "{} must be an http(s) URL, got '{}'",
                    name,
                    url
                ));
            }
        }

        if self.cors_origins.is_empty() {
            return Err(anyhow::anyhow!("CORS_ORIGINS must list at least one origin"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Directory holding one subdirectory of chunk files per upload session
    pub fn uploads_dir(&self) -> PathBuf {
        self.scratch_dir.join("uploads")
    }

    /// Directory holding assembled and direct-upload files
    pub fn temp_dir(&self) -> PathBuf {
        self.scratch_dir.join("temp")
    }

    /// Point both scratch directories at a different root (test fixtures).
    pub fn with_scratch_dir(mut self, root: impl AsRef<Path>) -> Self {
        self.scratch_dir = root.as_ref().to_path_buf();
        self
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.uploads_dir(), PathBuf::from("/tmp/uploads"));
        assert_eq!(config.temp_dir(), PathBuf::from("/tmp/temp"));
        assert_eq!(config.upstream.max_retries, 1);
        assert_eq!(config.upstream.timeout, Duration::from_secs(300));
        assert_eq!(config.endpoints.pomf_upload_url, POMF_UPLOAD_URL);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("SCRATCH_DIR", "/var/tmp/fatbox"),
            ("MAX_UPLOAD_SIZE_MB", "5"),
            ("UPSTREAM_TIMEOUT_SECS", "10"),
            ("UPSTREAM_MAX_RETRIES", "0"),
            ("CATBOX_API_URL", "http://127.0.0.1:9000/api.php"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.uploads_dir(), PathBuf::from("/var/tmp/fatbox/uploads"));
        assert_eq!(config.max_upload_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.upstream.timeout, Duration::from_secs(10));
        assert_eq!(config.upstream.max_retries, 0);
        assert_eq!(config.endpoints.catbox_api_url, "http://127.0.0.1:9000/api.php");
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.upstream.max_retries = 4;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upstream.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.endpoints.litterbox_api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_upload_size_bytes = 0;
        assert!(config.validate().is_err());
    }
}
