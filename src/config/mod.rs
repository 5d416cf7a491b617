use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl LogFormat {
    /// Reads `LOG_FORMAT`. Resolved on its own because tracing starts before
    /// the rest of the configuration is loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| anyhow::anyhow!("Failed to parse LOG_FORMAT: {}", e)),
            None => Ok(LogFormat::Pretty),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub extraction_api_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_upload_size_mb: usize,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = match lookup("PORT") {
            Some(_) => Self::parse_var(&lookup, "PORT", 3000)
                .context("Failed to parse PORT")?,
            None => Self::parse_var(&lookup, "SERVER_PORT", 3000)
                .context("Failed to parse SERVER_PORT")?,
        };

        let config = Config {
            extraction_api_url: lookup("EXTRACTION_API_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| {
                    info!("EXTRACTION_API_URL not set, using default: http://localhost:8000");
                    "http://localhost:8000".to_string()
                }),
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 127.0.0.1");
                "127.0.0.1".to_string()
            }),
            server_port,
            max_upload_size_mb: Self::parse_var(&lookup, "MAX_UPLOAD_SIZE_MB", 50)
                .context("Failed to parse MAX_UPLOAD_SIZE_MB")?,
            request_timeout_seconds: Self::parse_var(&lookup, "REQUEST_TIMEOUT_SECONDS", 120)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr + Copy + fmt::Debug,
        T::Err: fmt::Display,
    {
        match lookup(var_name) {
            Some(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            None => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        let url = Url::parse(&self.extraction_api_url)
            .with_context(|| format!("EXTRACTION_API_URL is not a valid URL: {}", self.extraction_api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("EXTRACTION_API_URL must use http or https"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}
