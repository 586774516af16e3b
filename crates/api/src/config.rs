use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use content_feed_core::locale::Locale;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// Directory holding one JSON file per source page.
    pub content_dir: PathBuf,
    /// Optional JSON object mapping slugs to canonical ids.
    pub correlation_map: Option<PathBuf>,
    /// Prefix for relative `/uploads/...` asset paths.
    pub asset_base_url: Option<String>,
    pub default_page_size: usize,
    /// Tried in order when a request names a locale without a fallback.
    pub fallback_locales: Vec<Locale>,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_page_size: usize =
            parsed(&lookup, "DEFAULT_PAGE_SIZE", "10", "a positive integer")?;
        if default_page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_PAGE_SIZE",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        let fallback = lookup("FALLBACK_LOCALES").unwrap_or_else(|| "en".to_string());
        let fallback_locales = Locale::parse_list(&fallback).map_err(|_| ConfigError::Invalid {
            name: "FALLBACK_LOCALES",
            expected: "a comma separated list of language tags",
            value: fallback.clone(),
        })?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", "3030", "a valid port number")?,
            content_dir: PathBuf::from(
                lookup("CONTENT_DIR").unwrap_or_else(|| "fixtures/posts".to_string()),
            ),
            correlation_map: non_empty("CORRELATION_MAP").map(PathBuf::from),
            asset_base_url: non_empty("ASSET_BASE_URL"),
            default_page_size,
            fallback_locales,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value,
    })
}
