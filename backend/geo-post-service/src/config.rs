/// Configuration management for Geo Post Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server settings
    pub app: AppConfig,
    /// Elasticsearch connection settings
    pub elasticsearch: ElasticsearchConfig,
    /// Search defaults
    pub search: SearchConfig,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
}

/// Elasticsearch configuration
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of the Elasticsearch node
    pub url: String,
    /// Index holding post documents
    pub post_index: String,
    /// Upper bound for a single request to Elasticsearch
    pub request_timeout: Duration,
    /// Create the post index with a geo_point mapping when missing
    pub ensure_index: bool,
}

/// Search defaults
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Radius used when a search request carries no `range`
    pub default_radius_km: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_post_index() -> String {
    "post".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_radius_km() -> f64 {
    200.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                host: default_host(),
                port: default_port(),
            },
            elasticsearch: ElasticsearchConfig {
                url: default_es_url(),
                post_index: default_post_index(),
                request_timeout: Duration::from_millis(default_timeout_ms()),
                ensure_index: true,
            },
            search: SearchConfig {
                default_radius_km: default_radius_km(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig {
            host: lookup("APP_HOST").unwrap_or_else(default_host),
            port: parse_var(&lookup, "PORT")?.unwrap_or_else(default_port),
        };

        let timeout_ms: u64 =
            parse_var(&lookup, "ELASTICSEARCH_TIMEOUT_MS")?.unwrap_or_else(default_timeout_ms);
        if timeout_ms == 0 {
            bail!("ELASTICSEARCH_TIMEOUT_MS must be greater than zero");
        }

        let elasticsearch = ElasticsearchConfig {
            url: lookup("ELASTICSEARCH_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or_else(default_es_url),
            post_index: lookup("ELASTICSEARCH_POST_INDEX")
                .filter(|index| !index.is_empty())
                .unwrap_or_else(default_post_index),
            request_timeout: Duration::from_millis(timeout_ms),
            ensure_index: parse_var(&lookup, "ELASTICSEARCH_ENSURE_INDEX")?.unwrap_or(true),
        };

        let default_radius_km: f64 =
            parse_var(&lookup, "SEARCH_DEFAULT_RADIUS_KM")?.unwrap_or_else(default_radius_km);
        if !(default_radius_km.is_finite() && default_radius_km > 0.0) {
            bail!("SEARCH_DEFAULT_RADIUS_KM must be a positive number, got {default_radius_km}");
        }

        Ok(Config {
            app,
            elasticsearch,
            search: SearchConfig { default_radius_km },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        _ => Ok(None),
    }
}
