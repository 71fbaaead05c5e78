use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Feed address of a server running on the default port.
pub const DEFAULT_FEED_URL: &str = "http://localhost:3000/api/events";

/// This server's own feed when it listens on `port`.
pub fn local_feed_url(port: u16) -> String {
    format!("http://localhost:{port}/api/events")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub events_sheet: String,
    pub feed_cache_ttl: Duration,
    pub events_feed_url: String,
    pub assets_dir: String,
    pub templates_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://sitefeed.db".to_string(),
            port: 3000,
            events_sheet: "Events".to_string(),
            feed_cache_ttl: Duration::from_secs(60),
            events_feed_url: local_feed_url(3000),
            assets_dir: "assets".to_string(),
            templates_dir: "templates".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str, default: String| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
        };

        let port = number(&lookup, "PORT", defaults.port)?;

        Ok(Self {
            database_url: text("DATABASE_URL", defaults.database_url),
            port,
            events_sheet: text("EVENTS_SHEET", defaults.events_sheet),
            feed_cache_ttl: Duration::from_secs(number(
                &lookup,
                "FEED_CACHE_SECONDS",
                defaults.feed_cache_ttl.as_secs(),
            )?),
            events_feed_url: text("EVENTS_FEED_URL", local_feed_url(port)),
            assets_dir: text("ASSETS_DIR", defaults.assets_dir),
            templates_dir: text("TEMPLATES_DIR", defaults.templates_dir),
        })
    }
}

fn number<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        _ => Ok(default),
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
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.feed_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.events_feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn overrides_are_trimmed_and_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", " 8080 "),
            ("FEED_CACHE_SECONDS", "5"),
            ("EVENTS_SHEET", " Calendar "),
            ("EVENTS_FEED_URL", ""),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.feed_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.events_sheet, "Calendar");
        assert_eq!(config.events_feed_url, "http://localhost:8080/api/events");
    }

    #[test]
    fn feed_url_follows_port_unless_set() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "4100")])).unwrap();
        assert_eq!(config.events_feed_url, "http://localhost:4100/api/events");

        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "4100"),
            ("EVENTS_FEED_URL", "https://example.org/api/events"),
        ]))
        .unwrap();
        assert_eq!(config.events_feed_url, "https://example.org/api/events");
    }

    #[test]
    fn bad_number_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("FEED_CACHE_SECONDS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "FEED_CACHE_SECONDS",
                value: "soon".to_string()
            }
        );
    }
}
