//! Client configuration: API location, timeouts, endpoint paths and routes.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API url '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("invalid timeout '{0}': expected milliseconds")]
    InvalidTimeout(String),
}

/// API paths, relative to [`ClientConfig::api_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub logout: String,
    pub refresh: String,
    pub me: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            logout: "/auth/logout".to_string(),
            refresh: "/auth/refresh".to_string(),
            me: "/auth/me".to_string(),
        }
    }
}

/// Application routes the session layer navigates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub login: String,
    pub forbidden: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            forbidden: "/403".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (no trailing slash).
    pub api_url: String,
    /// Upper bound for every network call.
    pub timeout: Duration,
    /// Where the credential store persists; `None` keeps it in memory.
    pub store_path: Option<PathBuf>,
    pub endpoints: Endpoints,
    pub routes: Routes,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            store_path: default_store_path(),
            endpoints: Endpoints::default(),
            routes: Routes::default(),
        }
    }
}

impl ClientConfig {
    /// Config for `api_url` with every other setting at its default and an
    /// in-memory store.
    pub fn new(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_url(&api_url.into())?,
            store_path: None,
            ..Self::default()
        })
    }

    /// Read overrides from the process environment.
    ///
    /// - `QUIZHUB_API_URL`
    /// - `QUIZHUB_API_TIMEOUT_MS`
    /// - `QUIZHUB_STORE_PATH`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("QUIZHUB_API_URL") {
            config.api_url = normalize_url(&url)?;
        }

        if let Some(raw) = lookup("QUIZHUB_API_TIMEOUT_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if millis == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config.timeout = Duration::from_millis(millis);
        }

        if let Some(path) = lookup("QUIZHUB_STORE_PATH") {
            config.store_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(
            raw.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(trimmed.to_string())
}

/// `<data dir>/quizhub/session.json`, if the platform has a data dir.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("quizhub").join("session.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.endpoints.refresh, "/auth/refresh");
        assert_eq!(config.routes.login, "/login");
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QUIZHUB_API_URL", "https://quiz.example.com/api/v1/"),
            ("QUIZHUB_API_TIMEOUT_MS", "5000"),
            ("QUIZHUB_STORE_PATH", "/tmp/quizhub.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://quiz.example.com/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/quizhub.json")));
        assert_eq!(config.url("/auth/me"), "https://quiz.example.com/api/v1/auth/me");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("QUIZHUB_API_URL", "not a url")])),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("QUIZHUB_API_URL", "ftp://example.com")])),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("QUIZHUB_API_TIMEOUT_MS", "soon")])),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("QUIZHUB_API_TIMEOUT_MS", "0")])),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn new_keeps_store_in_memory() {
        let config = ClientConfig::new("http://127.0.0.1:9000/api/v1").unwrap();
        assert_eq!(config.store_path, None);
    }
}
