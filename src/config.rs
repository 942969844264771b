//! Client configuration.
//!
//! Read from the environment after `dotenvy` has loaded any `.env` file.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TOKEN_FILE: &str = ".forum-admin-token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub api_url: String,
    /// Where the session token is kept between invocations.
    pub token_file: PathBuf,
    pub timeout: Duration,
    /// Author id used when posting comments if the admin profile is unavailable.
    pub fallback_user_id: Option<String>,
}

impl ClientConfig {
    /// Load from environment variables. `api_url` overrides `ADMIN_API_URL`.
    pub fn from_env(api_url: Option<String>) -> Result<Self> {
        Self::from_lookup(api_url, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        api_url: Option<String>,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_url = api_url
            .or_else(|| get("ADMIN_API_URL"))
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow!("ADMIN_API_URL not set"))?;

        let timeout = match get("ADMIN_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid ADMIN_HTTP_TIMEOUT_SECS: {:?}", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            token_file: get("ADMIN_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
            timeout: Duration::from_secs(timeout),
            fallback_user_id: get("ADMIN_FALLBACK_USER_ID").filter(|id| !id.is_empty()),
        })
    }

    /// Config for a given base URL with defaults everywhere else.
    pub fn for_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fallback_user_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(None, lookup(&[("ADMIN_API_URL", "http://localhost:5000/api/")]))
                .unwrap();
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.token_file, PathBuf::from(".forum-admin-token"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.fallback_user_id, None);
    }

    #[test]
    fn test_override_wins() {
        let config = ClientConfig::from_lookup(
            Some("http://override".to_string()),
            lookup(&[
                ("ADMIN_API_URL", "http://env"),
                ("ADMIN_HTTP_TIMEOUT_SECS", "5"),
                ("ADMIN_TOKEN_FILE", "/tmp/tok"),
                ("ADMIN_FALLBACK_USER_ID", "u1"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_url, "http://override");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token_file, PathBuf::from("/tmp/tok"));
        assert_eq!(config.fallback_user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_missing_url_fails() {
        let err = ClientConfig::from_lookup(None, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("ADMIN_API_URL"));
    }

    #[test]
    fn test_bad_timeout_fails() {
        let result = ClientConfig::from_lookup(
            None,
            lookup(&[("ADMIN_API_URL", "http://x"), ("ADMIN_HTTP_TIMEOUT_SECS", "soon")]),
        );
        assert!(result.is_err());
    }
}
