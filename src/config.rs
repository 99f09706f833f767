use crate::domain::models::credential::Credential;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LISTEN_ADDR '{0}' is not a socket address")]
    InvalidListenAddr(String),
    #[error("HTTP_TIMEOUT_SECS '{0}' is not a positive integer")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Used when a request carries no credential of its own.
    pub default_credential: Option<Credential>,
    pub github_api_url: String,
    pub listen_addr: SocketAddr,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_credential = lookup("GITHUB_TOKEN").and_then(Credential::new);

        let github_api_url =
            lookup("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(listen_addr))?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            default_credential,
            github_api_url,
            listen_addr,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config = config(&[])?;
        assert!(config.default_credential.is_none());
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn test_overrides() -> anyhow::Result<()> {
        let config = config(&[
            ("GITHUB_TOKEN", "ghp_abc"),
            ("GITHUB_API_URL", "http://localhost:8080"),
            ("LISTEN_ADDR", "0.0.0.0:8000"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ])?;
        assert_eq!(
            config.default_credential.as_ref().map(Credential::expose),
            Some("ghp_abc")
        );
        assert_eq!(config.github_api_url, "http://localhost:8080");
        assert_eq!(config.listen_addr.port(), 8000);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config(&[("LISTEN_ADDR", "nowhere")]).err(),
            Some(ConfigError::InvalidListenAddr("nowhere".to_string()))
        );
        assert_eq!(
            config(&[("HTTP_TIMEOUT_SECS", "0")]).err(),
            Some(ConfigError::InvalidTimeout("0".to_string()))
        );
    }
}
