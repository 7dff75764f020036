//! Connection configuration for the cPanel connector
//!
//! A [`ConnectionConfig`] is built once per run, validated eagerly, and then
//! shared read-only by every API call.

use serde::{Deserialize, Serialize};

/// Environment variable holding the cPanel host
pub const ENV_HOST: &str = "CPANEL_URL";
/// Environment variable holding the cPanel account name
pub const ENV_USERNAME: &str = "CPANEL_USER";
/// Environment variable holding the API token
pub const ENV_API_TOKEN: &str = "CPANEL_TOKEN";
/// Environment variable holding the API port
pub const ENV_PORT: &str = "CPANEL_PORT";
/// Environment variable toggling TLS verification off
pub const ENV_INSECURE: &str = "CPANEL_INSECURE";

/// Port of the cPanel HTTPS service
pub const DEFAULT_PORT: u16 = 2083;

/// Connection settings for one cPanel account
///
/// # Security
///
/// `api_token` is never serialized and the Debug implementation redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// cPanel host name, e.g. `cpanel.example.com`
    #[serde(default)]
    pub host: String,

    /// cPanel account user name
    #[serde(default)]
    pub username: String,

    /// cPanel API token
    /// ⚠️ NEVER log this value
    #[serde(default, skip_serializing)]
    pub api_token: String,

    /// HTTPS port of the cPanel service (2083 when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Skip TLS certificate verification (off when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("api_token", &"<REDACTED>")
            .field("port", &self.port())
            .field("insecure", &self.insecure())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a configuration with default port, TLS verification and timeout
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            api_token: api_token.into(),
            port: None,
            insecure: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = Some(insecure);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load configuration entirely from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, crate::Error> {
        Self::new(String::new(), String::new(), String::new()).fill_from_lookup(lookup)
    }

    /// Fill unset fields from the process environment
    ///
    /// Explicitly set values always win over the environment, including
    /// values equal to the defaults.
    pub fn fill_from_env(self) -> Result<Self, crate::Error> {
        self.fill_from_lookup(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from an arbitrary variable lookup
    pub fn fill_from_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, crate::Error> {
        if self.host.is_empty()
            && let Some(host) = lookup(ENV_HOST)
        {
            self.host = host;
        }
        if self.username.is_empty()
            && let Some(username) = lookup(ENV_USERNAME)
        {
            self.username = username;
        }
        if self.api_token.is_empty()
            && let Some(token) = lookup(ENV_API_TOKEN)
        {
            self.api_token = token;
        }
        if self.port.is_none()
            && let Some(port) = lookup(ENV_PORT)
        {
            let parsed = port.trim().parse().map_err(|_| {
                crate::Error::config(format!("{ENV_PORT} must be a port number, got '{port}'"))
            })?;
            self.port = Some(parsed);
        }
        if self.insecure.is_none()
            && let Some(insecure) = lookup(ENV_INSECURE)
        {
            let parsed = parse_bool(&insecure).ok_or_else(|| {
                crate::Error::config(format!(
                    "{ENV_INSECURE} must be true or false, got '{insecure}'"
                ))
            })?;
            self.insecure = Some(parsed);
        }

        self.host = normalize_host(&self.host);
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "cPanel host is required (set it explicitly or via {ENV_HOST})"
            )));
        }
        if self.username.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "cPanel username is required (set it explicitly or via {ENV_USERNAME})"
            )));
        }
        if self.api_token.is_empty() {
            return Err(crate::Error::config(format!(
                "cPanel API token is required (set it explicitly or via {ENV_API_TOKEN})"
            )));
        }
        if self.port() == 0 {
            return Err(crate::Error::config("cPanel port must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }

    /// Effective port
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Whether TLS certificate verification is skipped
    pub fn insecure(&self) -> bool {
        self.insecure.unwrap_or(false)
    }

    /// `https://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", normalize_host(&self.host), self.port())
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("cpanel {}:{}", self.username, self.api_token)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/').to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new("cpanel.example.com", "alice", "secret");
        assert_eq!(config.port(), 2083);
        assert!(!config.insecure());
        assert_eq!(config.base_url(), "https://cpanel.example.com:2083");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_fallback() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            (ENV_HOST, "https://cpanel.example.com/"),
            (ENV_USERNAME, "alice"),
            (ENV_API_TOKEN, "secret"),
            (ENV_PORT, "2087"),
            (ENV_INSECURE, "true"),
        ]))
        .unwrap();

        assert_eq!(config.host, "cpanel.example.com");
        assert_eq!(config.username, "alice");
        assert_eq!(config.port(), 2087);
        assert!(config.insecure());
    }

    #[test]
    fn test_explicit_values_win() {
        let config = ConnectionConfig::new("explicit.example.com", "bob", "tok")
            .fill_from_lookup(lookup(&[(ENV_HOST, "env.example.com"), (ENV_USERNAME, "env")]))
            .unwrap();

        assert_eq!(config.host, "explicit.example.com");
        assert_eq!(config.username, "bob");
    }

    #[test]
    fn test_explicit_defaults_are_not_overridden() {
        let env = lookup(&[(ENV_PORT, "2087"), (ENV_INSECURE, "true")]);
        let config = ConnectionConfig::new("cpanel.example.com", "alice", "secret")
            .with_port(2083)
            .with_insecure(false)
            .fill_from_lookup(env)
            .unwrap();

        assert_eq!(config.port(), 2083);
        assert!(!config.insecure());
        assert_eq!(config.base_url(), "https://cpanel.example.com:2083");
    }

    #[test]
    fn test_unset_port_and_tls_come_from_env() {
        let env = lookup(&[(ENV_PORT, "2087"), (ENV_INSECURE, "yes")]);
        let config = ConnectionConfig::new("cpanel.example.com", "alice", "secret")
            .fill_from_lookup(env)
            .unwrap();

        assert_eq!(config.port(), 2087);
        assert!(config.insecure());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = ConnectionConfig::from_lookup(lookup(&[(ENV_PORT, "https")]));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let config = ConnectionConfig::new("cpanel.example.com", "alice", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_not_exposed() {
        let config = ConnectionConfig::new("cpanel.example.com", "alice", "secret_token_12345");

        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("<REDACTED>"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret_token_12345"));
    }
}
