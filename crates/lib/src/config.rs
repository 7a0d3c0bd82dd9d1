//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.sgwatch/config.json`) and environment.
//! The sender address and mail API key may come from the environment instead of the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Mail provider and sender address.
    #[serde(default)]
    pub mail: MailConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Log notifications instead of delivering them.
    #[default]
    Disabled,

    /// Deliver through the Resend HTTP API.
    Resend,
}

impl MailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProvider::Disabled => "disabled",
            MailProvider::Resend => "resend",
        }
    }
}

/// Mail delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    /// Source address for notifications; must be verified with the provider. Overridden by SGWATCH_FROM_ADDRESS env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,

    #[serde(default)]
    pub provider: MailProvider,

    /// Provider API key. Overridden by RESEND_API_KEY env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider API base URL (default https://api.resend.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Trimmed, non-empty value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn config_value(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the sender address: env SGWATCH_FROM_ADDRESS overrides config.
pub fn resolve_from_address(config: &Config) -> Option<String> {
    env_value("SGWATCH_FROM_ADDRESS").or_else(|| config_value(&config.mail.from_address))
}

/// Resolve the mail API key: env RESEND_API_KEY overrides config.
pub fn resolve_mail_api_key(config: &Config) -> Option<String> {
    env_value("RESEND_API_KEY").or_else(|| config_value(&config.mail.api_key))
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SGWATCH_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".sgwatch").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or SGWATCH_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 15152);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn parses_camel_case_mail_config() {
        let config: Config = serde_json::from_str(
            r#"{"mail":{"fromAddress":" alerts@example.com ","provider":"resend","apiBase":"http://localhost:9000"}}"#,
        )
        .unwrap();
        assert_eq!(config.mail.provider, MailProvider::Resend);
        assert_eq!(config.mail.api_base.as_deref(), Some("http://localhost:9000"));
        assert_eq!(
            config_value(&config.mail.from_address).as_deref(),
            Some("alerts@example.com")
        );
        assert_eq!(config.gateway.port, 15152);
    }

    #[test]
    fn empty_config_defaults_to_disabled_mail() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mail.provider, MailProvider::Disabled);
        assert!(config.mail.from_address.is_none());
    }

    #[test]
    fn blank_config_values_are_ignored() {
        assert_eq!(config_value(&Some("   ".to_string())), None);
        assert_eq!(config_value(&None), None);
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let path = std::env::temp_dir()
            .join("sgwatch-config-test-missing")
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 15152);
    }
}
