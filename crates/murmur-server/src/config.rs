//! Server configuration loading from file and environment variables.
//!
//! Credential material (provider API keys) is loaded exclusively from the
//! environment, never from the config file, and is write-only: the
//! [`Credentials`] `Debug` impl redacts every key.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Completion provider settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Synthesis provider settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Reverse proxy settings.
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "murmur_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Completion provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_chat_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,

    /// Bounded wait for the completion call, in seconds.
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

/// Synthesis provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Fixed voice identity used for all synthesis.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_voice_model_id")]
    pub model_id: String,

    /// Bounded wait for the synthesis call, in seconds.
    #[serde(default = "default_voice_timeout_secs")]
    pub timeout_secs: u64,
}

/// Reverse proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Upstream host that receives the injected bearer credential.
    #[serde(default = "default_proxy_upstream_host")]
    pub upstream_host: String,

    /// Outbound request timeout, in seconds.
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "murmur.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chat_model() -> String {
    "claude-3-opus-20240229".to_string()
}

fn default_chat_max_tokens() -> u32 {
    1000
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_chat_timeout_secs() -> u64 {
    45
}

fn default_voice_id() -> String {
    "jBpfuIE2acCO8z3wKNLl".to_string()
}

fn default_voice_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_voice_timeout_secs() -> u64 {
    15
}

fn default_proxy_upstream_host() -> String {
    "api.meshy.ai".to_string()
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            max_tokens: default_chat_max_tokens(),
            temperature: default_chat_temperature(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            model_id: default_voice_model_id(),
            timeout_secs: default_voice_timeout_secs(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_host: default_proxy_upstream_host(),
            timeout_secs: default_proxy_timeout_secs(),
        }
    }
}

/// Provider credentials, loaded from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Completion provider key (`ANTHROPIC_API_KEY`).
    pub anthropic_api_key: String,

    /// Synthesis provider key (`ELEVENLABS_API_KEY`).
    pub elevenlabs_api_key: String,

    /// Bearer credential injected by the reverse proxy
    /// (`MURMUR_PROXY_API_KEY`).
    pub proxy_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &"[REDACTED]")
            .field("elevenlabs_api_key", &"[REDACTED]")
            .field("proxy_api_key", &"[REDACTED]")
            .finish()
    }
}

/// Loads provider credentials from the environment.
///
/// Missing keys are tolerated (the corresponding outbound call will fail
/// with an upstream authorization error), but each one is logged at warn
/// level so misconfiguration is visible at startup.
pub fn load_credentials() -> Credentials {
    let fetch = |name: &str| {
        std::env::var(name).unwrap_or_else(|_| {
            tracing::warn!(var = name, "credential env var not set");
            String::new()
        })
    };

    Credentials {
        anthropic_api_key: fetch("ANTHROPIC_API_KEY"),
        elevenlabs_api_key: fetch("ELEVENLABS_API_KEY"),
        proxy_api_key: fetch("MURMUR_PROXY_API_KEY"),
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MURMUR_HOST` overrides `server.host`
/// - `MURMUR_PORT` overrides `server.port`
/// - `MURMUR_DB_PATH` overrides `database.path`
/// - `MURMUR_LOG_LEVEL` overrides `logging.level`
/// - `MURMUR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `MURMUR_PROXY_UPSTREAM_HOST` overrides `proxy.upstream_host`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("MURMUR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("MURMUR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("MURMUR_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("MURMUR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("MURMUR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(host) = std::env::var("MURMUR_PROXY_UPSTREAM_HOST") {
        config.proxy.upstream_host = host;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_contracts() {
        let config = Config::default();
        assert_eq!(config.chat.timeout_secs, 45);
        assert_eq!(config.voice.timeout_secs, 15);
        assert_eq!(config.chat.max_tokens, 1000);
        assert_eq!(config.voice.model_id, "eleven_monolingual_v1");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [chat]
            timeout_secs = 5
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.chat.timeout_secs, 5);
        assert_eq!(config.chat.model, default_chat_model());
        assert_eq!(config.proxy.upstream_host, "api.meshy.ai");
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            anthropic_api_key: "sk-ant-secret".to_string(),
            elevenlabs_api_key: "xi-secret".to_string(),
            proxy_api_key: "msy-secret".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
    }
}
