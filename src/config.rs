//! Configuration loading and path resolution.
//!
//! Settings live in `<config_dir>/config.toml`. The config directory defaults
//! to `~/.cacheprobe` and can be relocated with `CACHEPROBE_CONFIG_DIR`; run
//! history is kept under `<config_dir>/data`. Every section has full defaults
//! so a missing or partial file always yields a usable config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Environment variable that relocates the whole config directory.
pub const CONFIG_DIR_ENV: &str = "CACHEPROBE_CONFIG_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Proxy endpoint and request shape.
    pub proxy: ProxyConfig,
    /// How to reach redis-cli.
    pub redis: RedisConfig,
    /// Run-history persistence.
    pub history: HistoryConfig,
}

/// Proxy endpoint and request parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the proxy, without the completions path.
    pub base_url: String,
    /// Bearer token sent with every request. Empty means no auth header.
    pub api_key: String,
    /// Model name requested from the proxy.
    pub model: String,
    /// Sampling temperature for the probe requests.
    pub temperature: f32,
    /// Token budget for the probe requests. Small on purpose.
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Path to the proxy's own YAML config file, for the TTL investigation.
    pub config_path: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            api_key: String::new(),
            model: "local-glm-4-5-air-mlx".to_string(),
            temperature: 0.1,
            max_tokens: 10,
            timeout_secs: 60,
            config_path: None,
        }
    }
}

/// redis-cli invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Binary name or path for redis-cli.
    pub cli_bin: String,
    /// Host passed as `-h` when set.
    pub host: Option<String>,
    /// Port passed as `-p` when set.
    pub port: Option<u16>,
    /// Database index passed as `-n` when set.
    pub db: Option<u32>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            cli_bin: "redis-cli".to_string(),
            host: None,
            port: None,
            db: None,
        }
    }
}

/// Run-history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether probe runs append a summary record to the history file.
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Config directory: `CACHEPROBE_CONFIG_DIR` override, else `~/.cacheprobe`.
    pub fn dir() -> PathBuf {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cacheprobe")
    }

    /// Path of the config file itself.
    pub fn path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Data directory for files the probes write.
    pub fn data_dir() -> PathBuf {
        Self::dir().join("data")
    }

    /// JSONL file that accumulates one summary record per probe run.
    pub fn history_path() -> PathBuf {
        Self::data_dir().join("history.jsonl")
    }

    /// Load the config file if present, apply env overrides, and return it.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|e| {
                ProbeError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a config from TOML text. Extracted for tests.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ProbeError::Config(format!("failed to parse config: {}", e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env("CACHEPROBE_BASE_URL") {
            self.proxy.base_url = v;
        }
        if let Some(v) = non_empty_env("CACHEPROBE_API_KEY") {
            self.proxy.api_key = v;
        }
        if let Some(v) = non_empty_env("CACHEPROBE_MODEL") {
            self.proxy.model = v;
        }
        if let Some(v) = non_empty_env("CACHEPROBE_REDIS_CLI") {
            self.redis.cli_bin = v;
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.proxy.base_url, "http://localhost:4000");
        assert_eq!(cfg.proxy.model, "local-glm-4-5-air-mlx");
        assert_eq!(cfg.proxy.max_tokens, 10);
        assert_eq!(cfg.proxy.timeout_secs, 60);
        assert!(cfg.proxy.api_key.is_empty());
        assert!(cfg.proxy.config_path.is_none());
        assert_eq!(cfg.redis.cli_bin, "redis-cli");
        assert!(cfg.redis.host.is_none());
        assert!(cfg.history.enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
            [proxy]
            base_url = "http://10.0.0.5:4000"
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.proxy.base_url, "http://10.0.0.5:4000");
        assert_eq!(cfg.proxy.api_key, "sk-test");
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.proxy.model, "local-glm-4-5-air-mlx");
        assert_eq!(cfg.redis.cli_bin, "redis-cli");
        assert!(cfg.history.enabled);
    }

    #[test]
    fn test_redis_section() {
        let cfg = Config::from_toml(
            r#"
            [redis]
            cli_bin = "/opt/redis/bin/redis-cli"
            host = "cache.internal"
            port = 6380
            db = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.redis.cli_bin, "/opt/redis/bin/redis-cli");
        assert_eq!(cfg.redis.host.as_deref(), Some("cache.internal"));
        assert_eq!(cfg.redis.port, Some(6380));
        assert_eq!(cfg.redis.db, Some(2));
    }

    #[test]
    fn test_history_disabled() {
        let cfg = Config::from_toml("[history]\nenabled = false\n").unwrap();
        assert!(!cfg.history.enabled);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = Config::from_toml("[proxy\nbase_url = ").unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_history_path_under_data_dir() {
        assert_eq!(
            Config::history_path(),
            Config::data_dir().join("history.jsonl")
        );
        assert_eq!(Config::data_dir(), Config::dir().join("data"));
    }
}
