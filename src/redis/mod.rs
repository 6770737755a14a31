//! Thin subprocess wrapper around the `redis-cli` binary.
//!
//! The probes observe an external Redis instance; they never speak RESP
//! themselves. Every operation spawns `redis-cli`, waits for it to exit, and
//! parses its text output. Non-zero exits and spawn failures surface as
//! [`ProbeError::Redis`].

use tokio::process::Command;
use tracing::debug;

use crate::config::RedisConfig;
use crate::error::{ProbeError, Result};

pub mod keyspace;
pub mod stats;

pub use keyspace::{KeyspaceScan, TtlSummary, SCAN_KEY_CAP};
pub use stats::{ConfigSurvey, StatsDelta, StatsSnapshot};

/// Handle for invoking redis-cli with fixed connection arguments.
#[derive(Debug, Clone)]
pub struct RedisCli {
    bin: String,
    host: Option<String>,
    port: Option<u16>,
    db: Option<u32>,
}

impl RedisCli {
    /// Build from the `[redis]` config section.
    pub fn from_config(cfg: &RedisConfig) -> Self {
        Self {
            bin: cfg.cli_bin.clone(),
            host: cfg.host.clone(),
            port: cfg.port,
            db: cfg.db,
        }
    }

    /// The binary this handle invokes.
    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Whether the binary resolves on PATH. Used by the status report only;
    /// probes just attempt the spawn and report the failure.
    pub fn is_available(&self) -> bool {
        std::process::Command::new("which")
            .arg(&self.bin)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(host) = &self.host {
            args.push("-h".to_string());
            args.push(host.clone());
        }
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(db) = self.db {
            args.push("-n".to_string());
            args.push(db.to_string());
        }
        args
    }

    /// Run one redis-cli command and capture stdout.
    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(bin = %self.bin, command = %args.join(" "), "invoking redis-cli");
        let output = Command::new(&self.bin)
            .args(self.connection_args())
            .args(args)
            .output()
            .await
            .map_err(|e| ProbeError::Redis(format!("failed to run {}: {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Redis(format!(
                "{} {} failed: {}",
                self.bin,
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `PING`. True only on a clean `PONG` reply.
    pub async fn ping(&self) -> bool {
        match self.run(&["ping"]).await {
            Ok(out) => out.trim() == "PONG",
            Err(e) => {
                debug!(error = %e, "ping failed");
                false
            }
        }
    }

    /// `INFO stats`, parsed into a snapshot.
    pub async fn info_stats(&self) -> Result<StatsSnapshot> {
        Ok(StatsSnapshot::parse(&self.run(&["info", "stats"]).await?))
    }

    /// `KEYS <pattern>`. Empty output means zero keys, not one empty key.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let out = self.run(&["keys", pattern]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// `TTL <key>`: seconds remaining, -1 for persistent, -2 for missing.
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        let out = self.run(&["ttl", key]).await?;
        out.trim()
            .parse()
            .map_err(|_| ProbeError::Parse(format!("unexpected TTL reply: {:?}", out.trim())))
    }

    /// `TYPE <key>`: the value type name, e.g. `string` or `hash`.
    pub async fn key_type(&self, key: &str) -> Result<String> {
        Ok(self.run(&["type", key]).await?.trim().to_string())
    }

    /// `CONFIG GET <glob>`, parsed into a survey of key/value pairs.
    pub async fn config_get(&self, glob: &str) -> Result<ConfigSurvey> {
        Ok(ConfigSurvey::parse(&self.run(&["config", "get", glob]).await?))
    }
}
