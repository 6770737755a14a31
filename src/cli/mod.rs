//! Command-line interface definitions and dispatch.

mod probe;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cacheprobe::config::Config;

/// Cache diagnostics for a Redis-backed LLM proxy.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Proxy base URL, e.g. http://localhost:4000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token for the proxy
    #[arg(long, env = "CACHEPROBE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name to request
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Prompt sent on every request
    #[arg(long, global = true)]
    pub prompt: Option<String>,

    /// redis-cli binary name or path
    #[arg(long, global = true)]
    pub redis_cli: Option<String>,

    /// Path to the proxy's YAML config file
    #[arg(long, global = true)]
    pub proxy_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available diagnostics.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Three identical requests one second apart, then a hit/miss verdict
    Basic,
    /// Identical requests with 2s and 5s spacing plus timing analysis
    Timed,
    /// Identical requests 100ms apart, testing the short-TTL theory
    Burst,
    /// Investigate TTL settings, keyspace TTLs, and the proxy cache config
    Ttl,
    /// One-shot dump of the Redis cache counters
    Stats,
    /// Show configuration, paths, and external tool availability
    Status,
}

/// Load config, fold in CLI overrides, and run the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("failed to load configuration")?;
    apply_overrides(&mut config, &cli);

    let prompt = cli.prompt.as_deref();
    match cli.command {
        Commands::Basic => probe::cmd_probe(probe::ProbeKind::Basic, &config, prompt).await,
        Commands::Timed => probe::cmd_probe(probe::ProbeKind::Timed, &config, prompt).await,
        Commands::Burst => probe::cmd_probe(probe::ProbeKind::Burst, &config, prompt).await,
        Commands::Ttl => probe::cmd_probe(probe::ProbeKind::Ttl, &config, prompt).await,
        Commands::Stats => probe::cmd_stats(&config).await,
        Commands::Status => status::cmd_status(&config),
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(v) = &cli.base_url {
        config.proxy.base_url = v.clone();
    }
    if let Some(v) = &cli.api_key {
        config.proxy.api_key = v.clone();
    }
    if let Some(v) = &cli.model {
        config.proxy.model = v.clone();
    }
    if let Some(v) = &cli.redis_cli {
        config.redis.cli_bin = v.clone();
    }
    if let Some(v) = &cli.proxy_config {
        config.proxy.config_path = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_applied() {
        let cli = Cli::parse_from([
            "cacheprobe",
            "--base-url",
            "http://10.1.2.3:4000",
            "--model",
            "gpt-test",
            "--redis-cli",
            "/opt/bin/redis-cli",
            "basic",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.proxy.base_url, "http://10.1.2.3:4000");
        assert_eq!(config.proxy.model, "gpt-test");
        assert_eq!(config.redis.cli_bin, "/opt/bin/redis-cli");
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let cli = Cli::parse_from(["cacheprobe", "status"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.proxy.base_url, "http://localhost:4000");
        assert_eq!(config.redis.cli_bin, "redis-cli");
    }

    #[test]
    fn test_proxy_config_override() {
        let cli = Cli::parse_from([
            "cacheprobe",
            "--proxy-config",
            "/etc/proxy/config.yaml",
            "ttl",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(
            config.proxy.config_path.as_deref(),
            Some(std::path::Path::new("/etc/proxy/config.yaml"))
        );
    }
}
