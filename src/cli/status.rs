//! Status command handler.

use anyhow::Result;

use cacheprobe::config::Config;
use cacheprobe::redis::RedisCli;
use cacheprobe::report::history_len;

/// Show configuration, resolved paths, and external tool availability.
pub(crate) fn cmd_status(config: &Config) -> Result<()> {
    println!("CacheProbe Status");
    println!("=================");
    println!();

    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Configuration");
    println!("-------------");
    println!("  Config directory: {:?}", Config::dir());
    println!("  Config file:      {:?}", Config::path());
    println!("  Config exists:    {}", Config::path().exists());
    println!();

    println!("Proxy");
    println!("-----");
    println!("  Base URL:  {}", config.proxy.base_url);
    println!("  Model:     {}", config.proxy.model);
    println!(
        "  API key:   {}",
        if config.proxy.api_key.is_empty() {
            "not set"
        } else {
            "configured"
        }
    );
    println!("  Timeout:   {}s", config.proxy.timeout_secs);
    match &config.proxy.config_path {
        Some(path) => println!("  Config:    {:?} (exists: {})", path, path.exists()),
        None => println!("  Config:    not set"),
    }
    println!();

    println!("Redis");
    println!("-----");
    let redis = RedisCli::from_config(&config.redis);
    println!("  Binary:    {}", redis.bin());
    println!(
        "  Available: {}",
        if redis.is_available() {
            "yes"
        } else {
            "no (not on PATH)"
        }
    );
    if let Some(host) = &config.redis.host {
        println!("  Host:      {}", host);
    }
    if let Some(port) = config.redis.port {
        println!("  Port:      {}", port);
    }
    if let Some(db) = config.redis.db {
        println!("  Database:  {}", db);
    }
    println!();

    println!("History");
    println!("-------");
    println!(
        "  Enabled: {}",
        if config.history.enabled { "yes" } else { "no" }
    );
    let history = Config::history_path();
    println!("  File:    {:?}", history);
    println!("  Records: {}", history_len(&history));
    println!();

    Ok(())
}
