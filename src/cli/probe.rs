//! Probe command handlers.
//!
//! Every probe starts with a Redis connectivity check; an unreachable store
//! is the one fatal condition, surfaced as a non-zero exit. Everything after
//! that is printed and survived.

use anyhow::{bail, Context, Result};

use cacheprobe::config::Config;
use cacheprobe::probes::{self, ProbeContext, DEFAULT_PROMPT};
use cacheprobe::proxy::ProxyClient;
use cacheprobe::redis::RedisCli;

/// Which probe sequence to run.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ProbeKind {
    Basic,
    Timed,
    Burst,
    Ttl,
}

pub(crate) async fn cmd_probe(
    kind: ProbeKind,
    config: &Config,
    prompt: Option<&str>,
) -> Result<()> {
    let redis = RedisCli::from_config(&config.redis);
    if !redis.ping().await {
        bail!(
            "Redis is not accessible via '{}' (is the server running?)",
            redis.bin()
        );
    }
    println!("[ok] Redis connection OK");

    let proxy = ProxyClient::from_config(&config.proxy)
        .context("failed to build proxy HTTP client")?;

    let ctx = ProbeContext {
        proxy,
        redis,
        prompt: prompt.unwrap_or(DEFAULT_PROMPT).to_string(),
        proxy_config_path: config.proxy.config_path.clone(),
        history_path: config.history.enabled.then(Config::history_path),
    };

    match kind {
        ProbeKind::Basic => probes::basic::run(&ctx).await?,
        ProbeKind::Timed => probes::timed::run(&ctx).await?,
        ProbeKind::Burst => probes::burst::run(&ctx).await?,
        ProbeKind::Ttl => probes::ttl::run(&ctx).await?,
    }

    Ok(())
}

/// One-shot dump of the cache counters.
pub(crate) async fn cmd_stats(config: &Config) -> Result<()> {
    let redis = RedisCli::from_config(&config.redis);
    if !redis.ping().await {
        bail!(
            "Redis is not accessible via '{}' (is the server running?)",
            redis.bin()
        );
    }

    let stats = redis
        .info_stats()
        .await
        .context("failed to read Redis stats")?;

    println!("Redis Cache Statistics");
    println!("======================");
    println!("Keyspace hits:            {}", stats.keyspace_hits());
    println!("Keyspace misses:          {}", stats.keyspace_misses());
    println!(
        "Total commands processed: {}",
        stats.total_commands_processed()
    );
    match stats.hit_rate() {
        Some(rate) => println!("Cache hit rate:           {:.2}%", rate),
        None => println!("Cache hit rate:           n/a (no keyspace traffic yet)"),
    }

    Ok(())
}
