//! Timed cache check: identical requests with widening delays.
//!
//! Request one populates the cache, request two follows after the store has
//! had two seconds to settle, request three after five more. Response times
//! are reported alongside the counter delta because cache hits should be
//! visibly faster than upstream completions.

use std::time::Duration;

use tokio::time::sleep;

use super::{print_response_times, ProbeContext};
use crate::error::Result;
use crate::redis::StatsSnapshot;
use crate::report::{identical_contents, CacheVerdict, HistoryRecord};

const SETTLE_PAUSE: Duration = Duration::from_secs(2);
const REVISIT_PAUSE: Duration = Duration::from_secs(5);

pub async fn run(ctx: &ProbeContext) -> Result<()> {
    println!("Testing caching with prompt: '{}'", ctx.prompt);
    println!("{}", "=".repeat(70));

    let before = ctx.stats_or_empty().await;
    println!("Initial cache hits: {}", before.keyspace_hits());
    println!("Initial cache misses: {}", before.keyspace_misses());

    let mut observations = Vec::with_capacity(3);

    println!("\n--- Request 1: first time (cache miss expected) ---");
    observations.push(ctx.request(false).await);

    // Give the proxy a moment to write the entry before re-asking.
    sleep(SETTLE_PAUSE).await;

    println!("\n--- Request 2: identical, immediate (cache hit expected) ---");
    observations.push(ctx.request(false).await);

    sleep(REVISIT_PAUSE).await;

    println!("\n--- Request 3: identical, after delay (cache hit if TTL allows) ---");
    observations.push(ctx.request(false).await);

    let after = ctx.stats_or_empty().await;

    println!("\n{}", "=".repeat(70));
    println!("CACHE ANALYSIS");
    println!("{}", "=".repeat(70));

    let delta = StatsSnapshot::delta(&before, &after);
    println!("Cache hits: {}", delta.hits);
    println!("Cache misses: {}", delta.misses);

    println!("\nResponse contents:");
    for (i, obs) in observations.iter().enumerate() {
        match obs {
            Some(obs) => println!(
                "  Request {}: '{}'",
                i + 1,
                obs.content.as_deref().unwrap_or("")
            ),
            None => println!("  Request {}: failed", i + 1),
        }
    }

    let identical = identical_contents(&observations);
    match identical {
        Some(flag) => println!("\nAll responses identical: {}", flag),
        None => println!("\nSome requests failed; cannot compare responses."),
    }

    print_response_times(&observations);

    println!("\nInterpretation:");
    let verdict = CacheVerdict::judge(&delta, identical);
    verdict.print_interpretation(&delta);

    // Keyspace size gives a rough idea of whether entries are being stored.
    match ctx.redis.keys("*").await {
        Ok(keys) => println!("\nTotal Redis keys: {}", keys.len()),
        Err(e) => println!("\n[err] Could not list Redis keys: {}", e),
    }

    ctx.record(HistoryRecord::new("timed", 3, &delta, verdict));

    Ok(())
}
