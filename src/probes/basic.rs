//! Baseline cache check: three identical requests, one second apart.
//!
//! The simplest possible exercise of the cache path. If the proxy caches at
//! all, requests two and three should register as keyspace hits.

use std::time::Duration;

use tokio::time::sleep;

use super::ProbeContext;
use crate::error::Result;
use crate::redis::StatsSnapshot;
use crate::report::{identical_contents, CacheVerdict, HistoryRecord};

const REQUESTS: usize = 3;
const PAUSE: Duration = Duration::from_secs(1);

pub async fn run(ctx: &ProbeContext) -> Result<()> {
    println!("Testing caching with prompt: '{}'", ctx.prompt);
    println!("{}", "=".repeat(60));

    let before = ctx.stats_or_empty().await;

    let mut observations = Vec::with_capacity(REQUESTS);
    for i in 0..REQUESTS {
        println!("\n--- Request {} ---", i + 1);
        observations.push(ctx.request(false).await);
        sleep(PAUSE).await;
    }

    let after = ctx.stats_or_empty().await;

    println!("\n{}", "=".repeat(60));
    println!("CACHE ANALYSIS");
    println!("{}", "=".repeat(60));

    let delta = StatsSnapshot::delta(&before, &after);
    println!("Cache hits: {}", delta.hits);
    println!("Cache misses: {}", delta.misses);

    if delta.hits > 0 {
        println!("[ok] Caching is working! Found cache hits.");
    } else {
        println!("No cache hits found. Caching may not be working.");
    }

    // Identity of the first two replies is a secondary caching signal.
    let identical = identical_contents(&observations[..2.min(observations.len())]);
    match identical {
        Some(true) => println!("[ok] Responses are identical, which suggests caching worked."),
        Some(false) => println!("Responses differ, which may indicate no cache hits."),
        None => println!("Not enough successful responses to compare."),
    }

    let verdict = CacheVerdict::judge(&delta, identical_contents(&observations));
    ctx.record(HistoryRecord::new("basic", REQUESTS, &delta, verdict));

    Ok(())
}
