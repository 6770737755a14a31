//! TTL investigation: why do cache entries disappear?
//!
//! Walks the whole picture in one pass: server-side expiry configuration,
//! lifetime hit counters, the TTLs actually sitting on keys right now, the
//! eviction policy, and finally the cache block of the proxy's own config
//! file. No requests are issued; this probe only observes.

use super::ProbeContext;
use crate::error::Result;
use crate::redis::{KeyspaceScan, SCAN_KEY_CAP};

const SAMPLE_KEYS: usize = 5;
const KEY_DISPLAY_LEN: usize = 50;

pub async fn run(ctx: &ProbeContext) -> Result<()> {
    println!("Redis Cache TTL Investigation");
    println!("{}", "=".repeat(50));

    print_server_config(ctx).await;
    print_cache_stats(ctx).await;
    print_cache_entries(ctx).await;
    print_ttl_behavior(ctx).await;
    print_proxy_cache_settings(ctx);

    println!("\n{}", "=".repeat(50));
    println!("Investigation complete");
    Ok(())
}

/// Server configuration relevant to expiry.
async fn print_server_config(ctx: &ProbeContext) {
    println!("\n=== Redis Server Configuration ===");

    let survey = match ctx.redis.config_get("*").await {
        Ok(survey) => survey,
        Err(e) => {
            println!("[err] Could not read Redis config: {}", e);
            return;
        }
    };

    let maxmemory = match survey.maxmemory() {
        Some("0") | None => "unlimited".to_string(),
        Some(v) => v.to_string(),
    };
    println!("Max memory: {}", maxmemory);

    let settings = survey.expiry_settings();
    if settings.is_empty() {
        println!("No TTL/expiry settings reported.");
    } else {
        println!("\nTTL/expiry settings:");
        for (key, value) in settings {
            println!("  {}: {}", key, value);
        }
    }
}

/// Lifetime hit/miss counters and the overall hit rate.
async fn print_cache_stats(ctx: &ProbeContext) {
    println!("\n=== Current Cache Statistics ===");

    let stats = ctx.stats_or_empty().await;
    println!("Keyspace hits: {}", stats.keyspace_hits());
    println!("Keyspace misses: {}", stats.keyspace_misses());
    println!(
        "Total commands processed: {}",
        stats.total_commands_processed()
    );
    if let Some(rate) = stats.hit_rate() {
        println!("Cache hit rate: {:.2}%", rate);
    }
}

/// TTLs currently sitting on keys, summarized.
async fn print_cache_entries(ctx: &ProbeContext) {
    println!("\n=== Cache Entries Analysis ===");

    let scan = match KeyspaceScan::run(&ctx.redis).await {
        Ok(scan) => scan,
        Err(e) => {
            println!("[err] Could not scan keyspace: {}", e);
            return;
        }
    };

    println!("Total Redis keys: {}", scan.total_keys);
    if scan.truncated {
        println!(
            "(TTL probing capped at the first {} keys)",
            SCAN_KEY_CAP
        );
    }
    println!(
        "Cache-related keys (string type, TTL > 0): {}",
        scan.cache_keys.len()
    );

    if let Some(summary) = scan.ttl_summary() {
        println!("TTL range: {}s to {}s", summary.min, summary.max);
        println!("Average TTL: {:.1}s", summary.mean);
        println!("Most common TTL: {}s", summary.mode);
    }

    if !scan.cache_keys.is_empty() && scan.cache_keys.len() <= 10 {
        println!("\nSample cache keys:");
        for key in scan.cache_keys.iter().take(SAMPLE_KEYS) {
            match ctx.redis.ttl(key).await {
                Ok(ttl) => println!("  {} -> TTL: {}s", truncate_key(key), ttl),
                Err(_) => println!("  {} -> TTL: ?", truncate_key(key)),
            }
        }
    }
}

/// Eviction policy plus the usual suspects for short-lived entries.
async fn print_ttl_behavior(ctx: &ProbeContext) {
    println!("\n=== TTL Behavior Analysis ===");

    match ctx.redis.config_get("maxmemory-policy").await {
        Ok(survey) => {
            let policy = survey.get("maxmemory-policy").unwrap_or("none");
            println!("Maxmemory policy: {}", policy);
        }
        Err(e) => println!("[err] Could not read maxmemory-policy: {}", e),
    }

    println!("\nPossible causes of short TTLs:");
    println!("1. The proxy's cache configuration sets a low TTL (defaults can be very short)");
    println!("2. The Redis server has global expiry settings");
    println!("3. Cache entries are deliberately short-lived for data freshness");
    println!("4. A semantic cache with a similarity threshold may expire entries quickly");
}

/// The cache block of the proxy's own YAML config, scanned as plain text.
fn print_proxy_cache_settings(ctx: &ProbeContext) {
    println!("\n=== Proxy Cache Settings ===");

    match &ctx.proxy_config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(raw) => {
                let section = extract_cache_section(&raw);
                if section.is_empty() {
                    println!("No cache section found in {}", path.display());
                } else {
                    println!("Cache configuration found in {}:", path.display());
                    for line in &section {
                        println!("  {}", line);
                    }
                }
            }
            Err(e) => println!("[err] Could not read proxy config {}: {}", path.display(), e),
        },
        None => println!("No proxy config path set; skipping (set proxy.config_path or --proxy-config)."),
    }

    println!("\nRecommendation:");
    println!("To extend the cache TTL, add to the proxy config:");
    println!("  cache_params:");
    println!("    ttl: 3600  # seconds");
}

/// Lines of the first uncommented `cache:` block: the `cache:` line itself
/// plus every following indented line, trimmed. Empty when no block exists.
fn extract_cache_section(raw: &str) -> Vec<String> {
    let mut section = Vec::new();
    let mut in_section = false;
    for line in raw.lines() {
        if !in_section {
            if line.contains("cache:") && !line.trim_start().starts_with('#') {
                in_section = true;
                section.push(line.trim().to_string());
            }
        } else if line.starts_with(' ') || line.starts_with('\t') {
            section.push(line.trim().to_string());
        } else {
            break;
        }
    }
    section
}

fn truncate_key(key: &str) -> String {
    if key.len() <= KEY_DISPLAY_LEN {
        return key.to_string();
    }
    let mut end = KEY_DISPLAY_LEN;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &key[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = "\
model_list:
  - model_name: local
proxy_settings:
  cache: true
  cache_params:
    type: redis
    ttl: 60
router_settings:
  num_retries: 2
";

    #[test]
    fn test_extract_cache_section_nested() {
        let section = extract_cache_section(SAMPLE_YAML);
        // The `cache: true` line starts the block; the block runs to the end
        // of the indented region.
        assert_eq!(section[0], "cache: true");
        assert!(section.contains(&"ttl: 60".to_string()));
        assert!(!section.contains(&"router_settings:".to_string()));
    }

    #[test]
    fn test_extract_cache_section_top_level() {
        let raw = "cache:\n  type: redis\n  ttl: 120\nother:\n  x: 1\n";
        let section = extract_cache_section(raw);
        assert_eq!(section, vec!["cache:", "type: redis", "ttl: 120"]);
    }

    #[test]
    fn test_extract_cache_section_absent() {
        assert!(extract_cache_section("model_list:\n  - a\n").is_empty());
    }

    #[test]
    fn test_extract_cache_section_skips_commented() {
        let raw = "# cache:\n#   ttl: 5\nsettings:\n  cache:\n    ttl: 30\n";
        let section = extract_cache_section(raw);
        assert_eq!(section[0], "cache:");
        assert!(section.contains(&"ttl: 30".to_string()));
    }

    #[test]
    fn test_extract_cache_section_stops_at_dedent() {
        let raw = "cache:\n  ttl: 9\n\ntrailing: x\n";
        // The blank line ends the block.
        let section = extract_cache_section(raw);
        assert_eq!(section, vec!["cache:", "ttl: 9"]);
    }

    #[test]
    fn test_truncate_key_short() {
        assert_eq!(truncate_key("short"), "short");
    }

    #[test]
    fn test_truncate_key_long() {
        let long = "k".repeat(80);
        let t = truncate_key(&long);
        assert!(t.ends_with("..."));
        assert_eq!(t.len(), KEY_DISPLAY_LEN + 3);
    }
}
