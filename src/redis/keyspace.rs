//! Keyspace TTL scanning and summary statistics.
//!
//! Walks `KEYS *`, probes each key's TTL and type, and classifies
//! string-typed keys carrying a positive TTL as cache entries. TTLs of -1
//! (persistent) and -2 (already gone) are excluded from the summaries.

use tracing::debug;

use super::RedisCli;
use crate::error::Result;

/// Per-key TTL probing stops after this many keys so a scan of a busy shared
/// instance stays bounded. The full key count is still reported.
pub const SCAN_KEY_CAP: usize = 512;

/// Result of walking the keyspace.
#[derive(Debug, Clone, Default)]
pub struct KeyspaceScan {
    /// Total keys reported by `KEYS *`.
    pub total_keys: usize,
    /// Keys whose TTL was actually probed.
    pub scanned: usize,
    /// True when the scan stopped at [`SCAN_KEY_CAP`].
    pub truncated: bool,
    /// Positive TTLs observed, in scan order.
    pub ttls: Vec<i64>,
    /// String-typed keys with a positive TTL, the cache-entry candidates.
    pub cache_keys: Vec<String>,
}

impl KeyspaceScan {
    /// Enumerate keys and probe TTL and type for each, up to the cap.
    ///
    /// Individual per-key failures are skipped; only the initial `KEYS`
    /// listing can fail the scan.
    pub async fn run(cli: &RedisCli) -> Result<Self> {
        let keys = cli.keys("*").await?;
        let mut scan = KeyspaceScan {
            total_keys: keys.len(),
            truncated: keys.len() > SCAN_KEY_CAP,
            ..Default::default()
        };

        for key in keys.iter().take(SCAN_KEY_CAP) {
            let ttl = match cli.ttl(key).await {
                Ok(ttl) => ttl,
                Err(e) => {
                    debug!(key = %key, error = %e, "TTL probe failed, skipping key");
                    continue;
                }
            };
            scan.scanned += 1;
            if ttl <= 0 {
                continue;
            }
            scan.ttls.push(ttl);
            match cli.key_type(key).await {
                Ok(kind) if kind == "string" => scan.cache_keys.push(key.clone()),
                Ok(_) => {}
                Err(e) => debug!(key = %key, error = %e, "TYPE probe failed"),
            }
        }

        Ok(scan)
    }

    /// Summary statistics over the positive TTLs, or `None` when none exist.
    pub fn ttl_summary(&self) -> Option<TtlSummary> {
        TtlSummary::from_ttls(&self.ttls)
    }
}

/// Summary statistics over a set of positive TTLs.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlSummary {
    /// Number of TTLs summarized.
    pub count: usize,
    /// Shortest observed TTL in seconds.
    pub min: i64,
    /// Longest observed TTL in seconds.
    pub max: i64,
    /// Arithmetic mean in seconds.
    pub mean: f64,
    /// Most common TTL value; ties break toward the smaller value.
    pub mode: i64,
}

impl TtlSummary {
    /// Compute summary statistics. Returns `None` for an empty slice.
    pub fn from_ttls(ttls: &[i64]) -> Option<Self> {
        if ttls.is_empty() {
            return None;
        }
        let min = *ttls.iter().min().expect("non-empty");
        let max = *ttls.iter().max().expect("non-empty");
        let mean = ttls.iter().sum::<i64>() as f64 / ttls.len() as f64;

        let mut counts: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
        for ttl in ttls {
            *counts.entry(*ttl).or_insert(0) += 1;
        }
        let mode = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(value, _)| value)
            .expect("non-empty");

        Some(Self {
            count: ttls.len(),
            min,
            max,
            mean,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_empty() {
        assert_eq!(TtlSummary::from_ttls(&[]), None);
    }

    #[test]
    fn test_summary_single_value() {
        let s = TtlSummary::from_ttls(&[60]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.min, 60);
        assert_eq!(s.max, 60);
        assert_eq!(s.mean, 60.0);
        assert_eq!(s.mode, 60);
    }

    #[test]
    fn test_summary_mixed() {
        let s = TtlSummary::from_ttls(&[30, 60, 60, 300]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.min, 30);
        assert_eq!(s.max, 300);
        assert_eq!(s.mean, 112.5);
        assert_eq!(s.mode, 60);
    }

    #[test]
    fn test_summary_mode_tie_breaks_small() {
        let s = TtlSummary::from_ttls(&[120, 60]).unwrap();
        assert_eq!(s.mode, 60);
    }

    #[test]
    fn test_scan_summary_passthrough() {
        let scan = KeyspaceScan {
            total_keys: 3,
            scanned: 3,
            truncated: false,
            ttls: vec![10, 10, 20],
            cache_keys: vec!["a".into(), "b".into()],
        };
        let s = scan.ttl_summary().unwrap();
        assert_eq!(s.mode, 10);
        assert_eq!(s.count, 3);
    }

    #[test]
    fn test_scan_without_positive_ttls_has_no_summary() {
        let scan = KeyspaceScan {
            total_keys: 5,
            scanned: 5,
            ..Default::default()
        };
        assert!(scan.ttl_summary().is_none());
    }
}
