//! Parsers for `INFO stats` and `CONFIG GET` output, plus counter deltas.
//!
//! Both commands emit line-oriented text: `INFO` uses `key:value` lines with
//! `#` section headers, `CONFIG GET` alternates key and value lines. Values
//! stay as strings internally; counter accessors coerce to `u64` and treat
//! anything missing or non-numeric as zero.

use std::collections::HashMap;

/// Point-in-time view of the `INFO stats` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    values: HashMap<String, String>,
}

impl StatsSnapshot {
    /// Parse raw `INFO stats` output.
    pub fn parse(raw: &str) -> Self {
        let mut values = HashMap::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { values }
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Numeric counter lookup; missing or non-numeric values read as 0.
    pub fn counter(&self, key: &str) -> u64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    pub fn keyspace_hits(&self) -> u64 {
        self.counter("keyspace_hits")
    }

    pub fn keyspace_misses(&self) -> u64 {
        self.counter("keyspace_misses")
    }

    pub fn total_commands_processed(&self) -> u64 {
        self.counter("total_commands_processed")
    }

    /// Lifetime hit rate as a percentage, or `None` before any keyspace access.
    pub fn hit_rate(&self) -> Option<f64> {
        let hits = self.keyspace_hits();
        let misses = self.keyspace_misses();
        let total = hits + misses;
        if total == 0 {
            return None;
        }
        Some(hits as f64 / total as f64 * 100.0)
    }

    /// Counter movement between two snapshots.
    ///
    /// Saturating: a counter reset between snapshots reads as zero movement.
    pub fn delta(before: &Self, after: &Self) -> StatsDelta {
        StatsDelta {
            hits: after.keyspace_hits().saturating_sub(before.keyspace_hits()),
            misses: after
                .keyspace_misses()
                .saturating_sub(before.keyspace_misses()),
            commands: after
                .total_commands_processed()
                .saturating_sub(before.total_commands_processed()),
        }
    }

    /// Number of parsed entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Keyspace counter movement across a request sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    /// New keyspace hits observed.
    pub hits: u64,
    /// New keyspace misses observed.
    pub misses: u64,
    /// New commands processed, for sanity-checking that traffic happened.
    pub commands: u64,
}

/// Parsed `CONFIG GET` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSurvey {
    values: HashMap<String, String>,
}

impl ConfigSurvey {
    /// Parse `CONFIG GET` output, which alternates key and value lines.
    ///
    /// A trailing key with no value line is dropped.
    pub fn parse(raw: &str) -> Self {
        let lines: Vec<&str> = raw.lines().map(str::trim).collect();
        let mut values = HashMap::new();
        for pair in lines.chunks_exact(2) {
            if !pair[0].is_empty() {
                values.insert(pair[0].to_string(), pair[1].to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The `maxmemory` setting, if the server reported one.
    pub fn maxmemory(&self) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.to_lowercase().contains("maxmemory") && !k.contains("policy"))
            .map(|(_, v)| v.as_str())
    }

    /// Settings whose names mention TTL or expiry, sorted by key.
    pub fn expiry_settings(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .values
            .iter()
            .filter(|(k, _)| {
                let k = k.to_lowercase();
                k.contains("ttl") || k.contains("expire")
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
