//! Verdict logic, response comparison, and run-history persistence.
//!
//! The verdict matrix mirrors what a human reads off the raw numbers: new
//! keyspace hits prove the cache answered; identical replies without hits
//! point at key-generation or TTL trouble; anything else is no evidence.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::proxy::ChatObservation;
use crate::redis::StatsDelta;

/// Outcome of comparing counter movement with response behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheVerdict {
    /// The keyspace hit counter moved: the cache served at least one reply.
    HitsDetected,
    /// Replies were identical yet no hits registered.
    IdenticalNoHits,
    /// Replies differ and counters did not move.
    NoEvidence,
}

impl CacheVerdict {
    /// Judge a request sequence. `identical` is `None` when fewer than two
    /// replies carried content.
    pub fn judge(delta: &StatsDelta, identical: Option<bool>) -> Self {
        if delta.hits > 0 {
            CacheVerdict::HitsDetected
        } else if identical == Some(true) {
            CacheVerdict::IdenticalNoHits
        } else {
            CacheVerdict::NoEvidence
        }
    }

    /// Stable label used in history records.
    pub fn label(&self) -> &'static str {
        match self {
            CacheVerdict::HitsDetected => "hits-detected",
            CacheVerdict::IdenticalNoHits => "identical-no-hits",
            CacheVerdict::NoEvidence => "no-evidence",
        }
    }

    /// Print the interpretation block for this verdict.
    pub fn print_interpretation(&self, delta: &StatsDelta) {
        match self {
            CacheVerdict::HitsDetected => {
                println!("[ok] Cache hits detected! Caching is working correctly.");
                println!("     {} hit(s) registered across the request sequence", delta.hits);
            }
            CacheVerdict::IdenticalNoHits => {
                println!("[warn] All responses are identical but no cache hits were detected.");
                println!("       This could indicate:");
                println!("       1. Cache entries expire before the next request (TTL too short)");
                println!("       2. Cache keys are generated differently than expected");
                println!("       3. The upstream model deterministically repeats itself");
            }
            CacheVerdict::NoEvidence => {
                println!("[err] Responses differ and no cache hits were detected.");
                println!("      The cache is either not in the request path or its TTL expired.");
            }
        }
    }
}

/// Whether all successful replies carry the same trimmed content.
///
/// Returns `None` when fewer than two replies had content to compare.
pub fn identical_contents(observations: &[Option<ChatObservation>]) -> Option<bool> {
    let contents: Vec<&str> = observations
        .iter()
        .flatten()
        .filter_map(|o| o.content.as_deref())
        .map(str::trim)
        .collect();
    if contents.len() < 2 {
        return None;
    }
    Some(contents.windows(2).all(|w| w[0] == w[1]))
}

/// One line of the run-history file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// When the probe finished.
    pub at: DateTime<Utc>,
    /// Probe name, e.g. `basic` or `burst`.
    pub probe: String,
    /// Requests issued during the sequence.
    pub requests: usize,
    /// New keyspace hits observed.
    pub hits: u64,
    /// New keyspace misses observed.
    pub misses: u64,
    /// Verdict label.
    pub verdict: String,
}

impl HistoryRecord {
    pub fn new(probe: &str, requests: usize, delta: &StatsDelta, verdict: CacheVerdict) -> Self {
        Self {
            at: Utc::now(),
            probe: probe.to_string(),
            requests,
            hits: delta.hits,
            misses: delta.misses,
            verdict: verdict.label().to_string(),
        }
    }
}

/// Append one record to the history file. Best-effort: failures are logged
/// and never fail the probe.
pub fn append_history(path: &Path, record: &HistoryRecord) {
    let line = match serde_json::to_string(record) {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "could not serialize history record");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "could not create history directory");
            return;
        }
    }
    use std::io::Write;
    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| writeln!(f, "{}", line));
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "could not append history record");
    }
}

/// Number of records in the history file; 0 when it does not exist.
pub fn history_len(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|raw| raw.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn obs(content: Option<&str>) -> Option<ChatObservation> {
        Some(ChatObservation {
            model: "m".to_string(),
            content: content.map(String::from),
            total_tokens: 5,
            elapsed: Duration::from_millis(10),
        })
    }

    fn delta(hits: u64, misses: u64) -> StatsDelta {
        StatsDelta {
            hits,
            misses,
            commands: hits + misses,
        }
    }

    #[test]
    fn test_verdict_hits_win() {
        let v = CacheVerdict::judge(&delta(2, 1), Some(false));
        assert_eq!(v, CacheVerdict::HitsDetected);
    }

    #[test]
    fn test_verdict_identical_without_hits() {
        let v = CacheVerdict::judge(&delta(0, 3), Some(true));
        assert_eq!(v, CacheVerdict::IdenticalNoHits);
    }

    #[test]
    fn test_verdict_no_evidence() {
        assert_eq!(
            CacheVerdict::judge(&delta(0, 3), Some(false)),
            CacheVerdict::NoEvidence
        );
        assert_eq!(
            CacheVerdict::judge(&delta(0, 0), None),
            CacheVerdict::NoEvidence
        );
    }

    #[test]
    fn test_verdict_labels_stable() {
        assert_eq!(CacheVerdict::HitsDetected.label(), "hits-detected");
        assert_eq!(CacheVerdict::IdenticalNoHits.label(), "identical-no-hits");
        assert_eq!(CacheVerdict::NoEvidence.label(), "no-evidence");
    }

    #[test]
    fn test_identical_contents_true() {
        let seq = vec![obs(Some("Paris")), obs(Some(" Paris ")), obs(Some("Paris"))];
        assert_eq!(identical_contents(&seq), Some(true));
    }

    #[test]
    fn test_identical_contents_false() {
        let seq = vec![obs(Some("Paris")), obs(Some("London"))];
        assert_eq!(identical_contents(&seq), Some(false));
    }

    #[test]
    fn test_identical_contents_skips_failures() {
        // A failed request (None) and a contentless reply don't block the
        // comparison of the remaining two.
        let seq = vec![obs(Some("Paris")), None, obs(None), obs(Some("Paris"))];
        assert_eq!(identical_contents(&seq), Some(true));
    }

    #[test]
    fn test_identical_contents_needs_two() {
        assert_eq!(identical_contents(&[obs(Some("Paris"))]), None);
        assert_eq!(identical_contents(&[]), None);
        assert_eq!(identical_contents(&[None, obs(None)]), None);
    }

    #[test]
    fn test_history_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("history.jsonl");

        let record = HistoryRecord::new("basic", 3, &delta(1, 2), CacheVerdict::HitsDetected);
        append_history(&path, &record);
        append_history(&path, &record);

        assert_eq!(history_len(&path), 2);
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: HistoryRecord = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.probe, "basic");
        assert_eq!(parsed.hits, 1);
        assert_eq!(parsed.misses, 2);
        assert_eq!(parsed.verdict, "hits-detected");
    }

    #[test]
    fn test_history_len_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(history_len(&dir.path().join("absent.jsonl")), 0);
    }

    #[test]
    fn test_append_history_bad_path_does_not_panic() {
        // Appending under a path whose parent is a file must fail quietly.
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let record = HistoryRecord::new("basic", 3, &delta(0, 0), CacheVerdict::NoEvidence);
        append_history(&blocker.join("history.jsonl"), &record);
    }
}
