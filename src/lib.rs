//! cacheprobe: external diagnostics for a Redis-backed LLM proxy cache.
//!
//! The library implements observation, not infrastructure. Redis is reached
//! through the `redis-cli` binary, the proxy over plain HTTP; all this crate
//! adds is the probing sequences, the output parsers, and the verdicts.
//!
//! Modules:
//! - [`config`]: TOML settings and path resolution
//! - [`redis`]: redis-cli subprocess wrapper and output parsers
//! - [`proxy`]: chat-completions HTTP client
//! - [`probes`]: the diagnostic sequences themselves
//! - [`report`]: verdicts, response comparison, run history

pub mod config;
pub mod error;
pub mod probes;
pub mod proxy;
pub mod redis;
pub mod report;
