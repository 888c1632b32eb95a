//! # Riot Recap
//!
//! Pulls League of Legends match history from the Riot Games API and turns
//! it into a player statistics report.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (regions, players, matches, reports)
//! - **fetch**: Rate-limited, retrying HTTP with a circuit breaker
//! - **riot**: Riot API endpoints (account, summoner, match history)
//! - **calculate**: Statistics aggregation and derived metrics
//! - **storage**: Local match archive (JSONL) and JSON documents
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod riot;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "2m", "90s", "500ms").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(n) = s.strip_suffix("ms") {
        return n.trim().parse().ok().map(Duration::from_millis);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}
