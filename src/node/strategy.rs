//! Which sane node serves the next attempt
//!
//! The pool hands a strategy the number of sane candidates (in
//! configuration order) and gets back an index into them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Cycle through the sane nodes
    #[default]
    RoundRobin,
    Random,
    /// Always the first sane node, so traffic only moves on quarantine
    Failover,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
            Self::Failover => "failover",
        }
    }

    /// Index of the chosen candidate, `candidates` must be non-zero.
    ///
    /// `cursor` is the pool's rotation counter; only round robin advances it.
    pub(crate) fn pick(self, candidates: usize, cursor: &AtomicUsize) -> usize {
        debug_assert!(candidates > 0);
        match self {
            Self::RoundRobin => cursor.fetch_add(1, Ordering::Relaxed) % candidates,
            Self::Random => rand::thread_rng().gen_range(0..candidates),
            Self::Failover => 0,
        }
    }
}

impl FromStr for SelectionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            "failover" | "first" => Ok(Self::Failover),
            _ => Err(Error::Config(format!("unknown selection strategy `{s}`"))),
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
