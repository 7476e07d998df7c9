//! Node Module
//!
//! Cluster endpoints and the pool that tracks which of them may take
//! traffic.
//!
//! # Features
//! - Immutable, value-compared [`Node`] parsed from a URL
//! - [`NodePool`] partitioning nodes into sane and quarantined sets
//! - Per-node re-probe timers that restore a node once it is healthy again
//! - Round-robin, random and failover selection among sane nodes
//!
//! # Example
//! ```ignore
//! let pool = NodePool::new(
//!     ["http://localhost:8108", "http://localhost:8109"],
//!     SelectionStrategy::RoundRobin,
//!     Duration::from_secs(60),
//!     prober,
//! )?;
//!
//! if let Some(node) = pool.get() {
//!     println!("Using node: {}", node);
//! }
//! ```

mod node;
mod pool;
mod strategy;

pub use node::{IntoNode, Node, TlsPolicy};
pub use pool::{NodePool, PoolStats};
pub use strategy::SelectionStrategy;
