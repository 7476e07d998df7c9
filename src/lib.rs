//! Typesense Dispatch
//!
//! An async client for multi-node Typesense clusters. Every request goes
//! through a [`Dispatcher`] that:
//!
//! - picks a sane node (round robin by default)
//! - quarantines a node on connection failures, status 0, 500 and 503
//! - retries on another node within a fixed attempt budget
//! - re-probes quarantined nodes and restores them once `/health` answers
//!   `{"ok": true}`

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod logging;
pub mod node;
pub mod resources;
pub mod utils;

pub use client::Client;
pub use config::Configuration;
pub use dispatch::{Body, Dispatcher, Payload, RequestOptions};
pub use error::{Error, Result};
pub use health::{HealthProbe, HttpProber, QuarantineGuard};
pub use node::{Node, NodePool, SelectionStrategy, TlsPolicy};
