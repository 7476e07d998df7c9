//! Node Pool Implementation
//!
//! Partitions the known nodes into `sane` (eligible for traffic) and
//! `quarantined` (excluded until a health probe succeeds). Every
//! quarantined node owns at most one re-probe timer; the timer keeps
//! probing on a fixed interval until the node answers healthy or the pool
//! is shut down.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::node::{IntoNode, Node};
use super::strategy::SelectionStrategy;
use crate::error::{Error, Result};
use crate::health::HealthProbe;

// ============================================================================
// Pool State
// ============================================================================

#[derive(Default)]
struct PoolState {
    /// Every known node, in configuration order
    order: Vec<Node>,
    sane: HashSet<Node>,
    quarantined: HashSet<Node>,
    /// Pending re-probe per quarantined node
    timers: HashMap<Node, CancellationToken>,
}

impl PoolState {
    fn restore(&mut self, node: &Node) -> Result<()> {
        let stored = self
            .quarantined
            .take(node)
            .ok_or_else(|| Error::UnknownNode(node.to_string()))?;
        if let Some(timer) = self.timers.remove(node) {
            timer.cancel();
        }
        self.sane.insert(stored);
        Ok(())
    }

    fn cancel_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
    }
}

struct PoolInner {
    state: Mutex<PoolState>,
    strategy: SelectionStrategy,
    /// Round-robin rotation
    cursor: AtomicUsize,
    recheck_interval: Duration,
    prober: Arc<dyn HealthProbe>,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_timers();
    }
}

// ============================================================================
// Node Pool
// ============================================================================

/// Shared, cloneable handle to the node pool
#[derive(Clone)]
pub struct NodePool {
    inner: Arc<PoolInner>,
}

impl NodePool {
    /// Create a pool where every node starts sane.
    ///
    /// Duplicate URLs collapse into one node.
    pub fn new<I, N>(
        nodes: I,
        strategy: SelectionStrategy,
        recheck_interval: Duration,
        prober: Arc<dyn HealthProbe>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: IntoNode,
    {
        let mut state = PoolState::default();
        for node in nodes {
            let node = node.into_node()?;
            if state.sane.insert(node.clone()) {
                state.order.push(node);
            }
        }

        Ok(Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(state),
                strategy,
                cursor: AtomicUsize::new(0),
                recheck_interval,
                prober,
            }),
        })
    }

    /// Pick a sane node, or `None` when every node is quarantined
    pub fn get(&self) -> Option<Node> {
        let state = self.inner.lock();
        let candidates: Vec<&Node> = state
            .order
            .iter()
            .filter(|node| state.sane.contains(*node))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let pos = self.inner.strategy.pick(candidates.len(), &self.inner.cursor);
        Some(candidates[pos].clone())
    }

    /// Take a node out of rotation and (re)start its re-probe timer.
    ///
    /// Quarantining an already-quarantined node keeps it quarantined but
    /// restarts its probe clock.
    pub fn quarantine(&self, node: &Node) -> Result<()> {
        let mut state = self.inner.lock();

        let stored = match state.sane.take(node) {
            Some(stored) => {
                tracing::warn!(node = %stored, "Quarantining node");
                state.quarantined.insert(stored.clone());
                stored
            }
            None => match state.quarantined.get(node) {
                Some(stored) => {
                    tracing::debug!(node = %stored, "Node already quarantined, resetting re-probe timer");
                    stored.clone()
                }
                None => return Err(Error::UnknownNode(node.to_string())),
            },
        };

        // Cancel before replacing so two timers never race for one node.
        if let Some(previous) = state.timers.remove(&stored) {
            previous.cancel();
        }
        if let Some(timer) = self.schedule_recheck(stored.clone()) {
            state.timers.insert(stored, timer);
        }

        Ok(())
    }

    /// Put a quarantined node back into rotation and cancel its timer
    pub fn restore(&self, node: &Node) -> Result<()> {
        self.inner.lock().restore(node)?;
        tracing::info!(node = %node, "Node restored");
        Ok(())
    }

    /// Cancel every pending re-probe timer
    pub fn shutdown(&self) {
        self.inner.lock().cancel_timers();
    }

    pub fn sane(&self) -> Vec<Node> {
        let state = self.inner.lock();
        state
            .order
            .iter()
            .filter(|node| state.sane.contains(*node))
            .cloned()
            .collect()
    }

    pub fn quarantined(&self) -> Vec<Node> {
        let state = self.inner.lock();
        state
            .order
            .iter()
            .filter(|node| state.quarantined.contains(*node))
            .cloned()
            .collect()
    }

    /// Number of sane nodes
    pub fn len(&self) -> usize {
        self.inner.lock().sane.len()
    }

    /// True when no node is eligible for traffic
    pub fn is_empty(&self) -> bool {
        self.inner.lock().sane.is_empty()
    }

    /// Number of known nodes, sane or not
    pub fn total(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn contains(&self, node: &Node) -> bool {
        let state = self.inner.lock();
        state.sane.contains(node) || state.quarantined.contains(node)
    }

    pub fn is_quarantined(&self, node: &Node) -> bool {
        self.inner.lock().quarantined.contains(node)
    }

    pub fn has_timer(&self, node: &Node) -> bool {
        self.inner.lock().timers.contains_key(node)
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.inner.strategy
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            total: state.order.len(),
            sane: state.sane.len(),
            quarantined: state.quarantined.len(),
            strategy: self.inner.strategy,
        }
    }

    /// Spawn the one-shot-then-reschedule re-probe for `node`.
    ///
    /// Returns `None` outside a Tokio runtime: membership still changes,
    /// only the background recovery is skipped.
    fn schedule_recheck(&self, node: Node) -> Option<CancellationToken> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::debug!(node = %node, "No runtime available, re-probe not scheduled");
                return None;
            }
        };

        let token = CancellationToken::new();
        handle.spawn(recheck_loop(
            Arc::downgrade(&self.inner),
            node,
            token.clone(),
        ));
        Some(token)
    }
}

impl std::fmt::Debug for NodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("NodePool")
            .field("sane", &state.sane)
            .field("quarantined", &state.quarantined)
            .field("strategy", &self.inner.strategy)
            .finish()
    }
}

async fn recheck_loop(pool: Weak<PoolInner>, node: Node, token: CancellationToken) {
    loop {
        let (interval, prober) = match pool.upgrade() {
            Some(inner) => (inner.recheck_interval, Arc::clone(&inner.prober)),
            None => return,
        };

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let healthy = tokio::select! {
            _ = token.cancelled() => return,
            healthy = prober.probe(&node) => healthy,
        };

        if !healthy {
            tracing::debug!(node = %node, "Quarantined node still unhealthy");
            continue;
        }

        let Some(inner) = pool.upgrade() else { return };
        let mut state = inner.lock();
        // A newer quarantine or a restore got here first.
        if token.is_cancelled() {
            return;
        }
        if state.restore(&node).is_ok() {
            tracing::info!(node = %node, "Node restored by re-probe");
        }
        return;
    }
}

// ============================================================================
// Pool Statistics
// ============================================================================

/// Snapshot of pool membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub sane: usize,
    pub quarantined: usize,
    pub strategy: SelectionStrategy,
}

impl PoolStats {
    /// At least one node can take traffic
    pub fn is_healthy(&self) -> bool {
        self.sane > 0
    }
}

// ============================================================================
// Tests
// ============================================================================
