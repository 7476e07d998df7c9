//! Quarantine guard
//!
//! A coarse supervisory sweep that runs next to the per-node timers: every
//! interval it probes all quarantined nodes concurrently and restores the
//! ones that answer healthy. If a timer is ever lost, the cluster still
//! heals within one sweep.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::HealthProbe;
use crate::node::{Node, NodePool};

pub struct QuarantineGuard {
    pool: NodePool,
    prober: Arc<dyn HealthProbe>,
    interval: Duration,
}

impl QuarantineGuard {
    pub fn new(pool: NodePool, prober: Arc<dyn HealthProbe>, interval: Duration) -> Self {
        Self {
            pool,
            prober,
            interval,
        }
    }

    /// Probe every quarantined node once and restore the healthy ones.
    ///
    /// Returns the nodes this sweep restored.
    pub async fn sweep(&self) -> Vec<Node> {
        let quarantined = self.pool.quarantined();
        if quarantined.is_empty() {
            return Vec::new();
        }

        tracing::debug!(count = quarantined.len(), "Sweeping quarantined nodes");

        let checks = quarantined.into_iter().map(|node| {
            let prober = Arc::clone(&self.prober);
            async move {
                let healthy = prober.probe(&node).await;
                (node, healthy)
            }
        });

        let mut restored = Vec::new();
        for (node, healthy) in join_all(checks).await {
            if !healthy {
                continue;
            }
            // A per-node timer may have restored it while we were probing.
            match self.pool.restore(&node) {
                Ok(()) => restored.push(node),
                Err(err) => tracing::debug!(node = %node, error = %err, "Node no longer quarantined"),
            }
        }
        restored
    }

    /// Run the sweep loop until the returned handle is shut down or dropped
    pub fn spawn(self) -> GuardHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    restored = self.sweep() => {
                        if !restored.is_empty() {
                            tracing::info!(count = restored.len(), "Quarantine guard restored nodes");
                        }
                    }
                }
            }
            tracing::debug!("Quarantine guard stopped");
        });

        GuardHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owner of a running guard; cancels it on drop
pub struct GuardHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl GuardHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop to exit
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
