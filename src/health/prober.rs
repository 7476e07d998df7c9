//! Single-node liveness probe

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dispatch::Transport;
use crate::node::Node;
use crate::utils::with_timeout;

/// Path every node answers liveness checks on
pub const HEALTH_ENDPOINT: &str = "/health";

/// Answers whether a node is fit to take traffic.
///
/// A failed probe is an ordinary outcome, so implementations report it
/// through the boolean and never error.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, node: &Node) -> bool;
}

/// Probes `GET {node}/health` and expects `{"ok": true}`
#[derive(Clone)]
pub struct HttpProber {
    transport: Arc<Transport>,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(transport: Arc<Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, node: &Node) -> Result<bool, reqwest::Error> {
        let response = self
            .transport
            .client_for(node)
            .get(node.endpoint_url(HEALTH_ENDPOINT))
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(node = %node, status = %response.status(), "Health probe got non-200");
            return Ok(false);
        }

        let body = response.bytes().await?;
        Ok(is_healthy_body(&body))
    }
}

#[async_trait]
impl HealthProbe for HttpProber {
    async fn probe(&self, node: &Node) -> bool {
        // the request carries its own timeout; the outer bound also covers
        // reading the body
        match with_timeout(self.timeout, self.fetch(node)).await {
            Ok(healthy) => healthy,
            Err(err) => {
                tracing::debug!(node = %node, error = %err, "Health probe failed");
                false
            }
        }
    }
}

fn is_healthy_body(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .map(|value| value == json!({"ok": true}))
        .unwrap_or(false)
}
