//! Cluster-level endpoints

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::fetch;
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;
use crate::health::HEALTH_ENDPOINT;

/// `/multi_search`
#[derive(Debug, Clone, Copy)]
pub struct MultiSearch<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> MultiSearch<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// `searches` is the `{"searches": [...]}` document; `params` are
    /// common parameters applied to every search
    pub async fn perform<S: Serialize + ?Sized>(
        &self,
        searches: &S,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let options = RequestOptions::new()
            .json(searches)?
            .params(params.iter().copied());
        self.dispatcher
            .post("/multi_search", options)
            .await?
            .into_json()
    }
}

/// `/operations/{name}`, e.g. `snapshot`, `vote`, `cache/clear`
#[derive(Debug, Clone, Copy)]
pub struct Operations<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Operations<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn perform(&self, name: &str, params: &[(&str, &str)]) -> Result<Value> {
        let options = RequestOptions::new().params(params.iter().copied());
        self.dispatcher
            .post(&format!("/operations/{name}"), options)
            .await?
            .into_json()
    }
}

/// `/debug`
#[derive(Debug, Clone, Copy)]
pub struct Debug<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Debug<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn retrieve(&self) -> Result<Value> {
        fetch(self.dispatcher, "/debug").await
    }
}

/// Cluster health through the dispatcher (any sane node answers)
#[derive(Debug, Clone, Copy)]
pub struct Health<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Health<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// True when the answering node reports `{"ok": true}`
    pub async fn check(&self) -> Result<bool> {
        let body = fetch(self.dispatcher, HEALTH_ENDPOINT).await?;
        Ok(body.get("ok").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Poll [`Health::check`] until it succeeds or `timeout` elapses.
    ///
    /// Errors count as "not healthy yet". Returns whether the cluster
    /// became healthy in time.
    pub async fn wait(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.check().await {
                Ok(true) => return true,
                Ok(false) => tracing::debug!("Cluster not healthy yet"),
                Err(err) => tracing::debug!(error = %err, "Health check failed"),
            }
            if tokio::time::Instant::now() + poll_interval > deadline {
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
