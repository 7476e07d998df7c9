//! Client facade
//!
//! Owns the [`Dispatcher`] and hands out resource handles borrowing it.
//!
//! # Example
//! ```ignore
//! let client = Client::new(Configuration::new(["http://localhost:8108"], "xyz"))?;
//! let books = client.collection("books");
//! books.documents().create(&json!({"id": "1", "title": "Dune"})).await?;
//! ```

use serde_json::{json, Value};

use crate::config::Configuration;
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;
use crate::resources::{
    fetch, Alias, Aliases, AnalyticsRule, AnalyticsRules, Collection, Collections, Debug, Health,
    Key, Keys, MultiSearch, Operations,
};

#[derive(Debug)]
pub struct Client {
    dispatcher: Dispatcher,
}

impl Client {
    pub fn new(config: Configuration) -> Result<Self> {
        Ok(Self::from_dispatcher(Dispatcher::new(config)?))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &Configuration {
        self.dispatcher.config()
    }

    pub fn collections(&self) -> Collections<'_> {
        Collections::new(&self.dispatcher)
    }

    pub fn collection(&self, name: impl Into<String>) -> Collection<'_> {
        Collection::new(&self.dispatcher, name)
    }

    pub fn aliases(&self) -> Aliases<'_> {
        Aliases::new(&self.dispatcher)
    }

    pub fn alias(&self, name: impl AsRef<str>) -> Alias<'_> {
        self.aliases().get(name)
    }

    pub fn analytics_rules(&self) -> AnalyticsRules<'_> {
        AnalyticsRules::new(&self.dispatcher)
    }

    pub fn analytics_rule(&self, name: impl AsRef<str>) -> AnalyticsRule<'_> {
        self.analytics_rules().get(name)
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys::new(&self.dispatcher)
    }

    pub fn key(&self, id: impl ToString) -> Key<'_> {
        self.keys().get(id)
    }

    pub fn multi_search(&self) -> MultiSearch<'_> {
        MultiSearch::new(&self.dispatcher)
    }

    pub fn operations(&self) -> Operations<'_> {
        Operations::new(&self.dispatcher)
    }

    pub fn debug(&self) -> Debug<'_> {
        Debug::new(&self.dispatcher)
    }

    pub fn health(&self) -> Health<'_> {
        Health::new(&self.dispatcher)
    }

    /// Log requests slower than `threshold_ms` on the server; `-1` disables
    pub async fn log_slow_requests(&self, threshold_ms: i64) -> Result<Value> {
        let options =
            RequestOptions::new().body(json!({ "log-slow-requests-time-ms": threshold_ms }));
        self.dispatcher.post("/config", options).await?.into_json()
    }

    pub async fn metrics(&self) -> Result<Value> {
        fetch(&self.dispatcher, "/metrics.json").await
    }

    pub async fn stats(&self) -> Result<Value> {
        fetch(&self.dispatcher, "/stats.json").await
    }

    /// Stop background health checking; the client stays usable
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}
