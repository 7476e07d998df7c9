use serde::Serialize;
use serde_json::Value;

use super::{fetch, fetch_optional};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;

const RESOURCE_PATH: &str = "/aliases";

/// `/aliases`
#[derive(Debug, Clone, Copy)]
pub struct Aliases<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Aliases<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn get(&self, name: impl AsRef<str>) -> Alias<'a> {
        Alias {
            dispatcher: self.dispatcher,
            endpoint: format!("{RESOURCE_PATH}/{}", name.as_ref()),
        }
    }

    pub async fn retrieve(&self) -> Result<Value> {
        fetch(self.dispatcher, RESOURCE_PATH).await
    }
}

/// `/aliases/{name}`
#[derive(Debug, Clone)]
pub struct Alias<'a> {
    dispatcher: &'a Dispatcher,
    endpoint: String,
}

impl Alias<'_> {
    pub async fn retrieve(&self) -> Result<Option<Value>> {
        fetch_optional(self.dispatcher, &self.endpoint).await
    }

    /// Point the alias at a collection, e.g. `{"collection_name": "companies_june11"}`
    pub async fn upsert<M: Serialize + ?Sized>(&self, mapping: &M) -> Result<Value> {
        self.dispatcher
            .put(&self.endpoint, RequestOptions::new().json(mapping)?)
            .await?
            .into_json()
    }

    pub async fn delete(&self) -> Result<Value> {
        self.dispatcher
            .delete(&self.endpoint, RequestOptions::new())
            .await?
            .into_json()
    }
}
