use serde::Serialize;
use serde_json::Value;

use super::{fetch, fetch_optional, Documents, Overrides, Synonyms};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;

const RESOURCE_PATH: &str = "/collections";

/// `/collections`
#[derive(Debug, Clone, Copy)]
pub struct Collections<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Collections<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle for one collection; no request is made
    pub fn get(&self, name: impl Into<String>) -> Collection<'a> {
        Collection::new(self.dispatcher, name)
    }

    pub async fn create<S: Serialize + ?Sized>(&self, schema: &S) -> Result<Value> {
        self.dispatcher
            .post(RESOURCE_PATH, RequestOptions::new().json(schema)?)
            .await?
            .into_json()
    }

    pub async fn retrieve(&self) -> Result<Value> {
        fetch(self.dispatcher, RESOURCE_PATH).await
    }
}

/// `/collections/{name}`
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    dispatcher: &'a Dispatcher,
    name: String,
    endpoint: String,
}

impl<'a> Collection<'a> {
    pub fn new(dispatcher: &'a Dispatcher, name: impl Into<String>) -> Self {
        let name = name.into();
        let endpoint = format!("{RESOURCE_PATH}/{name}");
        Self {
            dispatcher,
            name,
            endpoint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documents(&self) -> Documents<'a> {
        Documents::new(self.dispatcher, &self.name)
    }

    pub fn overrides(&self) -> Overrides<'a> {
        Overrides::new(self.dispatcher, &self.name)
    }

    pub fn synonyms(&self) -> Synonyms<'a> {
        Synonyms::new(self.dispatcher, &self.name)
    }

    /// The collection schema, `None` if it does not exist
    pub async fn retrieve(&self) -> Result<Option<Value>> {
        fetch_optional(self.dispatcher, &self.endpoint).await
    }

    /// PATCH the schema (add or drop fields)
    pub async fn update<S: Serialize + ?Sized>(&self, schema_change: &S) -> Result<Value> {
        self.dispatcher
            .patch(&self.endpoint, RequestOptions::new().json(schema_change)?)
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
