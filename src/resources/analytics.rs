use serde::Serialize;
use serde_json::Value;

use super::{fetch, fetch_optional};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;

const RESOURCE_PATH: &str = "/analytics/rules";

/// `/analytics/rules`
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsRules<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> AnalyticsRules<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn get(&self, name: impl AsRef<str>) -> AnalyticsRule<'a> {
        AnalyticsRule {
            dispatcher: self.dispatcher,
            endpoint: format!("{RESOURCE_PATH}/{}", name.as_ref()),
        }
    }

    pub async fn create<R: Serialize + ?Sized>(
        &self,
        rule: &R,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let options = RequestOptions::new()
            .json(rule)?
            .params(params.iter().copied());
        self.dispatcher
            .post(RESOURCE_PATH, options)
            .await?
            .into_json()
    }

    pub async fn retrieve(&self) -> Result<Value> {
        fetch(self.dispatcher, RESOURCE_PATH).await
    }
}

/// `/analytics/rules/{name}`
#[derive(Debug, Clone)]
pub struct AnalyticsRule<'a> {
    dispatcher: &'a Dispatcher,
    endpoint: String,
}

impl AnalyticsRule<'_> {
    pub async fn retrieve(&self) -> Result<Option<Value>> {
        fetch_optional(self.dispatcher, &self.endpoint).await
    }

    pub async fn upsert<R: Serialize + ?Sized>(&self, rule: &R) -> Result<Value> {
        self.dispatcher
            .put(&self.endpoint, RequestOptions::new().json(rule)?)
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
