//! Per-collection curation: overrides and synonyms share one shape

use serde::Serialize;
use serde_json::Value;

use super::{fetch, fetch_optional};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::Result;

macro_rules! curation_resource {
    ($list:ident, $item:ident, $segment:literal) => {
        #[doc = concat!("`/collections/{collection}/", $segment, "`")]
        #[derive(Debug, Clone)]
        pub struct $list<'a> {
            dispatcher: &'a Dispatcher,
            endpoint: String,
        }

        impl<'a> $list<'a> {
            pub fn new(dispatcher: &'a Dispatcher, collection: &str) -> Self {
                Self {
                    dispatcher,
                    endpoint: format!("/collections/{collection}/{}", $segment),
                }
            }

            pub fn get(&self, id: impl AsRef<str>) -> $item<'a> {
                $item {
                    dispatcher: self.dispatcher,
                    endpoint: format!("{}/{}", self.endpoint, id.as_ref()),
                }
            }

            pub async fn retrieve(&self) -> Result<Value> {
                fetch(self.dispatcher, &self.endpoint).await
            }
        }

        #[doc = concat!("`/collections/{collection}/", $segment, "/{id}`")]
        #[derive(Debug, Clone)]
        pub struct $item<'a> {
            dispatcher: &'a Dispatcher,
            endpoint: String,
        }

        impl $item<'_> {
            pub async fn retrieve(&self) -> Result<Option<Value>> {
                fetch_optional(self.dispatcher, &self.endpoint).await
            }

            pub async fn upsert<S: Serialize + ?Sized>(&self, schema: &S) -> Result<Value> {
                self.dispatcher
                    .put(&self.endpoint, RequestOptions::new().json(schema)?)
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
    };
}

curation_resource!(Overrides, Override, "overrides");
curation_resource!(Synonyms, Synonym, "synonyms");
