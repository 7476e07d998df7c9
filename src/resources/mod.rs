//! Endpoint helpers
//!
//! Thin, borrowed handles that turn resource names into endpoint paths and
//! hand the call to the [`Dispatcher`]. None of them hold state beyond the
//! path, so creating one per call is free.

mod aliases;
mod analytics;
mod collections;
mod curation;
mod documents;
mod keys;
mod operations;

pub use aliases::{Alias, Aliases};
pub use analytics::{AnalyticsRule, AnalyticsRules};
pub use collections::{Collection, Collections};
pub use curation::{Override, Overrides, Synonym, Synonyms};
pub use documents::{Document, Documents, SearchParameters};
pub use keys::{generate_scoped_search_key, Key, Keys};
pub use operations::{Debug, Health, MultiSearch, Operations};

use serde_json::Value;

use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::{Error, Result};

/// GET a JSON resource that must exist.
///
/// The dispatcher has already consumed the 404 body, so the resulting
/// `ObjectNotFound` carries the endpoint instead of a server message.
pub(crate) async fn fetch(dispatcher: &Dispatcher, endpoint: &str) -> Result<Value> {
    fetch_optional(dispatcher, endpoint)
        .await?
        .ok_or_else(|| Error::ObjectNotFound(endpoint.to_string()))
}

/// GET a JSON resource, `None` on 404
pub(crate) async fn fetch_optional(dispatcher: &Dispatcher, endpoint: &str) -> Result<Option<Value>> {
    match dispatcher.get(endpoint, RequestOptions::new()).await? {
        Some(payload) => Ok(Some(payload.into_json()?)),
        None => Ok(None),
    }
}

/// Flatten a serializable parameter struct into query pairs, dropping nulls
pub(crate) fn query_pairs<T: serde::Serialize>(params: &T) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(params)?;
    let Value::Object(map) = value else {
        return Ok(Vec::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
