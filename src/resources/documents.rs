use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{fetch_optional, query_pairs};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::{Error, Result};

/// `/collections/{collection}/documents`
#[derive(Debug, Clone)]
pub struct Documents<'a> {
    dispatcher: &'a Dispatcher,
    collection: String,
    endpoint: String,
}

impl<'a> Documents<'a> {
    pub fn new(dispatcher: &'a Dispatcher, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        let endpoint = format!("/collections/{collection}/documents");
        Self {
            dispatcher,
            collection,
            endpoint,
        }
    }

    /// Handle for one document; no request is made
    pub fn get(&self, id: impl Into<String>) -> Document<'a> {
        Document::new(self.dispatcher, &self.collection, id)
    }

    pub async fn create<T: Serialize + ?Sized>(&self, document: &T) -> Result<Value> {
        self.write("create", document).await
    }

    pub async fn upsert<T: Serialize + ?Sized>(&self, document: &T) -> Result<Value> {
        self.write("upsert", document).await
    }

    pub async fn update<T: Serialize + ?Sized>(&self, document: &T) -> Result<Value> {
        self.write("update", document).await
    }

    async fn write<T: Serialize + ?Sized>(&self, action: &str, document: &T) -> Result<Value> {
        let options = RequestOptions::new().json(document)?.param("action", action);
        self.dispatcher
            .post(&self.endpoint, options)
            .await?
            .into_json()
    }

    /// Same as [`Documents::import`]
    pub async fn create_many<T: Serialize>(
        &self,
        documents: &[T],
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        self.import(documents, params).await
    }

    /// Bulk import as newline-delimited JSON.
    ///
    /// The server answers with one JSON object per line, one per document,
    /// in input order.
    pub async fn import<T: Serialize>(
        &self,
        documents: &[T],
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let body = to_jsonl(documents)?;
        let options = RequestOptions::new()
            .raw_body(body)
            .params(params.iter().copied())
            .raw_response();

        let bytes = self
            .dispatcher
            .post(&format!("{}/import", self.endpoint), options)
            .await?
            .into_bytes()?;

        parse_jsonl(&bytes)
    }

    /// Every document of the collection as raw JSON lines
    pub async fn export(&self) -> Result<Bytes> {
        let endpoint = format!("{}/export", self.endpoint);
        match self
            .dispatcher
            .get(&endpoint, RequestOptions::new().raw_response())
            .await?
        {
            Some(payload) => payload.into_bytes(),
            None => Err(Error::ObjectNotFound(endpoint)),
        }
    }

    pub async fn search(&self, params: &SearchParameters) -> Result<Value> {
        let endpoint = format!("{}/search", self.endpoint);
        let options = RequestOptions::new().params(query_pairs(params)?);
        match self.dispatcher.get(&endpoint, options).await? {
            Some(payload) => payload.into_json(),
            None => Err(Error::ObjectNotFound(endpoint)),
        }
    }

    /// Delete by query, e.g. `[("filter_by", "num_employees:>100")]`
    pub async fn delete(&self, params: &[(&str, &str)]) -> Result<Value> {
        let options = RequestOptions::new().params(params.iter().copied());
        self.dispatcher
            .delete(&self.endpoint, options)
            .await?
            .into_json()
    }
}

/// `/collections/{collection}/documents/{id}`
#[derive(Debug, Clone)]
pub struct Document<'a> {
    dispatcher: &'a Dispatcher,
    endpoint: String,
}

impl<'a> Document<'a> {
    pub fn new(dispatcher: &'a Dispatcher, collection: &str, id: impl Into<String>) -> Self {
        Self {
            dispatcher,
            endpoint: format!("/collections/{collection}/documents/{}", id.into()),
        }
    }

    pub async fn retrieve(&self) -> Result<Option<Value>> {
        fetch_optional(self.dispatcher, &self.endpoint).await
    }

    pub async fn update<T: Serialize + ?Sized>(&self, partial: &T) -> Result<Value> {
        self.dispatcher
            .patch(&self.endpoint, RequestOptions::new().json(partial)?)
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

/// Query parameters of a document search.
///
/// Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchParameters {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_by_weights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_facet_values: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_typos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_full_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_affix_num_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_start_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_end_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_tokens_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typo_tokens_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_hits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_hits: Option<String>,
}

impl SearchParameters {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    /// Comma-joins the fields
    pub fn query_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.query_by = Some(joined);
        self
    }

    pub fn filter_by(mut self, filter: impl Into<String>) -> Self {
        self.filter_by = Some(filter.into());
        self
    }

    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }
}

fn to_jsonl<T: Serialize>(documents: &[T]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            body.push(b'\n');
        }
        serde_json::to_writer(&mut body, document)?;
    }
    Ok(body)
}

fn parse_jsonl(bytes: &[u8]) -> Result<Vec<Value>> {
    bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(|line| Ok(serde_json::from_slice(line)?))
        .collect()
}
