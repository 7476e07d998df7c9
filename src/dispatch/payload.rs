//! Request options and response payloads

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as a JSON document, `Content-Type: application/json`
    Json(Value),
    /// Sent as-is (newline-delimited imports)
    Raw(Bytes),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Raw(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Raw(Bytes::from(bytes))
    }
}

/// Per-call knobs shared by every verb
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Body>,
    pub params: Vec<(String, String)>,
    /// Overrides for the client's default headers (the API key header is reserved)
    pub headers: Vec<(String, String)>,
    /// Return the body as bytes instead of decoding JSON
    pub raw_response: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` into a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(Body::Json(serde_json::to_value(value)?));
        Ok(self)
    }

    pub fn raw_body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Raw(bytes.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn raw_response(mut self) -> Self {
        self.raw_response = true;
        self
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Bytes),
}

impl Payload {
    /// The body as JSON, decoding raw bytes if needed
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Raw(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    /// The body as bytes, re-encoding JSON if needed
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Payload::Raw(bytes) => Ok(bytes),
            Payload::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Payload::Json(value) => Ok(serde_json::from_value(value)?),
            Payload::Raw(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_options_builder() {
        let options = RequestOptions::new()
            .json(&json!({"name": "fruits"}))
            .unwrap()
            .param("action", "upsert")
            .params([("batch_size", 40)])
            .header("X-Request-Id", "abc")
            .raw_response();

        assert_eq!(options.body, Some(Body::Json(json!({"name": "fruits"}))));
        assert_eq!(
            options.params,
            vec![
                ("action".to_string(), "upsert".to_string()),
                ("batch_size".to_string(), "40".to_string())
            ]
        );
        assert_eq!(options.headers.len(), 1);
        assert!(options.raw_response);
    }

    #[test]
    fn test_payload_conversions() {
        let raw = Payload::Raw(Bytes::from_static(br#"{"ok":true}"#));
        assert_eq!(raw.clone().into_json().unwrap(), json!({"ok": true}));
        assert_eq!(raw.into_bytes().unwrap(), Bytes::from_static(br#"{"ok":true}"#));

        let decoded = Payload::Json(json!({"ok": true})).into_bytes().unwrap();
        assert_eq!(decoded, Bytes::from_static(br#"{"ok":true}"#));

        assert!(Payload::Raw(Bytes::from_static(b"not json")).into_json().is_err());
    }

    #[test]
    fn test_payload_deserialize() {
        #[derive(Deserialize)]
        struct Health {
            ok: bool,
        }
        let health: Health = Payload::Json(json!({"ok": true})).deserialize().unwrap();
        assert!(health.ok);
    }
}
