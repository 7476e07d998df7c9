use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use super::{fetch, fetch_optional};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const RESOURCE_PATH: &str = "/keys";

/// `/keys`
#[derive(Debug, Clone, Copy)]
pub struct Keys<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Keys<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn get(&self, id: impl ToString) -> Key<'a> {
        Key {
            dispatcher: self.dispatcher,
            endpoint: format!("{RESOURCE_PATH}/{}", id.to_string()),
        }
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

    pub fn generate_scoped_search_key<P: Serialize + ?Sized>(
        &self,
        search_key: &str,
        parameters: &P,
    ) -> Result<String> {
        generate_scoped_search_key(search_key, parameters)
    }
}

/// `/keys/{id}`
#[derive(Debug, Clone)]
pub struct Key<'a> {
    dispatcher: &'a Dispatcher,
    endpoint: String,
}

impl Key<'_> {
    /// The key's metadata, `None` if it does not exist
    pub async fn retrieve(&self) -> Result<Option<Value>> {
        fetch_optional(self.dispatcher, &self.endpoint).await
    }

    pub async fn delete(&self) -> Result<Value> {
        self.dispatcher
            .delete(&self.endpoint, RequestOptions::new())
            .await?
            .into_json()
    }
}

/// Derive a scoped search key locally, without a round trip.
///
/// The server only accepts keys derived from a parent key that carries the
/// `documents:search` action. Layout:
/// `base64(base64(hmac_sha256(search_key, params)) + search_key[..4] + params)`.
pub fn generate_scoped_search_key<P: Serialize + ?Sized>(
    search_key: &str,
    parameters: &P,
) -> Result<String> {
    let params = serde_json::to_string(parameters)?;

    let mut mac = HmacSha256::new_from_slice(search_key.as_bytes())
        .map_err(|e| Error::Config(format!("invalid search key: {e}")))?;
    mac.update(params.as_bytes());
    let digest = BASE64.encode(mac.finalize().into_bytes());

    let prefix: String = search_key.chars().take(4).collect();
    Ok(BASE64.encode(format!("{digest}{prefix}{params}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scoped_key_layout() {
        let params = json!({"filter_by": "company_id:124", "expires_at": 1906054106});
        let key = generate_scoped_search_key("RN23GFr1s6jQ9kgSNg2O7fYcAUXU7127", &params).unwrap();

        let decoded = String::from_utf8(BASE64.decode(key).unwrap()).unwrap();
        let params_json = serde_json::to_string(&params).unwrap();

        // 32-byte digest is 44 base64 chars
        assert_eq!(decoded.len(), 44 + 4 + params_json.len());
        assert_eq!(&decoded[44..48], "RN23");
        assert_eq!(&decoded[48..], params_json);

        let mut mac = HmacSha256::new_from_slice(b"RN23GFr1s6jQ9kgSNg2O7fYcAUXU7127").unwrap();
        mac.update(params_json.as_bytes());
        assert_eq!(&decoded[..44], BASE64.encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn test_scoped_key_is_deterministic() {
        let params = json!({"filter_by": "user_id:1"});
        assert_eq!(
            generate_scoped_search_key("abcdef", &params).unwrap(),
            generate_scoped_search_key("abcdef", &params).unwrap()
        );
        assert_ne!(
            generate_scoped_search_key("abcdef", &params).unwrap(),
            generate_scoped_search_key("abcdeg", &params).unwrap()
        );
    }

    #[test]
    fn test_short_search_key() {
        let key = generate_scoped_search_key("ab", &json!({})).unwrap();
        let decoded = String::from_utf8(BASE64.decode(key).unwrap()).unwrap();
        assert!(decoded.ends_with("ab{}"));
    }
}
