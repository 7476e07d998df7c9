//! Request dispatcher
//!
//! Sits underneath every API call: picks a sane node, sends the request,
//! classifies the outcome, quarantines nodes that fail at the service
//! level and retries the whole attempt (node selection included) within
//! the configured budget.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use super::payload::{Body, Payload, RequestOptions};
use super::transport::Transport;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::health::{GuardHandle, HealthProbe, HttpProber, QuarantineGuard};
use crate::node::{Node, NodePool};
use crate::utils::{retry_with_backoff, RetryConfig};

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-typesense-api-key";

pub struct Dispatcher {
    config: Configuration,
    transport: Arc<Transport>,
    pool: NodePool,
    prober: Arc<dyn HealthProbe>,
    headers: HeaderMap,
    retry: RetryConfig,
    guard: Option<GuardHandle>,
}

impl Dispatcher {
    /// Build a dispatcher for the nodes listed in `config`.
    ///
    /// Inside a Tokio runtime this also starts the quarantine guard.
    pub fn new(config: Configuration) -> Result<Self> {
        let nodes = config
            .nodes
            .iter()
            .map(|url| Node::parse(url))
            .collect::<Result<Vec<_>>>()?;
        Self::with_nodes(config, nodes)
    }

    /// Build a dispatcher from already-parsed nodes (which may carry their
    /// own TLS policy)
    pub fn with_nodes(config: Configuration, nodes: Vec<Node>) -> Result<Self> {
        let transport = Arc::new(Transport::new(config.tls.as_ref(), &nodes)?);
        let prober = Arc::new(HttpProber::new(
            Arc::clone(&transport),
            config.healthcheck_timeout,
        ));
        Self::build(config, nodes, transport, prober)
    }

    /// Build a dispatcher whose pool and guard use `prober` for health checks
    pub fn with_prober(
        config: Configuration,
        nodes: Vec<Node>,
        prober: Arc<dyn HealthProbe>,
    ) -> Result<Self> {
        let transport = Arc::new(Transport::new(config.tls.as_ref(), &nodes)?);
        Self::build(config, nodes, transport, prober)
    }

    fn build(
        mut config: Configuration,
        nodes: Vec<Node>,
        transport: Arc<Transport>,
        prober: Arc<dyn HealthProbe>,
    ) -> Result<Self> {
        config.nodes = nodes.iter().map(ToString::to_string).collect();
        config.validate()?;

        let pool = NodePool::new(
            nodes,
            config.strategy,
            config.healthcheck_interval,
            Arc::clone(&prober),
        )?;
        let headers = default_headers(&config)?;
        let retry = RetryConfig::fixed(config.retries, config.retry_interval);

        let guard = match tokio::runtime::Handle::try_current() {
            Ok(_) => Some(
                QuarantineGuard::new(pool.clone(), Arc::clone(&prober), config.healthcheck_interval)
                    .spawn(),
            ),
            Err(_) => {
                tracing::warn!("No Tokio runtime, quarantine guard not started");
                None
            }
        };

        tracing::info!(
            nodes = pool.total(),
            strategy = %config.strategy,
            retries = config.retries,
            "Initialized dispatcher"
        );

        Ok(Self {
            config,
            transport,
            pool,
            prober,
            headers,
            retry,
            guard,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Probe every known node once, sane or quarantined
    pub async fn probe_all(&self) -> Vec<(Node, bool)> {
        let mut nodes = self.pool.sane();
        nodes.extend(self.pool.quarantined());
        let checks = nodes.into_iter().map(|node| {
            let prober = Arc::clone(&self.prober);
            async move {
                let healthy = prober.probe(&node).await;
                (node, healthy)
            }
        });
        futures::future::join_all(checks).await
    }

    /// Stop the quarantine guard and every pending re-probe
    pub fn shutdown(&self) {
        if let Some(guard) = &self.guard {
            guard.shutdown();
        }
        self.pool.shutdown();
    }

    // ------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------

    /// GET; a 404 comes back as `Ok(None)`
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<Option<Payload>> {
        match self.request(Method::GET, endpoint, options).await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::POST, endpoint, options).await
    }

    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::PUT, endpoint, options).await
    }

    pub async fn patch(&self, endpoint: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::PATCH, endpoint, options).await
    }

    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<Payload> {
        self.request(Method::DELETE, endpoint, options).await
    }

    /// Send with retries.
    ///
    /// Only service failures are retried; each attempt selects a node
    /// afresh. Writes are not de-duplicated, so a retried POST may apply
    /// twice on the server.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Payload> {
        let outcome = retry_with_backoff(&self.retry, Error::is_service_failure, || {
            self.send_once(method.clone(), endpoint, &options)
        })
        .await;

        if let Err(err) = &outcome.result {
            tracing::debug!(
                method = %method,
                endpoint = %endpoint,
                attempts = outcome.attempts,
                error = %err,
                "Request failed"
            );
        }
        outcome.result
    }

    /// One attempt against one node, no retry
    pub async fn send_once(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Payload> {
        let node = self.pool.get().ok_or(Error::NoValidNodes)?;
        let url = node.endpoint_url(endpoint);
        let headers = self.merge_headers(options)?;

        let mut request = self
            .transport
            .client_for(&node)
            .request(method.clone(), &url)
            .timeout(self.config.timeout)
            .headers(headers);

        if !options.params.is_empty() {
            request = request.query(&options.params);
        }

        match &options.body {
            Some(Body::Json(value)) => request = request.body(serde_json::to_vec(value)?),
            Some(Body::Raw(bytes)) => request = request.body(bytes.clone()),
            None => {}
        }

        tracing::debug!(method = %method, url = %url, "Dispatching request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(node = %node, error = %err, "Transport failure");
                self.handle_faulty_node(&node);
                return Err(Error::Transport(err));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Error::from_status(status.as_u16(), body);
            if error.is_service_failure() {
                tracing::warn!(node = %node, status = status.as_u16(), "Node reported service failure");
                self.handle_faulty_node(&node);
            }
            return Err(error);
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.handle_faulty_node(&node);
                return Err(Error::Transport(err));
            }
        };

        if options.raw_response {
            Ok(Payload::Raw(bytes))
        } else if bytes.is_empty() {
            Ok(Payload::Json(Value::Null))
        } else {
            Ok(Payload::Json(serde_json::from_slice(&bytes)?))
        }
    }

    fn handle_faulty_node(&self, node: &Node) {
        if let Err(err) = self.pool.quarantine(node) {
            tracing::error!(node = %node, error = %err, "Failed to quarantine node");
        }
    }

    /// Defaults, then a JSON content type, then caller overrides; the API
    /// key header cannot be overridden.
    fn merge_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = self.headers.clone();

        if matches!(options.body, Some(Body::Json(_))) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in &options.headers {
            let (name, value) = parse_header(name, value)?;
            if name.as_str() == API_KEY_HEADER {
                continue;
            }
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pool", &self.pool)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn default_headers(config: &Configuration) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    let mut key = HeaderValue::from_str(&config.api_key)
        .map_err(|_| Error::InvalidHeader(API_KEY_HEADER.to_string()))?;
    key.set_sensitive(true);
    headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

    Ok(headers)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidHeader(name.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Configuration {
        Configuration::new(["http://localhost:8108"], "secret")
            .with_header("X-Custom", "default")
            .with_header("Accept", "application/json")
    }

    #[test]
    fn test_default_headers_carry_api_key() {
        let headers = default_headers(&config()).unwrap();
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "secret");
        assert!(headers.get(API_KEY_HEADER).unwrap().is_sensitive());
        assert_eq!(headers.get("x-custom").unwrap(), "default");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = config().with_header("bad header", "x");
        assert!(matches!(default_headers(&config), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_merge_headers_precedence() {
        let dispatcher = Dispatcher::new(config()).unwrap();
        let options = RequestOptions::new()
            .body(serde_json::json!({}))
            .header("X-Custom", "override")
            .header("X-TYPESENSE-API-KEY", "stolen")
            .header("Content-Type", "text/plain");

        let headers = dispatcher.merge_headers(&options).unwrap();
        assert_eq!(headers.get("x-custom").unwrap(), "override");
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "secret");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let bad = Configuration::new(["localhost:8108"], "secret");
        assert!(Dispatcher::new(bad).is_err());

        let no_key = Configuration::new(["http://localhost:8108"], "");
        assert!(matches!(Dispatcher::new(no_key), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_pool_fails_fast() {
        let dispatcher = Dispatcher::new(config().with_retries(5)).unwrap();
        let node = dispatcher.pool().get().unwrap();
        dispatcher.pool().quarantine(&node).unwrap();

        let started = std::time::Instant::now();
        let err = dispatcher
            .post("/collections", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoValidNodes));
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }
}
