//! HTTP clients per transport-security policy

use std::collections::HashMap;

use reqwest::Client;

use crate::error::{Error, Result};
use crate::node::{Node, TlsPolicy};

/// The `reqwest` clients used to reach the cluster.
///
/// Nodes carrying their own [`TlsPolicy`] get a dedicated client; all other
/// nodes share the default one. Timeouts are applied per request, so the
/// same client serves API calls and health probes.
#[derive(Debug, Clone)]
pub struct Transport {
    default: Client,
    per_node: HashMap<Node, Client>,
}

impl Transport {
    pub fn new(default_policy: Option<&TlsPolicy>, nodes: &[Node]) -> Result<Self> {
        let default = build_client(default_policy)?;
        let mut per_node = HashMap::new();
        for node in nodes {
            if let Some(policy) = node.tls() {
                per_node.insert(node.clone(), build_client(Some(policy))?);
            }
        }
        Ok(Self { default, per_node })
    }

    pub fn client_for(&self, node: &Node) -> &Client {
        self.per_node.get(node).unwrap_or(&self.default)
    }
}

fn build_client(policy: Option<&TlsPolicy>) -> Result<Client> {
    let mut builder = Client::builder();

    match policy {
        None => {}
        Some(TlsPolicy::Disabled) => {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Some(TlsPolicy::CaFile(path)) => {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("cannot read {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("invalid CA file {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        Some(TlsPolicy::Certificates(certs)) => {
            for cert in certs {
                builder = builder.add_root_certificate(cert.clone());
            }
        }
    }

    builder.build().map_err(|e| Error::Tls(e.to_string()))
}
