//! Node value type
//!
//! A `Node` is one addressable cluster endpoint. It is immutable and
//! compares by its normalized URL only, so it can be freely cloned and
//! used as a map key; health lives in the pool, never on the node.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::str::FromStr;

use url::{ParseError, Url};

use crate::error::{Error, Result};

// ============================================================================
// Transport security
// ============================================================================

/// How certificates presented by a node are verified
#[derive(Clone)]
pub enum TlsPolicy {
    /// Accept any certificate (self-signed development clusters)
    Disabled,
    /// Trust the PEM bundle at this path in addition to the platform roots
    CaFile(PathBuf),
    /// Trust these already-loaded certificates
    Certificates(Vec<reqwest::Certificate>),
}

impl fmt::Debug for TlsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsPolicy::Disabled => write!(f, "Disabled"),
            TlsPolicy::CaFile(path) => f.debug_tuple("CaFile").field(path).finish(),
            TlsPolicy::Certificates(certs) => write!(f, "Certificates({})", certs.len()),
        }
    }
}

// ============================================================================
// Node
// ============================================================================

#[derive(Clone)]
pub struct Node {
    url: String,
    scheme: String,
    host: String,
    port: u16,
    path: String,
    tls: Option<TlsPolicy>,
}

impl Node {
    /// Parse a node URL.
    ///
    /// The host, the port and the scheme are all mandatory and are checked
    /// in that order.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (url, has_scheme) = match Url::parse(value) {
            Ok(url) => (url, true),
            // Scheme-relative ("//host:port/path"): still validate the
            // authority so a missing host or port wins over the scheme.
            Err(ParseError::RelativeUrlWithoutBase) if value.starts_with("//") => {
                let url = Url::parse(&format!("http:{value}")).map_err(|e| Error::InvalidUrl {
                    url: value.to_string(),
                    reason: e.to_string(),
                })?;
                (url, false)
            }
            Err(ParseError::RelativeUrlWithoutBase) | Err(ParseError::EmptyHost) => {
                return Err(Error::MissingHost {
                    url: value.to_string(),
                })
            }
            Err(e) => {
                return Err(Error::InvalidUrl {
                    url: value.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => {
                return Err(Error::MissingHost {
                    url: value.to_string(),
                })
            }
        };

        // `Url` drops ports equal to the scheme default, so look at the
        // authority text to tell "http://h:80" from "http://h".
        let port = match (has_explicit_port(value), url.port_or_known_default()) {
            (true, Some(port)) if port != 0 => port,
            _ => {
                return Err(Error::MissingPort {
                    url: value.to_string(),
                })
            }
        };

        if !has_scheme {
            return Err(Error::MissingScheme {
                url: value.to_string(),
            });
        }

        let scheme = url.scheme().to_string();
        let path = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            url: format!("{scheme}://{host}:{port}{path}"),
            scheme,
            host,
            port,
            path,
            tls: None,
        })
    }

    /// Attach a transport-security policy; equality is unaffected
    pub fn with_tls(mut self, policy: TlsPolicy) -> Self {
        self.tls = Some(policy);
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path prefix, without a trailing slash (may be empty)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tls(&self) -> Option<&TlsPolicy> {
        self.tls.as_ref()
    }

    /// The normalized URL
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Join an endpoint onto this node without doubling slashes
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_matches('/');
        if endpoint.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{}", self.url, endpoint)
        }
    }
}

/// Does the authority component of `raw` carry a port?
fn has_explicit_port(raw: &str) -> bool {
    let rest = match raw.find("//") {
        Some(idx) => &raw[idx + 2..],
        None => return false,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let after_host = match host_port.rfind(']') {
        Some(idx) => &host_port[idx + 1..],
        None => host_port,
    };
    match after_host.rfind(':') {
        Some(idx) => !after_host[idx + 1..].is_empty(),
        None => false,
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Node {:?}>", self.url)
    }
}

impl FromStr for Node {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Node::parse(s)
    }
}

impl TryFrom<&str> for Node {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Node::parse(value)
    }
}

impl TryFrom<String> for Node {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Node::parse(&value)
    }
}

impl AsRef<str> for Node {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Anything a node can be built from.
///
/// Converting an existing `Node` hands back the same value.
pub trait IntoNode {
    fn into_node(self) -> Result<Node>;
}

impl IntoNode for Node {
    fn into_node(self) -> Result<Node> {
        Ok(self)
    }
}

impl IntoNode for &Node {
    fn into_node(self) -> Result<Node> {
        Ok(self.clone())
    }
}

impl IntoNode for &str {
    fn into_node(self) -> Result<Node> {
        Node::parse(self)
    }
}

impl IntoNode for String {
    fn into_node(self) -> Result<Node> {
        Node::parse(&self)
    }
}

impl IntoNode for &String {
    fn into_node(self) -> Result<Node> {
        Node::parse(self)
    }
}
