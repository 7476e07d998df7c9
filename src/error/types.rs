//! Client error taxonomy

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // ------------------------------------------------------------------
    // Input validation
    // ------------------------------------------------------------------
    #[error("Node URL does not contain the host name: {url}")]
    MissingHost { url: String },

    #[error("Node URL does not contain the port: {url}")]
    MissingPort { url: String },

    #[error("Node URL does not contain the protocol: {url}")]
    MissingScheme { url: String },

    #[error("Invalid node URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    // ------------------------------------------------------------------
    // Node pool lookups
    // ------------------------------------------------------------------
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("No valid nodes")]
    NoValidNodes,

    // ------------------------------------------------------------------
    // Transport and status-mapped failures
    // ------------------------------------------------------------------
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned no status: {0}")]
    HttpStatus0(String),

    #[error("Request malformed: {0}")]
    RequestMalformed(String),

    #[error("Request unauthorized: {0}")]
    RequestUnauthorized(String),

    #[error("Request forbidden: {0}")]
    RequestForbidden(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("Object unprocessable: {0}")]
    ObjectUnprocessable(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Client error: {status} - {message}")]
    Client { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Map a non-2xx status code and its body onto an error kind
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            0 => Error::HttpStatus0(message),
            400 => Error::RequestMalformed(message),
            401 => Error::RequestUnauthorized(message),
            403 => Error::RequestForbidden(message),
            404 => Error::ObjectNotFound(message),
            409 => Error::ObjectAlreadyExists(message),
            422 => Error::ObjectUnprocessable(message),
            500 => Error::ServerError(message),
            503 => Error::ServiceUnavailable(message),
            _ => Error::Client { status, message },
        }
    }

    /// Whether the node, rather than the request, is at fault.
    ///
    /// These kinds quarantine the node that produced them and are the only
    /// ones the dispatcher retries.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::HttpStatus0(_)
                | Error::ServerError(_)
                | Error::ServiceUnavailable(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ObjectNotFound(_))
    }

    /// The HTTP status this error was mapped from, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::HttpStatus0(_) => Some(0),
            Error::RequestMalformed(_) => Some(400),
            Error::RequestUnauthorized(_) => Some(401),
            Error::RequestForbidden(_) => Some(403),
            Error::ObjectNotFound(_) => Some(404),
            Error::ObjectAlreadyExists(_) => Some(409),
            Error::ObjectUnprocessable(_) => Some(422),
            Error::ServerError(_) => Some(500),
            Error::ServiceUnavailable(_) => Some(503),
            Error::Client { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
