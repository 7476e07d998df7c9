//! Request dispatch
//!
//! The [`Dispatcher`] owns the node pool, the HTTP clients and the
//! quarantine guard. Everything above it (resources, the client facade)
//! only deals in endpoints and payloads.

mod payload;
mod requester;
mod transport;

pub use payload::{Body, Payload, RequestOptions};
pub use requester::{Dispatcher, API_KEY_HEADER};
pub use transport::Transport;
