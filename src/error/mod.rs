//! Error types
//!
//! Every fallible operation in the crate returns [`Error`]. The variants
//! mirror the status codes returned by a Typesense node plus the
//! client-side failures (bad node URLs, empty pool, transport errors).

mod types;

pub use types::{Error, Result};
