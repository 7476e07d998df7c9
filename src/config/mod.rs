//! Configuration management module
//!
//! Loading and validating client configuration from code or from
//! environment variables and .env files.

pub mod settings;

pub use settings::{
    Configuration, DEFAULT_HEALTHCHECK_INTERVAL, DEFAULT_HEALTHCHECK_TIMEOUT, DEFAULT_RETRIES,
    DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT,
};
