//! Utility modules
//!
//! Retry and timeout helpers shared by the dispatcher and the prober.

pub mod retry;
pub mod timeout;

pub use retry::{retry_with_backoff, RetryConfig, RetryResult};
pub use timeout::{with_timeout, TimeoutError};
