//! Health checking
//!
//! [`HealthProbe`] is the seam between the pool and the network: the pool
//! and the [`QuarantineGuard`] only ever ask "is this node healthy?".

mod guard;
mod prober;

pub use guard::{GuardHandle, QuarantineGuard};
pub use prober::{HealthProbe, HttpProber, HEALTH_ENDPOINT};
