//! Lifecycle orchestration: health checks and shutdown across the scope tree.

mod health;
mod shutdown;
#[cfg(feature = "async")]
mod signals;

pub use health::HealthReport;
pub use shutdown::{ShutdownErrors, ShutdownReport};
#[cfg(feature = "async")]
pub use signals::ShutdownTrigger;
