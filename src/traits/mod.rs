//! Core traits for the dependency injection container.
//!
//! [`Invoker`] is the resolution seam shared by scopes and provider contexts.
//! [`HealthCheck`] and [`Shutdown`] are capabilities a service opts into at
//! registration time with
//! [`with_health_check`](crate::ServiceBuilder::with_health_check) or
//! [`with_shutdown`](crate::ServiceBuilder::with_shutdown).

mod health;
mod invoker;
mod shutdown;

pub use health::HealthCheck;
pub use invoker::Invoker;
pub use shutdown::Shutdown;
