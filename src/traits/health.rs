//! Health-check capability.

use crate::{BoxError, CancellationToken};

/// Trait for services that can report their own health.
///
/// Checks run on worker threads with a [`CancellationToken`] carrying the
/// effective deadline. A check that outlives its deadline is reported as
/// [`DiError::HealthCheckTimeout`](crate::DiError::HealthCheckTimeout) while
/// the hook keeps running on its own thread, so long checks should poll the
/// token.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{BoxError, CancellationToken, HealthCheck, Injector, Invoker};
///
/// struct Database {
///     connected: bool,
/// }
///
/// impl HealthCheck for Database {
///     fn health_check(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         if self.connected {
///             Ok(())
///         } else {
///             Err("connection lost".into())
///         }
///     }
/// }
///
/// let injector = Injector::new();
/// injector
///     .value("db", Database { connected: false })
///     .with_health_check()
///     .provide()
///     .unwrap();
/// injector.invoke::<Database>("db").unwrap();
///
/// let report = injector.health_check();
/// assert!(report.get("db").unwrap().is_err());
/// ```
pub trait HealthCheck: Send + Sync + 'static {
    /// Performs the check. `Ok(())` means healthy.
    fn health_check(&self, token: &CancellationToken) -> Result<(), BoxError>;
}
