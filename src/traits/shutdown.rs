//! Shutdown capability.

use crate::{BoxError, CancellationToken};

/// Trait for services that need structured teardown (flushing caches,
/// closing connections).
///
/// Shutdown hooks run in reverse invocation order within a scope, after every
/// child scope has been shut down. A failing hook does not stop the walk; its
/// error is collected into the [`ShutdownReport`](crate::ShutdownReport).
///
/// # Examples
///
/// ```
/// use ferrous_injector::{BoxError, CancellationToken, Injector, Invoker, Shutdown};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Shutdown for Cache {
///     fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         self.flushed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let injector = Injector::new();
/// injector
///     .lazy("cache", |_| Ok(Cache { flushed: AtomicBool::new(false) }))
///     .with_shutdown()
///     .provide()
///     .unwrap();
///
/// let cache = injector.invoke::<Cache>("cache").unwrap();
/// assert!(injector.shutdown().is_ok());
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Shutdown: Send + Sync + 'static {
    /// Releases the service's resources.
    fn shutdown(&self, token: &CancellationToken) -> Result<(), BoxError>;
}
