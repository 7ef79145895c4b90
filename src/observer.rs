//! Lifecycle observers.
//!
//! Observers are notified of registrations, invocations and shutdowns across
//! the whole scope tree. They are configured once through
//! [`InjectorOptions::with_observer`](crate::InjectorOptions::with_observer)
//! and always called outside registry locks, so an observer may itself
//! inspect the scope it is handed.

use std::sync::Arc;
use std::time::Duration;

use crate::{DiError, Scope};

/// Observer trait for container lifecycle events.
///
/// Every method has a no-op default; implement the ones you need.
///
/// # Performance
///
/// Observer calls are made synchronously on the invoking thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, InjectorOptions, LifecycleObserver, Scope};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Recorder {
///     registered: Mutex<Vec<String>>,
/// }
///
/// impl LifecycleObserver for Recorder {
///     fn after_registration(&self, scope: &Scope, service: &str) {
///         self.registered
///             .lock()
///             .unwrap()
///             .push(format!("{}/{}", scope.name(), service));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let injector = Injector::with_options(InjectorOptions::new().with_observer(recorder.clone()));
/// injector.provide_value("answer", 42u32).unwrap();
///
/// assert_eq!(*recorder.registered.lock().unwrap(), ["[root]/answer"]);
/// ```
pub trait LifecycleObserver: Send + Sync {
    /// `service` is about to be registered (or overridden) in `scope`. Not
    /// called when the name is already taken and the registration fails.
    fn before_registration(&self, _scope: &Scope, _service: &str) {}

    /// A service was registered (or overridden) in `scope`.
    fn after_registration(&self, _scope: &Scope, _service: &str) {}

    /// `service`, owned by `scope`, is about to be resolved.
    fn before_invocation(&self, _scope: &Scope, _service: &str) {}

    /// Resolution of `service` finished.
    fn after_invocation(
        &self,
        _scope: &Scope,
        _service: &str,
        _result: Result<(), &DiError>,
        _elapsed: Duration,
    ) {
    }

    /// `service` is about to be shut down.
    fn before_shutdown(&self, _scope: &Scope, _service: &str) {}

    /// Shutdown of `service` finished.
    fn after_shutdown(&self, _scope: &Scope, _service: &str, _result: Result<(), &DiError>) {}
}

/// Registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn LifecycleObserver>>) -> Self {
        Self { observers }
    }

    #[inline]
    pub(crate) fn before_registration(&self, scope: &Scope, service: &str) {
        for observer in &self.observers {
            observer.before_registration(scope, service);
        }
    }

    #[inline]
    pub(crate) fn after_registration(&self, scope: &Scope, service: &str) {
        for observer in &self.observers {
            observer.after_registration(scope, service);
        }
    }

    #[inline]
    pub(crate) fn before_invocation(&self, scope: &Scope, service: &str) {
        for observer in &self.observers {
            observer.before_invocation(scope, service);
        }
    }

    #[inline]
    pub(crate) fn after_invocation(
        &self,
        scope: &Scope,
        service: &str,
        result: Result<(), &DiError>,
        elapsed: Duration,
    ) {
        for observer in &self.observers {
            observer.after_invocation(scope, service, result, elapsed);
        }
    }

    #[inline]
    pub(crate) fn before_shutdown(&self, scope: &Scope, service: &str) {
        for observer in &self.observers {
            observer.before_shutdown(scope, service);
        }
    }

    #[inline]
    pub(crate) fn after_shutdown(&self, scope: &Scope, service: &str, result: Result<(), &DiError>) {
        for observer in &self.observers {
            observer.after_shutdown(scope, service, result);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} observers", self.observers.len())
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// Events use the `ferrous_injector::observer` target: registrations and
/// invocations at `DEBUG`, failures at `WARN`.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, InjectorOptions, TracingObserver};
/// use std::sync::Arc;
///
/// let injector = Injector::with_options(
///     InjectorOptions::new().with_observer(Arc::new(TracingObserver::new())),
/// );
/// injector.provide_value("config", "prod").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct TracingObserver {
    _private: (),
}

impl TracingObserver {
    /// Creates a new tracing observer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LifecycleObserver for TracingObserver {
    fn after_registration(&self, scope: &Scope, service: &str) {
        tracing::debug!(
            target: "ferrous_injector::observer",
            scope = %scope.name(),
            service,
            "registered"
        );
    }

    fn after_invocation(
        &self,
        scope: &Scope,
        service: &str,
        result: Result<(), &DiError>,
        elapsed: Duration,
    ) {
        match result {
            Ok(()) => tracing::debug!(
                target: "ferrous_injector::observer",
                scope = %scope.name(),
                service,
                ?elapsed,
                "invoked"
            ),
            Err(error) => tracing::warn!(
                target: "ferrous_injector::observer",
                scope = %scope.name(),
                service,
                %error,
                "invocation failed"
            ),
        }
    }

    fn after_shutdown(&self, scope: &Scope, service: &str, result: Result<(), &DiError>) {
        match result {
            Ok(()) => tracing::debug!(
                target: "ferrous_injector::observer",
                scope = %scope.name(),
                service,
                "shut down"
            ),
            Err(error) => tracing::warn!(
                target: "ferrous_injector::observer",
                scope = %scope.name(),
                service,
                %error,
                "shutdown failed"
            ),
        }
    }
}
