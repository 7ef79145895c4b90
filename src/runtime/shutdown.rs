//! Ordered shutdown of a scope subtree.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DiError, DiResult};
use crate::key::EdgeService;
use crate::slot::ServiceSlot;
use crate::{CancellationToken, Scope};

/// Result of a shutdown walk.
///
/// Failures never stop the walk: every service that was attempted is listed
/// in `services` and each failure is recorded against its
/// `(scope, service)` identity.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{BoxError, CancellationToken, Injector, Invoker, Shutdown};
///
/// struct Pool;
/// impl Shutdown for Pool {
///     fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         Err("connections still open".into())
///     }
/// }
///
/// let injector = Injector::new();
/// injector.value("pool", Pool).with_shutdown().provide().unwrap();
/// injector.invoke::<Pool>("pool").unwrap();
///
/// let report = injector.shutdown();
/// assert!(!report.is_ok());
/// assert_eq!(report.services.len(), 1);
///
/// let errors = report.into_result().unwrap_err();
/// assert_eq!(errors.len(), 1);
/// assert!(errors.to_string().contains("[root] > pool"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    /// Services attempted, in the order they were shut down.
    pub services: Vec<EdgeService>,
    /// Failed services.
    pub errors: BTreeMap<EdgeService, DiError>,
    /// Time spent in each attempted hook.
    pub service_durations: HashMap<EdgeService, Duration>,
    /// Wall time of the whole walk.
    pub total_duration: Duration,
}

impl ShutdownReport {
    /// True when no service failed.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Folds a child's report into this one. `total_duration` is left alone.
    pub fn merge(&mut self, other: ShutdownReport) {
        self.services.extend(other.services);
        self.errors.extend(other.errors);
        self.service_durations.extend(other.service_durations);
    }

    /// `Ok` when nothing failed, otherwise every failure as [`ShutdownErrors`].
    pub fn into_result(self) -> Result<(), ShutdownErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ShutdownErrors { errors: self.errors })
        }
    }

    fn record(&mut self, edge: EdgeService, elapsed: Duration, result: DiResult<()>) {
        self.services.push(edge.clone());
        self.service_durations.insert(edge.clone(), elapsed);
        if let Err(err) = result {
            self.errors.insert(edge, err);
        }
    }
}

/// Aggregate of every shutdown failure of one walk.
#[derive(Debug, Clone)]
pub struct ShutdownErrors {
    errors: BTreeMap<EdgeService, DiError>,
}

impl ShutdownErrors {
    /// Number of failed services.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failure recorded for one service, if any.
    pub fn get(&self, edge: &EdgeService) -> Option<&DiError> {
        self.errors.get(edge)
    }

    /// Failures ordered by scope id, then service name.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeService, &DiError)> {
        self.errors.iter()
    }

    /// Consumes the aggregate, returning the failures keyed by service.
    pub fn into_inner(self) -> BTreeMap<EdgeService, DiError> {
        self.errors
    }
}

impl fmt::Display for ShutdownErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DI: shutdown errors:")?;
        for (edge, err) in &self.errors {
            write!(f, "\n  - {} > {}: {}", edge.scope_name, edge.service, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownErrors {}

impl Scope {
    /// Shuts this scope and its subtree down.
    ///
    /// Child scopes go first, in name order; a child whose shutdown fully
    /// succeeded is detached. Then this scope's invoked services are shut
    /// down in reverse order of first invocation, so a service is torn down
    /// before the services it depends on. Never-invoked services are skipped
    /// and stay registered. Invoked eager and lazy services are removed after
    /// their attempt, whatever its outcome; invoking them again yields
    /// `NotFound`.
    pub fn shutdown(&self) -> ShutdownReport {
        self.shutdown_with(&CancellationToken::new())
    }

    /// Like [`shutdown`](Self::shutdown), handing `token` to every hook.
    ///
    /// Services reached after the token is cancelled are reported as
    /// `Cancelled` and left registered, so a later shutdown can retry them.
    pub fn shutdown_with(&self, token: &CancellationToken) -> ShutdownReport {
        let started = Instant::now();
        let mut report = ShutdownReport::default();

        for child in self.children() {
            let child_report = child.shutdown_with(token);
            if child_report.is_ok() {
                self.detach_child(&child);
            }
            report.merge(child_report);
        }

        let invoked = self.registry().read().invoked();
        for name in invoked.into_iter().rev() {
            let slot = self.registry().read().get(&name);
            match slot {
                Some(slot) => self.shutdown_slot(&name, slot, token, &mut report),
                None => self.registry().write().forget_invocation(&name),
            }
        }

        report.total_duration = started.elapsed();
        tracing::debug!(
            target: "ferrous_injector",
            scope = %self.name(),
            services = report.services.len(),
            errors = report.errors.len(),
            elapsed = ?report.total_duration,
            "scope shut down"
        );
        report
    }

    /// Shuts down one service of this scope, invoked or not.
    ///
    /// # Errors
    ///
    /// `NotFound` when this scope does not itself provide `name`, otherwise
    /// the hook's own error.
    pub fn shutdown_service(&self, name: &str) -> DiResult<()> {
        let slot = self.registry().read().get(name);
        let Some(slot) = slot else {
            return Err(DiError::NotFound {
                service: name.to_string(),
                available: self.registry().read().names().cloned().collect(),
                chain: vec![name.to_string()],
            });
        };

        let mut report = ShutdownReport::default();
        self.shutdown_slot(name, slot, &CancellationToken::new(), &mut report);
        match report.errors.into_values().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shuts the subtree down, then detaches this scope from its parent if
    /// every service shut down cleanly.
    pub fn delete(&self) -> ShutdownReport {
        let report = self.shutdown();
        if report.is_ok() {
            if let Some(parent) = self.parent() {
                parent.detach_child(self);
            }
        }
        report
    }

    fn shutdown_slot(
        &self,
        name: &str,
        slot: Arc<ServiceSlot>,
        token: &CancellationToken,
        report: &mut ShutdownReport,
    ) {
        let edge = EdgeService::new(self.id(), self.name(), name);
        if token.is_cancelled() {
            tracing::debug!(target: "ferrous_injector", scope = %self.name(), service = name, "shutdown cancelled");
            report.record(edge, Duration::ZERO, Err(DiError::Cancelled { service: name.to_string() }));
            return;
        }

        let observers = &self.shared().observers;
        observers.before_shutdown(self, name);

        let started = Instant::now();
        let result = slot.shutdown(name, self, token);
        let elapsed = started.elapsed();

        {
            let mut registry = self.registry().write();
            registry.forget_invocation(name);
            let unchanged = registry.get(name).map_or(false, |current| Arc::ptr_eq(&current, &slot));
            if slot.kind().retains_instance() && unchanged {
                registry.remove(name);
            }
        }

        match &result {
            Ok(()) => tracing::trace!(target: "ferrous_injector", scope = %self.name(), service = name, ?elapsed, "service shut down"),
            Err(error) => tracing::warn!(target: "ferrous_injector", scope = %self.name(), service = name, %error, "service shutdown failed"),
        }
        observers.after_shutdown(self, name, result.as_ref().map(|_| ()));
        report.record(edge, elapsed, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, Injector, Invoker, Shutdown};
    use parking_lot::Mutex;

    struct Recorded {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Shutdown for Recorded {
        fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
            self.log.lock().push(self.name);
            Ok(())
        }
    }

    fn recorded(scope: &Scope, name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) {
        let log = log.clone();
        scope
            .lazy(name, move |_| Ok(Recorded { name, log: log.clone() }))
            .with_shutdown()
            .provide()
            .unwrap();
    }

    #[test]
    fn reverse_invocation_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let injector = Injector::new();
        for name in ["a", "b", "c"] {
            recorded(&injector, name, &log);
        }
        injector.invoke::<Recorded>("b").unwrap();
        injector.invoke::<Recorded>("a").unwrap();
        injector.invoke::<Recorded>("c").unwrap();

        let report = injector.shutdown();
        assert!(report.is_ok());
        assert_eq!(*log.lock(), ["c", "a", "b"]);
        assert_eq!(report.services.len(), 3);
        assert!(!injector.has_service("a"));
    }

    #[test]
    fn cancelled_token_leaves_services_registered() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let injector = Injector::new();
        recorded(&injector, "svc", &log);
        injector.invoke::<Recorded>("svc").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let report = injector.shutdown_with(&token);
        assert!(matches!(report.errors.values().next(), Some(DiError::Cancelled { .. })));
        assert!(injector.has_service("svc"));
        assert!(log.lock().is_empty());

        assert!(injector.shutdown().is_ok());
        assert_eq!(*log.lock(), ["svc"]);
    }

    #[test]
    fn shutdown_service_is_local() {
        let injector = Injector::new();
        injector.provide_value("root", 1u8).unwrap();
        let child = injector.create_child("child").unwrap();
        assert!(child.shutdown_service("root").unwrap_err().is_not_found());
        assert!(injector.shutdown_service("root").is_ok());
        assert!(!injector.has_service("root"));
    }

    #[test]
    fn display_lists_every_failure() {
        let scope = crate::key::ScopeId::new();
        let mut errors = BTreeMap::new();
        errors.insert(
            EdgeService::new(scope, "[root]", "db"),
            DiError::Cancelled { service: "db".into() },
        );
        let errors = ShutdownErrors { errors };
        assert_eq!(
            errors.to_string(),
            "DI: shutdown errors:\n  - [root] > db: DI: operation on `db` was cancelled"
        );
    }
}
