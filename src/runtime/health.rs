//! Health checks across a scope and its ancestors.

use std::collections::{BTreeMap, HashSet};
use std::iter;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{BoxError, DiError, DiResult};
use crate::internal::pool::run_bounded;
use crate::slot::ServiceSlot;
use crate::{CancellationToken, Scope};

/// Outcome of a health check, keyed by service name.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{BoxError, CancellationToken, HealthCheck, Injector};
///
/// struct Cache;
/// impl HealthCheck for Cache {
///     fn health_check(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// let injector = Injector::new();
/// injector.value("cache", Cache).with_health_check().provide().unwrap();
/// injector.provide_value("plain", 1u8).unwrap();
///
/// let report = injector.health_check();
/// assert!(report.is_healthy());
/// assert_eq!(report.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    results: BTreeMap<String, DiResult<()>>,
}

impl HealthReport {
    /// Result for one service, `None` if it was not checked.
    pub fn get(&self, service: &str) -> Option<&DiResult<()>> {
        self.results.get(service)
    }

    /// True when every check passed.
    pub fn is_healthy(&self) -> bool {
        self.results.values().all(Result::is_ok)
    }

    /// Failed checks in name order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &DiError)> {
        self.results
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (name.as_str(), e)))
    }

    /// All results in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiResult<()>)> {
        self.results.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Number of services checked.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when no service was checked.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consumes the report, returning the result of every service by name.
    pub fn into_inner(self) -> BTreeMap<String, DiResult<()>> {
        self.results
    }
}

struct HealthJob {
    name: String,
    slot: Arc<ServiceSlot>,
    owner: Scope,
}

fn deadline_passed(token: &CancellationToken) -> bool {
    token.remaining().map_or(false, |left| left.is_zero())
}

/// Runs one check under `parent`, bounded by `per_check`.
fn run_check(job: HealthJob, parent: &CancellationToken, per_check: Option<Duration>) -> DiResult<()> {
    let token = match per_check {
        Some(timeout) => parent.child_with_timeout(timeout),
        None => parent.child_token(),
    };

    let started = Instant::now();
    if token.is_cancelled() {
        return Err(if deadline_passed(&token) {
            DiError::HealthCheckTimeout { service: job.name, timeout: None }
        } else {
            DiError::Cancelled { service: job.name }
        });
    }

    let Some(deadline) = token.deadline() else {
        return job.slot.health_check(&job.name, &job.owner, &token);
    };

    // The hook runs on its own thread so an expired check can be abandoned.
    let (tx, rx) = mpsc::channel();
    let name = job.name.clone();
    let hook_token = token.clone();
    let spawned = thread::Builder::new()
        .name(format!("health-check-{}", name))
        .spawn(move || {
            let result = job.slot.health_check(&job.name, &job.owner, &hook_token);
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        return Err(DiError::HealthCheckFailure {
            service: name,
            source: Arc::new(err),
        });
    }

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            token.cancel();
            tracing::warn!(target: "ferrous_injector", service = %name, "health check timed out");
            Err(DiError::HealthCheckTimeout {
                service: name,
                timeout: Some(deadline.saturating_duration_since(started)),
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(DiError::HealthCheckFailure {
            service: name,
            source: Arc::from(BoxError::from("health check thread exited without a result")),
        }),
    }
}

impl Scope {
    fn health_token(&self, token: &CancellationToken) -> CancellationToken {
        match self.options().health_check_global_timeout {
            Some(timeout) => token.child_with_timeout(timeout),
            None => token.child_token(),
        }
    }

    /// Checks every service of this scope and of its ancestors.
    ///
    /// A service provided by several scopes on the path is checked once, in
    /// the nearest scope. Lazy services that have not been built report
    /// healthy and are not constructed. Checks run concurrently, bounded by
    /// [`health_check_parallelism`](crate::InjectorOptions::health_check_parallelism);
    /// a check that misses its deadline is reported as `HealthCheckTimeout`.
    pub fn health_check(&self) -> HealthReport {
        self.health_check_with(&CancellationToken::new())
    }

    /// Like [`health_check`](Self::health_check) with a caller-supplied token.
    /// Cancelling the token makes checks that have not started yet report
    /// `Cancelled`.
    pub fn health_check_with(&self, token: &CancellationToken) -> HealthReport {
        let token = self.health_token(token);
        let options = self.options();

        let mut seen = HashSet::new();
        let mut jobs = Vec::new();
        for scope in iter::once(self.clone()).chain(self.ancestors()) {
            let slots: Vec<(String, Arc<ServiceSlot>)> = scope
                .registry()
                .read()
                .slots()
                .map(|(name, slot)| (name.clone(), slot.clone()))
                .collect();
            for (name, slot) in slots {
                if seen.insert(name.clone()) {
                    jobs.push(HealthJob { name, slot, owner: scope.clone() });
                }
            }
        }

        tracing::debug!(
            target: "ferrous_injector",
            scope = %self.name(),
            services = jobs.len(),
            "health check requested"
        );

        let per_check = options.health_check_timeout;
        let results = run_bounded(jobs, options.health_check_parallelism, |job| {
            let name = job.name.clone();
            (name, run_check(job, &token, per_check))
        });

        let report = HealthReport {
            results: results.into_iter().collect(),
        };
        for (service, error) in report.errors() {
            tracing::warn!(target: "ferrous_injector", service, %error, "unhealthy service");
        }
        report
    }

    /// Checks a single service visible from this scope.
    ///
    /// # Errors
    ///
    /// `NotFound` when no scope on the path provides `name`, otherwise the
    /// check's own error.
    pub fn health_check_service(&self, name: &str) -> DiResult<()> {
        let Some((slot, owner)) = self.resolve(name) else {
            return Err(DiError::NotFound {
                service: name.to_string(),
                available: self.visible_names(),
                chain: vec![name.to_string()],
            });
        };
        let token = self.health_token(&CancellationToken::new());
        let job = HealthJob { name: name.to_string(), slot, owner };
        run_check(job, &token, self.options().health_check_timeout)
    }
}
