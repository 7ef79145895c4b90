//! Service slots: the four construction strategies behind one closed enum.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::key::EdgeService;
use crate::traits::{HealthCheck, Shutdown};
use crate::{CancellationToken, InvocationContext, Scope, ServiceKind};

mod alias;
mod eager;
mod lazy;
mod transient;

pub(crate) use alias::AliasSlot;
pub(crate) use eager::EagerSlot;
pub(crate) use lazy::LazySlot;
pub(crate) use transient::TransientSlot;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Lifecycle hook captured at registration time for a concrete type.
pub(crate) type HookFn = fn(&AnyArc, &CancellationToken) -> Result<(), BoxError>;

/// Type-erased provider producing a fully hooked [`Instance`].
pub(crate) type Provider =
    Arc<dyn Fn(&InvocationContext) -> Result<Instance, BoxError> + Send + Sync>;

fn health_hook<T: HealthCheck>(value: &AnyArc, token: &CancellationToken) -> Result<(), BoxError> {
    match (**value).downcast_ref::<T>() {
        Some(service) => service.health_check(token),
        None => Ok(()),
    }
}

fn shutdown_hook<T: Shutdown>(value: &AnyArc, token: &CancellationToken) -> Result<(), BoxError> {
    match (**value).downcast_ref::<T>() {
        Some(service) => service.shutdown(token),
        None => Ok(()),
    }
}

/// A resolved service value.
///
/// Carries the type-erased value, the name of its concrete type and the
/// lifecycle hooks declared when the service was registered. Cloning is cheap
/// (one `Arc` clone).
#[derive(Clone)]
pub struct Instance {
    value: AnyArc,
    type_name: &'static str,
    health: Option<HookFn>,
    shutdown: Option<HookFn>,
}

impl Instance {
    pub(crate) fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
            health: None,
            shutdown: None,
        }
    }

    pub(crate) fn with_health_check<T: HealthCheck>(mut self) -> Self {
        self.health = Some(health_hook::<T>);
        self
    }

    pub(crate) fn with_shutdown<T: Shutdown>(mut self) -> Self {
        self.shutdown = Some(shutdown_hook::<T>);
        self
    }

    /// Name of the concrete type stored in this instance.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the stored value is a `T`.
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        (*self.value).is::<T>()
    }

    /// Returns the value as `Arc<T>`, or `None` if it has another type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// True when a health-check hook was declared at registration.
    pub fn has_health_check(&self) -> bool {
        self.health.is_some()
    }

    /// True when a shutdown hook was declared at registration.
    pub fn has_shutdown(&self) -> bool {
        self.shutdown.is_some()
    }

    pub(crate) fn typed<T: Any + Send + Sync>(&self, service: &str) -> DiResult<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| DiError::TypeMismatch {
            service: service.to_string(),
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }

    pub(crate) fn run_health_check(&self, token: &CancellationToken) -> Result<(), BoxError> {
        match self.health {
            Some(hook) => crate::internal::catch_hook(|| hook(&self.value, token)),
            None => Ok(()),
        }
    }

    pub(crate) fn run_shutdown(&self, token: &CancellationToken) -> Result<(), BoxError> {
        match self.shutdown {
            Some(hook) => crate::internal::catch_hook(|| hook(&self.value, token)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("health_check", &self.health.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

/// One registered service.
pub(crate) enum ServiceSlot {
    Eager(EagerSlot),
    Lazy(LazySlot),
    Transient(TransientSlot),
    Alias(AliasSlot),
}

impl ServiceSlot {
    pub(crate) fn kind(&self) -> ServiceKind {
        match self {
            ServiceSlot::Eager(_) => ServiceKind::Eager,
            ServiceSlot::Lazy(_) => ServiceKind::Lazy,
            ServiceSlot::Transient(_) => ServiceKind::Transient,
            ServiceSlot::Alias(_) => ServiceKind::Alias,
        }
    }

    /// Declared type of the service.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ServiceSlot::Eager(s) => s.type_name(),
            ServiceSlot::Lazy(s) => s.type_name(),
            ServiceSlot::Transient(s) => s.type_name(),
            ServiceSlot::Alias(s) => s.type_name(),
        }
    }

    /// Produces the instance. `ctx` already has `name` appended to its chain
    /// and is rooted at the owning scope.
    pub(crate) fn get_instance(&self, name: &str, ctx: &InvocationContext) -> DiResult<Instance> {
        match self {
            ServiceSlot::Eager(s) => Ok(s.get_instance()),
            ServiceSlot::Lazy(s) => s.get_instance(name, ctx),
            ServiceSlot::Transient(s) => s.get_instance(name, ctx),
            ServiceSlot::Alias(s) => s.get_instance(ctx),
        }
    }

    pub(crate) fn health_check(
        &self,
        name: &str,
        owner: &Scope,
        token: &CancellationToken,
    ) -> DiResult<()> {
        self.health_check_visiting(name, owner, token, &mut Vec::new())
    }

    pub(crate) fn shutdown(&self, name: &str, owner: &Scope, token: &CancellationToken) -> DiResult<()> {
        self.shutdown_visiting(name, owner, token, &mut Vec::new())
    }

    // `visited` guards alias delegation against alias loops.
    fn health_check_visiting(
        &self,
        name: &str,
        owner: &Scope,
        token: &CancellationToken,
        visited: &mut Vec<EdgeService>,
    ) -> DiResult<()> {
        match self {
            ServiceSlot::Eager(s) => s.health_check(name, token),
            ServiceSlot::Lazy(s) => s.health_check(name, token),
            ServiceSlot::Transient(_) => Ok(()),
            ServiceSlot::Alias(s) => match s.target_slot(name, owner, visited)? {
                Some((slot, target_owner)) => {
                    slot.health_check_visiting(s.target(), &target_owner, token, visited)
                }
                None => Ok(()),
            },
        }
    }

    fn shutdown_visiting(
        &self,
        name: &str,
        owner: &Scope,
        token: &CancellationToken,
        visited: &mut Vec<EdgeService>,
    ) -> DiResult<()> {
        match self {
            ServiceSlot::Eager(s) => s.shutdown(name, token),
            ServiceSlot::Lazy(s) => s.shutdown(name, token),
            ServiceSlot::Transient(_) => Ok(()),
            // An ancestor's target outlives this scope and is shut down with
            // its own scope.
            ServiceSlot::Alias(s) => match s.target_slot(name, owner, visited)? {
                Some((slot, target_owner)) if target_owner.id() == owner.id() => {
                    slot.shutdown_visiting(s.target(), &target_owner, token, visited)
                }
                _ => Ok(()),
            },
        }
    }

    /// Copy for a cloned scope: lazy slots reset, everything else carries over.
    pub(crate) fn clone_slot(&self) -> ServiceSlot {
        match self {
            ServiceSlot::Eager(s) => ServiceSlot::Eager(s.clone_slot()),
            ServiceSlot::Lazy(s) => ServiceSlot::Lazy(s.clone_slot()),
            ServiceSlot::Transient(s) => ServiceSlot::Transient(s.clone()),
            ServiceSlot::Alias(s) => ServiceSlot::Alias(s.clone()),
        }
    }
}

pub(crate) fn hook_error_to_shutdown(service: &str, err: BoxError) -> DiError {
    DiError::ShutdownFailure {
        service: service.to_string(),
        source: Arc::from(err),
    }
}

pub(crate) fn hook_error_to_health(service: &str, err: BoxError) -> DiError {
    DiError::HealthCheckFailure {
        service: service.to_string(),
        source: Arc::from(err),
    }
}
