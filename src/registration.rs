//! Service registration.
//!
//! Every service is registered under an explicit name. The shorthands
//! (`provide_value`, `provide_lazy`, ...) cover the common case; the builder
//! returned by [`Scope::value`], [`Scope::lazy`] and [`Scope::transient`]
//! additionally declares lifecycle capabilities and can override an existing
//! registration.

use std::any::type_name;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::kind::ServiceKind;
use crate::slot::{AliasSlot, EagerSlot, Instance, LazySlot, Provider, ServiceSlot, TransientSlot};
use crate::traits::{HealthCheck, Shutdown};
use crate::{InvocationContext, Scope};

type Factory<T> = Arc<dyn Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync>;
type Decorate = fn(Instance) -> Instance;

enum Source<T> {
    Value(Arc<T>),
    Lazy(Factory<T>),
    Transient(Factory<T>),
}

/// Fluent registration of one service.
///
/// Created by [`Scope::value`], [`Scope::lazy`] or [`Scope::transient`].
/// Nothing is registered until [`provide`](Self::provide) or
/// [`override_existing`](Self::override_existing) is called.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{BoxError, CancellationToken, HealthCheck, Injector, Shutdown};
///
/// struct Pool;
///
/// impl HealthCheck for Pool {
///     fn health_check(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// impl Shutdown for Pool {
///     fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// let injector = Injector::new();
/// injector
///     .lazy("pool", |_| Ok(Pool))
///     .with_health_check()
///     .with_shutdown()
///     .provide()
///     .unwrap();
///
/// // A second `provide` under the same name fails...
/// assert!(injector.lazy("pool", |_| Ok(Pool)).provide().is_err());
/// // ...an override replaces the registration.
/// injector.lazy("pool", |_| Ok(Pool)).override_existing();
/// ```
#[must_use = "the service is only registered by `provide` or `override_existing`"]
pub struct ServiceBuilder<'s, T: Send + Sync + 'static> {
    scope: &'s Scope,
    name: String,
    source: Source<T>,
    decorators: Vec<Decorate>,
}

impl<'s, T: Send + Sync + 'static> ServiceBuilder<'s, T> {
    fn new(scope: &'s Scope, name: String, source: Source<T>) -> Self {
        Self {
            scope,
            name,
            source,
            decorators: Vec::new(),
        }
    }

    /// Runs [`HealthCheck::health_check`] for this service during health
    /// checks.
    pub fn with_health_check(mut self) -> Self
    where
        T: HealthCheck,
    {
        self.decorators.push(Instance::with_health_check::<T>);
        self
    }

    /// Runs [`Shutdown::shutdown`] for this service during shutdown.
    pub fn with_shutdown(mut self) -> Self
    where
        T: Shutdown,
    {
        self.decorators.push(Instance::with_shutdown::<T>);
        self
    }

    /// Registers the service.
    ///
    /// # Errors
    ///
    /// `AlreadyDeclared` if the scope already provides a service with this
    /// name. The scope is left untouched.
    pub fn provide(self) -> DiResult<()> {
        let scope = self.scope;
        let (name, slot) = self.into_slot();
        scope.register(name, slot)
    }

    /// Registers the service, replacing any existing registration with the
    /// same name. Holders of the previous instance are not notified.
    pub fn override_existing(self) {
        let scope = self.scope;
        let (name, slot) = self.into_slot();
        scope.register_replace(name, slot);
    }

    fn into_slot(self) -> (String, ServiceSlot) {
        let decorators = self.decorators;
        let slot = match self.source {
            Source::Value(value) => {
                let instance = decorate(Instance::new(value), &decorators);
                ServiceSlot::Eager(EagerSlot::new(instance))
            }
            Source::Lazy(factory) => {
                ServiceSlot::Lazy(LazySlot::new(type_name::<T>(), provider(factory, decorators)))
            }
            Source::Transient(factory) => ServiceSlot::Transient(TransientSlot::new(
                type_name::<T>(),
                provider(factory, decorators),
            )),
        };
        (self.name, slot)
    }
}

fn decorate(instance: Instance, decorators: &[Decorate]) -> Instance {
    decorators.iter().fold(instance, |instance, apply| apply(instance))
}

fn provider<T: Send + Sync + 'static>(factory: Factory<T>, decorators: Vec<Decorate>) -> Provider {
    Arc::new(move |ctx: &InvocationContext| -> Result<Instance, BoxError> {
        let value = factory(ctx)?;
        Ok(decorate(Instance::new(Arc::new(value)), &decorators))
    })
}

impl Scope {
    /// Starts registering an eager service holding `value`.
    pub fn value<T>(&self, name: impl Into<String>, value: T) -> ServiceBuilder<'_, T>
    where
        T: Send + Sync + 'static,
    {
        ServiceBuilder::new(self, name.into(), Source::Value(Arc::new(value)))
    }

    /// Starts registering a lazy singleton built by `provider` on first
    /// invocation.
    pub fn lazy<T, F>(&self, name: impl Into<String>, provider: F) -> ServiceBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        ServiceBuilder::new(self, name.into(), Source::Lazy(Arc::new(provider)))
    }

    /// Starts registering a transient service built by `provider` on every
    /// invocation.
    pub fn transient<T, F>(&self, name: impl Into<String>, provider: F) -> ServiceBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        ServiceBuilder::new(self, name.into(), Source::Transient(Arc::new(provider)))
    }

    /// Registers an eager value.
    ///
    /// # Errors
    ///
    /// `AlreadyDeclared` if the name is taken in this scope.
    pub fn provide_value<T>(&self, name: impl Into<String>, value: T) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.value(name, value).provide()
    }

    /// Registers a lazy singleton.
    ///
    /// # Errors
    ///
    /// `AlreadyDeclared` if the name is taken in this scope.
    pub fn provide_lazy<T, F>(&self, name: impl Into<String>, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.lazy(name, provider).provide()
    }

    /// Registers a transient service.
    ///
    /// # Errors
    ///
    /// `AlreadyDeclared` if the name is taken in this scope.
    pub fn provide_transient<T, F>(&self, name: impl Into<String>, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.transient(name, provider).provide()
    }

    /// Registers or replaces an eager value.
    pub fn override_value<T>(&self, name: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.value(name, value).override_existing()
    }

    /// Registers or replaces a lazy singleton.
    pub fn override_lazy<T, F>(&self, name: impl Into<String>, provider: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.lazy(name, provider).override_existing()
    }

    /// Registers or replaces a transient service.
    pub fn override_transient<T, F>(&self, name: impl Into<String>, provider: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&InvocationContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.transient(name, provider).override_existing()
    }

    /// Registers `alias` as another name for `target`, exposed as `Arc<A>`.
    ///
    /// `convert` turns the target's `Arc<T>` into the aliased representation;
    /// for a trait object this is usually just an unsizing cast. Invoking the
    /// alias invokes the target through the regular path (cycle detection,
    /// dependency edges), then checks that it holds a `T`. Read the alias back
    /// with [`invoke_as`](crate::Invoker::invoke_as).
    ///
    /// # Errors
    ///
    /// * `AlreadyDeclared` if `alias` is taken in this scope
    /// * `NotFound` if `target` is not visible from this scope
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_injector::{Injector, Invoker};
    /// use std::sync::Arc;
    ///
    /// trait Store: Send + Sync {
    ///     fn kind(&self) -> &'static str;
    /// }
    ///
    /// struct Postgres;
    /// impl Store for Postgres {
    ///     fn kind(&self) -> &'static str { "postgres" }
    /// }
    ///
    /// let injector = Injector::new();
    /// injector.provide_lazy("postgres", |_| Ok(Postgres)).unwrap();
    /// injector
    ///     .provide_alias("store", "postgres", |p: Arc<Postgres>| p as Arc<dyn Store>)
    ///     .unwrap();
    ///
    /// assert_eq!(injector.invoke_as::<dyn Store>("store").unwrap().kind(), "postgres");
    /// assert!(injector.provide_alias("other", "missing", |p: Arc<Postgres>| p).is_err());
    /// ```
    pub fn provide_alias<T, A, F>(
        &self,
        alias: impl Into<String>,
        target: impl Into<String>,
        convert: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
    {
        let (alias, slot) = self.alias_slot(alias.into(), target.into(), convert)?;
        self.register(alias, slot)
    }

    /// Like [`provide_alias`](Self::provide_alias) but replaces an existing
    /// registration under `alias`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `target` is not visible from this scope.
    pub fn override_alias<T, A, F>(
        &self,
        alias: impl Into<String>,
        target: impl Into<String>,
        convert: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
    {
        let (alias, slot) = self.alias_slot(alias.into(), target.into(), convert)?;
        self.register_replace(alias, slot);
        Ok(())
    }

    fn alias_slot<T, A, F>(&self, alias: String, target: String, convert: F) -> DiResult<(String, ServiceSlot)>
    where
        T: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
    {
        if !self.can_resolve(&target) {
            return Err(DiError::NotFound {
                service: target.clone(),
                available: self.visible_names(),
                chain: vec![alias, target],
            });
        }

        let convert = Arc::new(move |instance: &Instance| {
            instance
                .downcast::<T>()
                .map(|value| Instance::new(Arc::new(convert(value))))
        });
        let slot = AliasSlot::new(target, type_name::<A>(), type_name::<T>(), convert);
        Ok((alias, ServiceSlot::Alias(slot)))
    }

    /// Adds a new service; `AlreadyDeclared` when the name is taken here.
    pub(crate) fn register(&self, name: String, slot: ServiceSlot) -> DiResult<()> {
        let taken = || DiError::AlreadyDeclared {
            scope: self.name().to_string(),
            service: name.clone(),
        };
        if self.registry().read().contains(&name) {
            return Err(taken());
        }

        self.shared().observers.before_registration(self, &name);
        let (kind, type_name) = (slot.kind(), slot.type_name());
        {
            let mut registry = self.registry().write();
            // A concurrent registration may have won since the check above
            if registry.contains(&name) {
                return Err(taken());
            }
            registry.insert(name.clone(), slot);
        }
        self.registered(&name, kind, type_name);
        Ok(())
    }

    /// Adds or replaces a service.
    pub(crate) fn register_replace(&self, name: String, slot: ServiceSlot) {
        self.shared().observers.before_registration(self, &name);
        let (kind, type_name) = (slot.kind(), slot.type_name());
        if self.registry().write().insert(name.clone(), slot).is_some() {
            tracing::debug!(
                target: "ferrous_injector",
                scope = %self.name(),
                service = %name,
                "service overridden"
            );
        }
        self.registered(&name, kind, type_name);
    }

    fn registered(&self, name: &str, kind: ServiceKind, type_name: &'static str) {
        tracing::debug!(
            target: "ferrous_injector",
            scope = %self.name(),
            service = name,
            kind = kind.as_str(),
            type_name,
            "service registered"
        );
        self.shared().observers.after_registration(self, name);
    }
}
