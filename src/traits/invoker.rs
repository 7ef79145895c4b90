//! Invocation traits.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::Instance;

/// Service invocation by name.
///
/// Implemented by [`Scope`](crate::Scope), [`Injector`](crate::Injector) and
/// [`InvocationContext`](crate::InvocationContext). Providers receive an
/// `InvocationContext` and use the same methods to pull their dependencies,
/// which is how dependency edges and cycles are tracked.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let injector = Injector::new();
/// injector.provide_value("port", 8080u16).unwrap();
/// injector.provide_value("console", ConsoleLogger).unwrap();
/// injector
///     .provide_alias("logger", "console", |c: Arc<ConsoleLogger>| c as Arc<dyn Logger>)
///     .unwrap();
///
/// // Concrete types
/// assert_eq!(*injector.invoke::<u16>("port").unwrap(), 8080);
///
/// // Trait objects through an alias
/// let logger = injector.invoke_as::<dyn Logger>("logger").unwrap();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Invoker {
    /// Resolves a service without any type expectation.
    ///
    /// This is the primitive every other method builds on: cycle detection,
    /// ancestor lookup, ledger and dependency graph updates all happen here.
    fn invoke_any(&self, name: &str) -> DiResult<Instance>;

    /// Resolves a service registered with the concrete type `T`.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no scope on the path to the root provides `name`
    /// * `Circular` - `name` is already under construction in this call tree
    /// * `TypeMismatch` - the service holds another type
    /// * `ProviderFailure` - the provider returned an error or panicked
    fn invoke<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        self.invoke_any(name)?.typed::<T>(name)
    }

    /// Resolves a service stored as `Arc<A>`, typically a trait object
    /// registered through an alias.
    fn invoke_as<A: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<A>> {
        let instance = self.invoke_any(name)?;
        match instance.downcast::<Arc<A>>() {
            Some(inner) => Ok(Arc::clone(&inner)),
            None => Err(DiError::TypeMismatch {
                service: name.to_string(),
                expected: type_name::<A>(),
                found: instance.type_name(),
            }),
        }
    }

    /// Like [`invoke`](Self::invoke) but panics on error.
    ///
    /// # Panics
    ///
    /// Panics with the error's message if the service cannot be resolved.
    fn must_invoke<T: Any + Send + Sync>(&self, name: &str) -> Arc<T> {
        match self.invoke::<T>(name) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`invoke_as`](Self::invoke_as) but panics on error.
    ///
    /// # Panics
    ///
    /// Panics with the error's message if the service cannot be resolved.
    fn must_invoke_as<A: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Arc<A> {
        match self.invoke_as::<A>(name) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}
