//! The injector: owner of the root scope and of tree-wide state.

use std::ops::Deref;
use std::sync::Arc;

use crate::error::DiResult;
use crate::graph::DependencyGraph;
use crate::observer::Observers;
use crate::slot::Instance;
use crate::traits::Invoker;
use crate::{InjectorOptions, Scope};

/// State shared by every scope of one tree.
pub(crate) struct Shared {
    pub(crate) graph: DependencyGraph,
    pub(crate) options: InjectorOptions,
    pub(crate) observers: Observers,
}

impl Shared {
    fn new(options: InjectorOptions) -> Arc<Self> {
        Arc::new(Shared {
            graph: DependencyGraph::new(),
            observers: Observers::new(options.observers.clone()),
            options,
        })
    }
}

/// Dependency injection container.
///
/// An `Injector` owns the root [`Scope`] of a scope tree and dereferences to
/// it, so every scope operation is available directly on the injector.
/// Dropping the injector drops the whole tree; child scope handles that
/// outlive it keep working on their own services only.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// let injector = Injector::new();
/// injector.provide_value("config", Config { url: "postgres://localhost".into() }).unwrap();
/// injector.provide_lazy("db", |ctx| {
///     Ok(Database { config: ctx.invoke::<Config>("config")? })
/// }).unwrap();
///
/// let db = injector.invoke::<Database>("db").unwrap();
/// assert_eq!(db.config.url, "postgres://localhost");
///
/// let report = injector.shutdown();
/// assert!(report.is_ok());
/// ```
pub struct Injector {
    root: Scope,
}

impl Injector {
    /// Creates an injector with default options.
    pub fn new() -> Self {
        Self::with_options(InjectorOptions::default())
    }

    /// Creates an injector with the given options.
    pub fn with_options(options: InjectorOptions) -> Self {
        let root = Scope::new_root(Shared::new(options));
        tracing::debug!(
            target: "ferrous_injector",
            scope_id = %root.id(),
            health_check_parallelism = root.options().health_check_parallelism,
            "injector created"
        );
        Injector { root }
    }

    /// The root scope.
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Deep copy of the whole tree into a new injector.
    ///
    /// The copy has the same options and observers, a fresh dependency graph,
    /// unbuilt lazy services and empty ledgers. Eager values are shared.
    pub fn clone_injector(&self) -> Injector {
        let shared = Shared::new(self.root.options().clone());
        Injector {
            root: self.root.clone_with(None, shared),
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Injector {
    type Target = Scope;

    fn deref(&self) -> &Scope {
        &self.root
    }
}

impl Invoker for Injector {
    fn invoke_any(&self, name: &str) -> DiResult<Instance> {
        self.root.invoke_any(name)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("root", &self.root)
            .field("options", self.root.options())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ROOT_SCOPE_NAME;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn root_scope_is_named() {
        let injector = Injector::new();
        assert_eq!(injector.name(), ROOT_SCOPE_NAME);
        assert!(injector.is_root());
        assert!(injector.parent().is_none());
    }

    #[test]
    fn clone_injector_resets_lazy_and_keeps_eager() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let injector = Injector::new();
        injector.provide_value("eager", String::from("shared")).unwrap();
        injector
            .provide_lazy("lazy", move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
            .unwrap();
        let child = injector.create_child("child").unwrap();
        child.provide_value("leaf", 1u8).unwrap();

        let original_lazy = injector.invoke::<usize>("lazy").unwrap();
        let original_eager = injector.invoke::<String>("eager").unwrap();

        let copy = injector.clone_injector();
        assert_ne!(copy.id(), injector.id());
        assert!(copy.list_invoked().is_empty());
        assert!(copy.graph().is_empty());

        let copied_lazy = copy.invoke::<usize>("lazy").unwrap();
        assert_eq!(*original_lazy, 0);
        assert_eq!(*copied_lazy, 1);
        assert!(Arc::ptr_eq(&original_eager, &copy.invoke::<String>("eager").unwrap()));

        let copied_child = copy.child_by_name("child").unwrap();
        assert_ne!(copied_child.id(), child.id());
        assert_eq!(copied_child.parent().unwrap().id(), copy.id());
        assert_eq!(*copied_child.invoke::<u8>("leaf").unwrap(), 1);
    }
}
