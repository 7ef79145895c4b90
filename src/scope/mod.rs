//! Scope tree.
//!
//! A scope owns its services and its child scopes. Lookups walk from a scope
//! towards the root: services are visible to descendants, invisible to
//! ancestors and never shared between siblings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::context::InvocationContext;
use crate::error::{DiError, DiResult};
use crate::graph::DependencyGraph;
use crate::injector::Shared;
use crate::key::ScopeId;
use crate::slot::{Instance, ServiceSlot};
use crate::traits::Invoker;
use crate::{InjectorOptions, ServiceKind};

mod registry;

pub(crate) use registry::Registry;

/// Name of the scope owned by an [`Injector`](crate::Injector).
pub const ROOT_SCOPE_NAME: &str = "[root]";

/// A node of the scope tree.
///
/// `Scope` is a cheap handle (`Arc`) and can be cloned and sent across
/// threads freely. Parents own their children; a child only keeps a weak
/// reference to its parent, so keep the [`Injector`](crate::Injector) alive
/// for as long as its scopes are in use. A scope whose parent has been
/// dropped resolves only its own services.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker};
///
/// let injector = Injector::new();
/// injector.provide_value("config", "prod".to_string()).unwrap();
///
/// let request = injector.create_child("request").unwrap();
/// request.provide_value("user", 42u64).unwrap();
///
/// // Children see their ancestors' services...
/// assert_eq!(*request.invoke::<String>("config").unwrap(), "prod");
/// // ...but not the other way around.
/// assert!(injector.invoke::<u64>("user").unwrap_err().is_not_found());
///
/// assert_eq!(request.parent().unwrap().id(), injector.id());
/// assert!(injector.create_child("request").is_err());
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    id: ScopeId,
    name: String,
    parent: Option<Weak<ScopeInner>>,
    children: RwLock<BTreeMap<String, Scope>>,
    registry: RwLock<Registry>,
    shared: Arc<Shared>,
}

impl Scope {
    fn with_parent(name: String, parent: Option<Weak<ScopeInner>>, shared: Arc<Shared>) -> Self {
        Scope {
            inner: Arc::new(ScopeInner {
                id: ScopeId::new(),
                name,
                parent,
                children: RwLock::new(BTreeMap::new()),
                registry: RwLock::new(Registry::default()),
                shared,
            }),
        }
    }

    pub(crate) fn new_root(shared: Arc<Shared>) -> Self {
        Self::with_parent(ROOT_SCOPE_NAME.to_string(), None, shared)
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.inner.registry
    }

    /// Unique id of this scope.
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True for the scope owned by the injector.
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Options of the injector this scope belongs to.
    pub fn options(&self) -> &InjectorOptions {
        &self.inner.shared.options
    }

    /// Tree-wide dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.inner.shared.graph
    }

    /// Parent scope, `None` for the root or when the parent was dropped.
    pub fn parent(&self) -> Option<Scope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Scope> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(scope) = current {
            current = scope.parent();
            out.push(scope);
        }
        out
    }

    /// Direct children in name order.
    pub fn children(&self) -> Vec<Scope> {
        self.inner.children.read().values().cloned().collect()
    }

    /// Searches the subtree below this scope, depth-first.
    pub fn child_by_id(&self, id: ScopeId) -> Option<Scope> {
        for child in self.children() {
            if child.id() == id {
                return Some(child);
            }
            if let Some(found) = child.child_by_id(id) {
                return Some(found);
            }
        }
        None
    }

    /// Searches the subtree below this scope, depth-first. Direct children are
    /// matched before grandchildren of an earlier sibling are searched.
    pub fn child_by_name(&self, name: &str) -> Option<Scope> {
        let children = self.children();
        if let Some(child) = children.iter().find(|c| c.name() == name) {
            return Some(child.clone());
        }
        children.iter().find_map(|c| c.child_by_name(name))
    }

    /// Creates a named child scope.
    ///
    /// # Errors
    ///
    /// `ScopeAlreadyDeclared` when this scope already has a child with that
    /// name.
    pub fn create_child(&self, name: impl Into<String>) -> DiResult<Scope> {
        let name = name.into();
        let mut children = self.inner.children.write();
        if children.contains_key(&name) {
            return Err(DiError::ScopeAlreadyDeclared {
                parent: self.name().to_string(),
                scope: name,
            });
        }

        let child = Scope::with_parent(
            name.clone(),
            Some(Arc::downgrade(&self.inner)),
            self.inner.shared.clone(),
        );
        children.insert(name, child.clone());
        drop(children);

        tracing::debug!(
            target: "ferrous_injector",
            parent = %self.name(),
            scope = %child.name(),
            scope_id = %child.id(),
            "scope created"
        );
        Ok(child)
    }

    /// Removes `child` from this scope's children if it is still the one
    /// registered under its name.
    pub(crate) fn detach_child(&self, child: &Scope) -> bool {
        let mut children = self.inner.children.write();
        let current = children
            .get(child.name())
            .map_or(false, |existing| existing.id() == child.id());
        if current {
            children.remove(child.name());
        }
        current
    }

    /// Finds the slot for `name` here or in the nearest ancestor that has it.
    pub(crate) fn resolve(&self, name: &str) -> Option<(Arc<ServiceSlot>, Scope)> {
        if let Some(slot) = self.inner.registry.read().get(name) {
            return Some((slot, self.clone()));
        }
        let mut current = self.parent();
        while let Some(scope) = current {
            let found = scope.inner.registry.read().get(name);
            if let Some(slot) = found {
                return Some((slot, scope));
            }
            current = scope.parent();
        }
        None
    }

    /// Every service name visible from here, sorted and deduplicated.
    pub(crate) fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.registry.read().names().cloned().collect();
        for ancestor in self.ancestors() {
            names.extend(ancestor.inner.registry.read().names().cloned());
        }
        names.sort();
        names.dedup();
        names
    }

    pub(crate) fn mark_invoked(&self, name: &str) {
        self.inner.registry.write().mark_invoked(name);
    }

    /// True when this scope itself provides `name`.
    pub fn has_service(&self, name: &str) -> bool {
        self.inner.registry.read().contains(name)
    }

    /// True when `name` is provided here or by an ancestor.
    pub fn can_resolve(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Construction strategy of the service visible under `name`.
    pub fn service_kind(&self, name: &str) -> Option<ServiceKind> {
        self.resolve(name).map(|(slot, _)| slot.kind())
    }

    /// Deep copy of this scope and its subtree.
    ///
    /// Lazy services start unbuilt in the copy, eager values are shared and
    /// nothing has been invoked yet. The copy keeps this scope's parent for
    /// lookups but is not registered as one of its children.
    pub fn clone_tree(&self) -> Scope {
        self.clone_with(self.inner.parent.clone(), self.inner.shared.clone())
    }

    pub(crate) fn clone_with(&self, parent: Option<Weak<ScopeInner>>, shared: Arc<Shared>) -> Scope {
        let clone = Scope::with_parent(self.inner.name.clone(), parent, shared);

        let names: Vec<String> = {
            let source = self.inner.registry.read();
            let mut target = clone.inner.registry.write();
            for (name, slot) in source.slots() {
                target.insert(name.clone(), slot.clone_slot());
            }
            let names: Vec<String> = source.names().cloned().collect();
            names
        };
        for name in &names {
            clone.shared().observers.after_registration(&clone, name);
        }

        for child in self.children() {
            let copy = child.clone_with(Some(Arc::downgrade(&clone.inner)), clone.inner.shared.clone());
            clone.inner.children.write().insert(copy.name().to_string(), copy);
        }

        tracing::debug!(
            target: "ferrous_injector",
            scope = %clone.name(),
            source_id = %self.id(),
            scope_id = %clone.id(),
            services = names.len(),
            "scope cloned"
        );
        clone
    }
}

impl Invoker for Scope {
    fn invoke_any(&self, name: &str) -> DiResult<Instance> {
        InvocationContext::root(self.clone()).invoke_any(name)
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("services", &self.inner.registry.read().len())
            .field("children", &self.inner.children.read().len())
            .finish()
    }
}
