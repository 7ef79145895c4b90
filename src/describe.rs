//! Introspection: service listings and descriptions of services and scopes.

use std::collections::HashSet;
use std::fmt;
use std::iter;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::key::{EdgeService, ScopeId};
use crate::{Scope, ServiceKind};

/// What is known about one invoked service.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker, ServiceKind};
///
/// let injector = Injector::new();
/// injector.provide_value("root-service", "v".to_string()).unwrap();
/// let child = injector.create_child("child").unwrap();
/// child.provide_lazy("child-service", |ctx| {
///     Ok(format!("child:{}", ctx.invoke::<String>("root-service")?))
/// }).unwrap();
///
/// // Not invoked yet: nothing to describe.
/// assert!(child.describe("child-service").is_none());
///
/// assert_eq!(*child.invoke::<String>("child-service").unwrap(), "child:v");
///
/// let described = child.describe("child-service").unwrap();
/// assert_eq!(described.kind, ServiceKind::Lazy);
/// assert_eq!(described.dependencies[0].service, "root-service");
///
/// let root = child.describe("root-service").unwrap();
/// assert_eq!(root.service.scope_name, "[root]");
/// assert_eq!(root.dependents[0].service, "child-service");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ServiceDescription {
    /// The service in its owning scope
    pub service: EdgeService,
    pub kind: ServiceKind,
    /// Declared type name
    pub type_name: &'static str,
    /// Services it invoked while being built, sorted
    pub dependencies: Vec<EdgeService>,
    /// Services that invoked it while being built, sorted
    pub dependents: Vec<EdgeService>,
}

impl fmt::Display for ServiceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}, {})", self.service, self.kind, self.type_name)?;
        for dependency in &self.dependencies {
            writeln!(f, "  -> {}", dependency)?;
        }
        for dependent in &self.dependents {
            writeln!(f, "  <- {}", dependent)?;
        }
        Ok(())
    }
}

/// Snapshot of a scope: its place in the tree and what it provides.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ScopeDescription {
    pub id: ScopeId,
    pub name: String,
    /// `(id, name)` of each ancestor, nearest first
    pub ancestors: Vec<(ScopeId, String)>,
    /// Child scopes in name order, described recursively
    pub children: Vec<ScopeDescription>,
    /// Local services in name order
    pub services: Vec<(String, ServiceKind)>,
}

impl ScopeDescription {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(f, "{}{} ({})", indent, self.name, self.id)?;
        for (service, kind) in &self.services {
            writeln!(f, "{}  * {} [{}]", indent, service, kind)?;
        }
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ScopeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl Scope {
    /// Services visible from this scope, nearest scope first.
    ///
    /// A name shadowed by a nearer scope is listed once, for the nearest
    /// scope. Within a scope, names are sorted.
    pub fn list_provided(&self) -> Vec<EdgeService> {
        self.collect_visible(|scope| scope.registry().read().names().cloned().collect())
    }

    /// Invoked services visible from this scope, nearest scope first and in
    /// order of first invocation within a scope.
    pub fn list_invoked(&self) -> Vec<EdgeService> {
        self.collect_visible(|scope| scope.registry().read().invoked())
    }

    fn collect_visible(&self, names_of: impl Fn(&Scope) -> Vec<String>) -> Vec<EdgeService> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for scope in iter::once(self.clone()).chain(self.ancestors()) {
            for name in names_of(&scope) {
                if seen.insert(name.clone()) {
                    out.push(EdgeService::new(scope.id(), scope.name(), name));
                }
            }
        }
        out
    }

    /// Describes the service visible under `name`.
    ///
    /// Returns `None` when `name` is not visible or has not been invoked yet
    /// in the scope that provides it.
    pub fn describe(&self, name: &str) -> Option<ServiceDescription> {
        let (slot, owner) = self.resolve(name)?;
        if !owner.registry().read().is_invoked(name) {
            return None;
        }

        let service = EdgeService::new(owner.id(), owner.name(), name);
        let (dependencies, dependents) = self.graph().query(&service);
        Some(ServiceDescription {
            service,
            kind: slot.kind(),
            type_name: slot.type_name(),
            dependencies,
            dependents,
        })
    }

    /// Describes this scope and its subtree.
    pub fn describe_scope(&self) -> ScopeDescription {
        let services = self
            .registry()
            .read()
            .slots()
            .map(|(name, slot)| (name.clone(), slot.kind()))
            .collect();
        ScopeDescription {
            id: self.id(),
            name: self.name().to_string(),
            ancestors: self
                .ancestors()
                .iter()
                .map(|scope| (scope.id(), scope.name().to_string()))
                .collect(),
            children: self.children().iter().map(Scope::describe_scope).collect(),
            services,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Injector, Invoker, ServiceKind};

    #[test]
    fn shadowed_names_listed_once() {
        let injector = Injector::new();
        injector.provide_value("shared", 1u8).unwrap();
        injector.provide_value("root-only", 2u8).unwrap();
        let child = injector.create_child("child").unwrap();
        child.provide_value("shared", 3u8).unwrap();

        let provided: Vec<(String, String)> = child
            .list_provided()
            .into_iter()
            .map(|e| (e.scope_name, e.service))
            .collect();
        assert_eq!(
            provided,
            [
                ("child".to_string(), "shared".to_string()),
                ("[root]".to_string(), "root-only".to_string()),
            ]
        );
    }

    #[test]
    fn list_invoked_follows_first_invocation() {
        let injector = Injector::new();
        injector.provide_value("a", 1u8).unwrap();
        injector.provide_value("b", 2u8).unwrap();
        injector.provide_value("c", 3u8).unwrap();
        injector.invoke::<u8>("c").unwrap();
        injector.invoke::<u8>("a").unwrap();
        injector.invoke::<u8>("c").unwrap();

        let invoked: Vec<String> = injector.list_invoked().into_iter().map(|e| e.service).collect();
        assert_eq!(invoked, ["c", "a"]);
    }

    #[test]
    fn describe_scope_is_recursive() {
        let injector = Injector::new();
        injector.provide_lazy("db", |_| Ok(1u8)).unwrap();
        let child = injector.create_child("request").unwrap();
        child.provide_transient("handler", |_| Ok(2u8)).unwrap();
        child.create_child("nested").unwrap();

        let described = injector.describe_scope();
        assert_eq!(described.name, "[root]");
        assert_eq!(described.services, [("db".to_string(), ServiceKind::Lazy)]);
        assert_eq!(described.children.len(), 1);
        let request = &described.children[0];
        assert_eq!(request.ancestors, [(injector.id(), "[root]".to_string())]);
        assert_eq!(request.services, [("handler".to_string(), ServiceKind::Transient)]);
        assert_eq!(request.children[0].name, "nested");

        let rendered = described.to_string();
        assert!(rendered.contains("* handler [transient]"));
    }

    #[test]
    fn unknown_service_has_no_description() {
        let injector = Injector::new();
        assert!(injector.describe("ghost").is_none());
    }
}
