//! Invocation context: the call chain of one external invoke.
//!
//! Cycle detection is purely dynamic. Every nested invoke carries the chain of
//! names currently under construction; asking for a name that is already in
//! the chain is a cycle. The chain is an immutable value handed down the call
//! tree, never thread-local state, so concurrent invokes on different threads
//! cannot see each other's chains.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{DiError, DiResult};
use crate::key::{EdgeService, ScopeId};
use crate::traits::Invoker;
use crate::{Instance, Scope};

/// Context passed to providers for resolving dependencies.
///
/// The context is rooted at the scope that owns the service being built, so
/// a provider sees that scope and its ancestors, never the scope the outer
/// call started from.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let injector = Injector::new();
/// injector.provide_value("db", Database { url: "postgres://localhost".into() }).unwrap();
/// injector.provide_transient("users", |ctx| {
///     Ok(UserService { db: ctx.invoke::<Database>("db")? })
/// }).unwrap();
///
/// let users = injector.invoke::<UserService>("users").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct InvocationContext {
    scope: Scope,
    chain: Arc<[String]>,
}

impl InvocationContext {
    /// Context for a top-level call on `scope`: empty chain.
    pub(crate) fn root(scope: Scope) -> Self {
        Self {
            scope,
            chain: Arc::from(Vec::new()),
        }
    }

    /// Id of the scope that owns the service under construction.
    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    /// Name of the scope that owns the service under construction.
    pub fn scope_name(&self) -> &str {
        self.scope.name()
    }

    /// Names currently under construction, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    fn extended(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend(self.chain.iter().cloned());
        chain.push(name.to_string());
        chain
    }
}

impl Invoker for InvocationContext {
    fn invoke_any(&self, name: &str) -> DiResult<Instance> {
        if self.chain.iter().any(|n| n == name) {
            let cycle = self.extended(name);
            tracing::warn!(
                target: "ferrous_injector",
                scope = %self.scope.name(),
                path = ?cycle,
                "circular dependency detected"
            );
            return Err(DiError::Circular(cycle));
        }

        let Some((slot, owner)) = self.scope.resolve(name) else {
            return Err(DiError::NotFound {
                service: name.to_string(),
                available: self.scope.visible_names(),
                chain: self.extended(name),
            });
        };

        let shared = self.scope.shared();
        shared.observers.before_invocation(&owner, name);
        let started = Instant::now();

        let child = InvocationContext {
            scope: owner.clone(),
            chain: Arc::from(self.extended(name)),
        };
        let result = slot.get_instance(name, &child);

        if result.is_ok() {
            if let Some(parent) = self.chain.last() {
                shared.graph.add_edge(
                    EdgeService::new(self.scope.id(), self.scope.name(), parent.as_str()),
                    EdgeService::new(owner.id(), owner.name(), name),
                );
            }
            owner.mark_invoked(name);
            tracing::trace!(
                target: "ferrous_injector",
                scope = %owner.name(),
                service = name,
                depth = self.chain.len(),
                "service invoked"
            );
        }

        shared.observers.after_invocation(
            &owner,
            name,
            result.as_ref().map(|_| ()),
            started.elapsed(),
        );
        result
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("scope", &self.scope.name())
            .field("chain", &self.chain)
            .finish()
    }
}
