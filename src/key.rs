//! Identity types for scopes and services.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier of a scope.
///
/// Two scopes with the same name (for example the same child name under two
/// different parents, or a scope and its clone) always have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScopeId(Uuid);

impl ScopeId {
    pub(crate) fn new() -> Self {
        ScopeId(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a service inside a specific scope.
///
/// This is the unit of reference of the dependency graph, of service listings
/// and of shutdown error reports. The scope name is carried for diagnostics;
/// equality and hashing use all three fields.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::Injector;
///
/// let injector = Injector::new();
/// injector.provide_value("config", "debug".to_string()).unwrap();
///
/// let provided = injector.list_provided();
/// assert_eq!(provided.len(), 1);
/// assert_eq!(provided[0].scope_id, injector.id());
/// assert_eq!(provided[0].scope_name, "[root]");
/// assert_eq!(provided[0].service, "config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeService {
    /// Id of the owning scope
    pub scope_id: ScopeId,
    /// Name of the owning scope
    pub scope_name: String,
    /// Service name
    pub service: String,
}

impl EdgeService {
    /// Creates a new edge identity.
    pub fn new(scope_id: ScopeId, scope_name: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            scope_id,
            scope_name: scope_name.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for EdgeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope_name, self.service)
    }
}
