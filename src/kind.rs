//! Service construction strategies.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a registered service produces its instance
///
/// The four strategies are a closed set; every registration maps to exactly
/// one of them.
///
/// # Strategy Characteristics
///
/// - **Eager**: value supplied at registration, returned as-is
/// - **Lazy**: built on first invocation, cached until shutdown
/// - **Transient**: built on every invocation, never cached
/// - **Alias**: redirects to another service under a different declared type
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{Injector, Invoker, ServiceKind};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// let injector = Injector::new();
/// injector.provide_value("db", Database { url: "postgres://localhost".into() }).unwrap();
/// injector.provide_lazy("repo", |ctx| {
///     Ok(Repository { db: ctx.invoke::<Database>("db")? })
/// }).unwrap();
/// injector.provide_transient("request-id", |_| Ok(7u64)).unwrap();
///
/// assert_eq!(injector.service_kind("db"), Some(ServiceKind::Eager));
/// assert_eq!(injector.service_kind("repo"), Some(ServiceKind::Lazy));
/// assert_eq!(injector.service_kind("request-id"), Some(ServiceKind::Transient));
///
/// let a = injector.invoke::<Repository>("repo").unwrap();
/// let b = injector.invoke::<Repository>("repo").unwrap();
/// assert!(Arc::ptr_eq(&a, &b)); // Lazy: same instance
/// assert_eq!(a.db.url, "postgres://localhost");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ServiceKind {
    /// Value fixed at registration time
    ///
    /// Health checks and shutdown hooks run against the registered value.
    /// After shutdown the service is removed from its scope.
    Eager,
    /// Built once on first invocation, cached afterwards
    ///
    /// Concurrent first invocations run the provider exactly once. Health
    /// checks never trigger construction. After shutdown the service is
    /// removed from its scope.
    Lazy,
    /// Built fresh on every invocation
    ///
    /// No instance is retained, so health checks and shutdown are no-ops.
    Transient,
    /// Redirects to another service
    ///
    /// Resolution goes through the regular invocation path; lifecycle hooks
    /// delegate to the target while it exists.
    Alias,
}

impl ServiceKind {
    /// Lowercase name used in logs and descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Eager => "eager",
            ServiceKind::Lazy => "lazy",
            ServiceKind::Transient => "transient",
            ServiceKind::Alias => "alias",
        }
    }

    /// True for the variants that keep an instance which shutdown tears down.
    pub fn retains_instance(&self) -> bool {
        matches!(self, ServiceKind::Eager | ServiceKind::Lazy)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
