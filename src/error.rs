//! Error types for the dependency injection container.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Boxed error returned by providers and lifecycle hooks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error source. `Arc` keeps [`DiError`] cheaply clonable.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Represents the conditions that can occur during service registration,
/// resolution, health checking and shutdown.
///
/// Construction-time errors (`NotFound`, `Circular`, `TypeMismatch`,
/// `ProviderFailure`) abort the in-flight invocation chain and are returned
/// unchanged to the outermost caller. Lifecycle errors are collected into
/// [`HealthReport`](crate::HealthReport) and
/// [`ShutdownReport`](crate::ShutdownReport) instead of aborting a walk.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{DiError, Injector, Invoker};
///
/// let injector = Injector::new();
/// injector.provide_value("answer", 42u32).unwrap();
///
/// match injector.invoke::<u32>("question") {
///     Err(DiError::NotFound { service, available, .. }) => {
///         assert_eq!(service, "question");
///         assert_eq!(available, vec!["answer".to_string()]);
///     }
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
/// assert_eq!(
///     circular.to_string(),
///     "DI: circular dependency detected: `a` -> `b` -> `a`"
/// );
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// A service with this name already exists in the scope
    AlreadyDeclared { scope: String, service: String },
    /// A child scope with this name already exists under the parent
    ScopeAlreadyDeclared { parent: String, scope: String },
    /// Service not visible from the calling scope
    NotFound {
        service: String,
        /// Names visible from the calling scope, sorted
        available: Vec<String>,
        /// Invocation chain ending with the missing name
        chain: Vec<String>,
    },
    /// Circular dependency detected (includes the full chain)
    Circular(Vec<String>),
    /// Resolved value does not have the requested type
    TypeMismatch {
        service: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Provider returned an error or panicked
    ProviderFailure {
        service: String,
        message: String,
        source: Option<SharedError>,
    },
    /// Shutdown hook failed
    ShutdownFailure { service: String, source: SharedError },
    /// Health check hook failed
    HealthCheckFailure { service: String, source: SharedError },
    /// Health check did not finish before its deadline
    HealthCheckTimeout { service: String, timeout: Option<Duration> },
    /// The cancellation token fired before the hook could run
    Cancelled { service: String },
}

impl DiError {
    pub(crate) fn provider_error(service: &str, err: BoxError) -> Self {
        DiError::ProviderFailure {
            service: service.to_string(),
            message: err.to_string(),
            source: Some(Arc::from(err)),
        }
    }

    pub(crate) fn provider_panic(service: &str, message: String) -> Self {
        DiError::ProviderFailure {
            service: service.to_string(),
            message,
            source: None,
        }
    }

    /// Name of the service this error is about, when there is one.
    pub fn service(&self) -> Option<&str> {
        match self {
            DiError::AlreadyDeclared { service, .. }
            | DiError::NotFound { service, .. }
            | DiError::TypeMismatch { service, .. }
            | DiError::ProviderFailure { service, .. }
            | DiError::ShutdownFailure { service, .. }
            | DiError::HealthCheckFailure { service, .. }
            | DiError::HealthCheckTimeout { service, .. }
            | DiError::Cancelled { service } => Some(service),
            DiError::Circular(chain) => chain.last().map(String::as_str),
            DiError::ScopeAlreadyDeclared { .. } => None,
        }
    }

    /// True for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound { .. })
    }

    /// True for `Circular`.
    pub fn is_circular(&self) -> bool {
        matches!(self, DiError::Circular(_))
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{}`", n))
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::AlreadyDeclared { scope, service } => write!(
                f,
                "DI: service `{}` has already been declared in scope `{}`",
                service, scope
            ),
            DiError::ScopeAlreadyDeclared { parent, scope } => write!(
                f,
                "DI: scope `{}` has already been declared under `{}`",
                scope, parent
            ),
            DiError::NotFound { service, available, chain } => {
                write!(f, "DI: could not find service `{}`", service)?;
                if available.is_empty() {
                    write!(f, ", no service available")?;
                } else {
                    let names: Vec<String> =
                        available.iter().map(|n| format!("`{}`", n)).collect();
                    write!(f, ", available services: {}", names.join(", "))?;
                }
                if chain.len() > 1 {
                    write!(f, ", path: {}", quoted(chain))?;
                }
                Ok(())
            }
            DiError::Circular(chain) => {
                write!(f, "DI: circular dependency detected: {}", quoted(chain))
            }
            DiError::TypeMismatch { service, expected, found } => write!(
                f,
                "DI: service `{}` found, but type mismatch: expected `{}`, registered `{}`",
                service, expected, found
            ),
            DiError::ProviderFailure { service, message, .. } => {
                write!(f, "DI: provider of `{}` failed: {}", service, message)
            }
            DiError::ShutdownFailure { service, source } => {
                write!(f, "DI: shutdown of `{}` failed: {}", service, source)
            }
            DiError::HealthCheckFailure { service, source } => {
                write!(f, "DI: health check of `{}` failed: {}", service, source)
            }
            DiError::HealthCheckTimeout { service, timeout } => match timeout {
                Some(t) => write!(f, "DI: health check of `{}` timed out after {:?}", service, t),
                None => write!(f, "DI: health check of `{}` timed out", service),
            },
            DiError::Cancelled { service } => {
                write!(f, "DI: operation on `{}` was cancelled", service)
            }
        }
    }
}

impl StdError for DiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DiError::ProviderFailure { source: Some(s), .. } => Some(s.as_ref()),
            DiError::ShutdownFailure { source, .. }
            | DiError::HealthCheckFailure { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_available_and_path() {
        let err = DiError::NotFound {
            service: "c".into(),
            available: vec!["a".into(), "b".into()],
            chain: vec!["a".into(), "c".into()],
        };
        assert_eq!(
            err.to_string(),
            "DI: could not find service `c`, available services: `a`, `b`, path: `a` -> `c`"
        );
        assert!(err.is_not_found());
        assert_eq!(err.service(), Some("c"));
    }

    #[test]
    fn not_found_without_services() {
        let err = DiError::NotFound {
            service: "x".into(),
            available: vec![],
            chain: vec!["x".into()],
        };
        assert_eq!(err.to_string(), "DI: could not find service `x`, no service available");
    }

    #[test]
    fn provider_error_keeps_source() {
        let err = DiError::provider_error("db", "connection refused".into());
        assert_eq!(err.to_string(), "DI: provider of `db` failed: connection refused");
        assert!(err.source().is_some());

        let panicked = DiError::provider_panic("db", "boom".into());
        assert!(panicked.source().is_none());
    }

    #[test]
    fn circular_reports_last_name() {
        let err = DiError::Circular(vec!["a".into(), "a".into()]);
        assert!(err.is_circular());
        assert_eq!(err.service(), Some("a"));
        assert_eq!(err.to_string(), "DI: circular dependency detected: `a` -> `a`");
    }
}
