//! # ferrous-injector
//!
//! Runtime dependency injection organised as a tree of scopes.
//!
//! ## Features
//!
//! - **Named services**: every service is registered under a string key in a scope
//! - **Four strategies**: eager values, lazy singletons, transients and aliases
//! - **Scope tree**: children see their ancestors' services, never the reverse
//! - **Circular dependency detection**: reported with the full invocation path
//! - **Dependency graph**: edges recorded as services are actually built
//! - **Health checks**: concurrent, bounded, with per-check and global deadlines
//! - **Ordered shutdown**: children first, then reverse invocation order, errors aggregated
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_injector::{Injector, Invoker};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let injector = Injector::new();
//! injector
//!     .provide_value("db", Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     })
//!     .unwrap();
//! injector
//!     .provide_transient("users", |ctx| {
//!         Ok(UserService { db: ctx.invoke::<Database>("db")? })
//!     })
//!     .unwrap();
//!
//! let users = injector.invoke::<UserService>("users").unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use ferrous_injector::{Injector, Invoker};
//!
//! let injector = Injector::new();
//! injector.provide_value("config", "prod".to_string()).unwrap();
//!
//! let request = injector.create_child("request-42").unwrap();
//! request.provide_lazy("greeting", |ctx| {
//!     Ok(format!("hello from {}", ctx.invoke::<String>("config")?))
//! }).unwrap();
//!
//! assert_eq!(*request.invoke::<String>("greeting").unwrap(), "hello from prod");
//! assert!(injector.invoke::<String>("greeting").is_err());
//!
//! // Tear the request scope down and detach it from the root.
//! assert!(request.delete().is_ok());
//! assert!(injector.children().is_empty());
//! ```
//!
//! ## Trait Objects
//!
//! Aliases expose an existing service under another name and type:
//!
//! ```rust
//! use ferrous_injector::{Injector, Invoker};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn prefix(&self) -> &'static str;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn prefix(&self) -> &'static str {
//!         "[LOG]"
//!     }
//! }
//!
//! let injector = Injector::new();
//! injector.provide_lazy("console", |_| Ok(ConsoleLogger)).unwrap();
//! injector
//!     .provide_alias("logger", "console", |c: Arc<ConsoleLogger>| c as Arc<dyn Logger>)
//!     .unwrap();
//!
//! let logger = injector.invoke_as::<dyn Logger>("logger").unwrap();
//! assert_eq!(logger.prefix(), "[LOG]");
//! ```
//!
//! ## Lifecycle
//!
//! Services opt into health checks and shutdown by implementing
//! [`HealthCheck`] and [`Shutdown`] and asking for them at registration:
//!
//! ```rust
//! use ferrous_injector::{BoxError, CancellationToken, Injector, Invoker, Shutdown};
//!
//! struct Pool;
//! impl Shutdown for Pool {
//!     fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let injector = Injector::new();
//! injector.lazy("pool", |_| Ok(Pool)).with_shutdown().provide().unwrap();
//! injector.invoke::<Pool>("pool").unwrap();
//!
//! assert!(injector.health_check().is_healthy());
//! assert!(injector.shutdown().into_result().is_ok());
//! assert!(injector.invoke::<Pool>("pool").is_err());
//! ```
//!
//! With the `async` feature, `Injector::shutdown_on_signals` waits for
//! SIGINT or SIGTERM and then shuts the tree down.

pub mod cancellation;
pub mod context;
pub mod describe;
pub mod error;
pub mod graph;
pub mod injector;
pub mod key;
pub mod kind;
pub mod observer;
pub mod options;
pub mod registration;
pub mod runtime;
pub mod scope;
pub mod traits;

mod internal;
mod slot;

pub use cancellation::{CancellationError, CancellationToken};
pub use context::InvocationContext;
pub use describe::{ScopeDescription, ServiceDescription};
pub use error::{BoxError, DiError, DiResult, SharedError};
pub use graph::DependencyGraph;
#[cfg(feature = "graph-export")]
pub use graph::{GraphEdge, GraphSnapshot};
pub use injector::Injector;
pub use key::{EdgeService, ScopeId};
pub use kind::ServiceKind;
pub use observer::{LifecycleObserver, TracingObserver};
pub use options::{InjectorOptions, ENV_PREFIX};
pub use registration::ServiceBuilder;
pub use runtime::{HealthReport, ShutdownErrors, ShutdownReport};
#[cfg(feature = "async")]
pub use runtime::ShutdownTrigger;
pub use scope::{Scope, ROOT_SCOPE_NAME};
pub use slot::Instance;
pub use traits::{HealthCheck, Invoker, Shutdown};
