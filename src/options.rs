//! Injector configuration.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::observer::LifecycleObserver;

/// Default prefix of the environment variables read by
/// [`InjectorOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_INJECTOR";

/// Options of an [`Injector`](crate::Injector), shared by every scope of its
/// tree.
///
/// Durations are written in milliseconds when deserialized (`*_ms` keys) or
/// read from the environment.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, InjectorOptions};
/// use std::time::Duration;
///
/// let options = InjectorOptions::new()
///     .with_health_check_parallelism(4)
///     .with_health_check_timeout(Duration::from_millis(500))
///     .with_health_check_global_timeout(Duration::from_secs(2));
///
/// let injector = Injector::with_options(options);
/// assert_eq!(injector.options().health_check_parallelism, 4);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InjectorOptions {
    /// Maximum number of concurrent health checks; `0` runs every check on
    /// its own thread.
    pub health_check_parallelism: usize,
    /// Deadline of a single health check.
    #[cfg_attr(feature = "serde", serde(rename = "health_check_timeout_ms", with = "duration_ms"))]
    pub health_check_timeout: Option<Duration>,
    /// Deadline of a whole health-check call.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "health_check_global_timeout_ms", with = "duration_ms")
    )]
    pub health_check_global_timeout: Option<Duration>,
    /// Lifecycle observers.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl InjectorOptions {
    /// Default options: unbounded health checks, no timeouts, no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from `FERROUS_INJECTOR_*` environment variables.
    ///
    /// See [`from_env_with_prefix`](Self::from_env_with_prefix).
    pub fn from_env() -> Self {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Reads options from environment variables:
    ///
    /// * `{PREFIX}_HEALTH_CHECK_PARALLELISM`
    /// * `{PREFIX}_HEALTH_CHECK_TIMEOUT_MS`
    /// * `{PREFIX}_HEALTH_CHECK_GLOBAL_TIMEOUT_MS`
    ///
    /// Missing variables keep their defaults; unparsable ones are ignored
    /// with a warning.
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let prefix = prefix.to_uppercase();
        let mut options = Self::default();
        if let Some(n) = env_number(&prefix, "HEALTH_CHECK_PARALLELISM") {
            options.health_check_parallelism = n as usize;
        }
        options.health_check_timeout =
            env_number(&prefix, "HEALTH_CHECK_TIMEOUT_MS").map(Duration::from_millis);
        options.health_check_global_timeout =
            env_number(&prefix, "HEALTH_CHECK_GLOBAL_TIMEOUT_MS").map(Duration::from_millis);
        options
    }

    /// Sets the maximum number of concurrent health checks.
    pub fn with_health_check_parallelism(mut self, parallelism: usize) -> Self {
        self.health_check_parallelism = parallelism;
        self
    }

    /// Sets the per-check deadline.
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = Some(timeout);
        self
    }

    /// Sets the deadline of a whole health-check call.
    pub fn with_health_check_global_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_global_timeout = Some(timeout);
        self
    }

    /// Adds a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

fn env_number(prefix: &str, key: &str) -> Option<u64> {
    let name = format!("{}_{}", prefix, key);
    let raw = env::var(&name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(
                target: "ferrous_injector",
                variable = %name,
                value = %raw,
                "ignoring non-numeric option"
            );
            None
        }
    }
}

impl fmt::Debug for InjectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorOptions")
            .field("health_check_parallelism", &self.health_check_parallelism)
            .field("health_check_timeout", &self.health_check_timeout)
            .field("health_check_global_timeout", &self.health_check_global_timeout)
            .field("observers", &format!("{} observers", self.observers.len()))
            .finish()
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
