//! Panic containment for user code.
//!
//! Providers and lifecycle hooks are user code; a panic in one of them must
//! surface as an error on the caller, never unwind through the container.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, DiError, DiResult};

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "provider panicked".to_string()
    }
}

/// Runs a provider. Errors that are already `DiError`s (a nested invoke that
/// failed) pass through unchanged; anything else becomes `ProviderFailure`.
pub(crate) fn catch_provider<T, F>(service: &str, f: F) -> DiResult<T>
where
    F: FnOnce() -> Result<T, BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(match err.downcast::<DiError>() {
            Ok(di) => *di,
            Err(other) => DiError::provider_error(service, other),
        }),
        Err(payload) => Err(DiError::provider_panic(service, panic_message(payload.as_ref()))),
    }
}

/// Runs a lifecycle hook, turning a panic into a boxed error.
pub(crate) fn catch_hook<F>(f: F) -> Result<(), BoxError>
where
    F: FnOnce() -> Result<(), BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(format!("hook panicked: {}", panic_message(payload.as_ref())).into()),
    }
}
