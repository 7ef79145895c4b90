use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};

use super::{hook_error_to_health, hook_error_to_shutdown, Instance, Provider};
use crate::error::{DiError, DiResult};
use crate::internal::catch_provider;
use crate::{CancellationToken, InvocationContext};

/// Singleton built on first invocation.
///
/// `state` is `None` until the provider succeeds. Construction happens under
/// the write lock so concurrent first invocations run the provider once.
/// `builder` is the thread running the provider, if any.
pub(crate) struct LazySlot {
    type_name: &'static str,
    provider: Provider,
    state: RwLock<Option<Instance>>,
    builder: Mutex<Option<ThreadId>>,
}

impl LazySlot {
    pub(crate) fn new(type_name: &'static str, provider: Provider) -> Self {
        Self {
            type_name,
            provider,
            state: RwLock::new(None),
            builder: Mutex::new(None),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn get_instance(&self, name: &str, ctx: &InvocationContext) -> DiResult<Instance> {
        match self.state.try_read() {
            Some(state) => {
                if let Some(instance) = state.as_ref() {
                    return Ok(instance.clone());
                }
            }
            // The provider reached its own slot without going through the
            // chain, e.g. through a captured scope handle.
            None if *self.builder.lock() == Some(thread::current().id()) => {
                let mut chain = ctx.chain().to_vec();
                chain.push(name.to_string());
                tracing::debug!(target: "ferrous_injector", service = name, "re-entrant lazy build");
                return Err(DiError::Circular(chain));
            }
            None => {}
        }

        let mut state = self.state.write();
        // Another thread may have finished while we waited for the lock
        if let Some(instance) = state.as_ref() {
            return Ok(instance.clone());
        }

        *self.builder.lock() = Some(thread::current().id());
        let built = catch_provider(name, || (self.provider)(ctx));
        *self.builder.lock() = None;
        let instance = built?;
        tracing::trace!(target: "ferrous_injector", service = name, "lazy service built");
        *state = Some(instance.clone());
        Ok(instance)
    }

    /// Never builds the service.
    pub(crate) fn health_check(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        let instance = self.state.read().clone();
        match instance {
            Some(instance) => instance
                .run_health_check(token)
                .map_err(|e| hook_error_to_health(name, e)),
            None => Ok(()),
        }
    }

    pub(crate) fn shutdown(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        let instance = self.state.read().clone();
        let Some(instance) = instance else {
            return Ok(());
        };

        let result = instance.run_shutdown(token);
        *self.state.write() = None;
        result.map_err(|e| hook_error_to_shutdown(name, e))
    }

    pub(crate) fn clone_slot(&self) -> Self {
        Self::new(self.type_name, self.provider.clone())
    }
}
