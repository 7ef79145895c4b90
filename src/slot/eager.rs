use std::sync::atomic::{AtomicBool, Ordering};

use super::{hook_error_to_health, hook_error_to_shutdown, Instance};
use crate::error::DiResult;
use crate::CancellationToken;

/// Value supplied at registration time.
pub(crate) struct EagerSlot {
    instance: Instance,
    // An aliased eager value can be reached twice during one shutdown walk.
    shut_down: AtomicBool,
}

impl EagerSlot {
    pub(crate) fn new(instance: Instance) -> Self {
        Self {
            instance,
            shut_down: AtomicBool::new(false),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.instance.type_name()
    }

    pub(crate) fn get_instance(&self) -> Instance {
        self.instance.clone()
    }

    pub(crate) fn health_check(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        self.instance
            .run_health_check(token)
            .map_err(|e| hook_error_to_health(name, e))
    }

    pub(crate) fn shutdown(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.instance
            .run_shutdown(token)
            .map_err(|e| hook_error_to_shutdown(name, e))
    }

    pub(crate) fn clone_slot(&self) -> Self {
        Self::new(self.instance.clone())
    }
}
