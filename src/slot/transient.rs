use super::{Instance, Provider};
use crate::error::DiResult;
use crate::internal::catch_provider;
use crate::InvocationContext;

/// Built on every invocation; nothing is retained, so lifecycle hooks never
/// run for transient services.
#[derive(Clone)]
pub(crate) struct TransientSlot {
    type_name: &'static str,
    provider: Provider,
}

impl TransientSlot {
    pub(crate) fn new(type_name: &'static str, provider: Provider) -> Self {
        Self { type_name, provider }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn get_instance(&self, name: &str, ctx: &InvocationContext) -> DiResult<Instance> {
        catch_provider(name, || (self.provider)(ctx))
    }
}
