use std::sync::Arc;

use super::{Instance, ServiceSlot};
use crate::error::{DiError, DiResult};
use crate::key::EdgeService;
use crate::traits::Invoker;
use crate::{InvocationContext, Scope};

/// Converts the target instance into the aliased representation, `None` when
/// the target does not hold the expected type.
pub(crate) type AliasConvert = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Redirects to another service under a different declared type.
#[derive(Clone)]
pub(crate) struct AliasSlot {
    target: String,
    type_name: &'static str,
    required: &'static str,
    convert: AliasConvert,
}

impl AliasSlot {
    pub(crate) fn new(
        target: impl Into<String>,
        type_name: &'static str,
        required: &'static str,
        convert: AliasConvert,
    ) -> Self {
        Self {
            target: target.into(),
            type_name,
            required,
            convert,
        }
    }

    pub(crate) fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolves the target through the regular invocation path so cycle
    /// detection and graph edges apply to aliases too.
    pub(crate) fn get_instance(&self, ctx: &InvocationContext) -> DiResult<Instance> {
        let target = ctx.invoke_any(&self.target)?;
        (self.convert)(&target).ok_or_else(|| DiError::TypeMismatch {
            service: self.target.clone(),
            expected: self.required,
            found: target.type_name(),
        })
    }

    /// Slot currently registered under the target name, seen from `owner`.
    pub(crate) fn target_slot(
        &self,
        name: &str,
        owner: &Scope,
        visited: &mut Vec<EdgeService>,
    ) -> DiResult<Option<(Arc<ServiceSlot>, Scope)>> {
        let here = EdgeService::new(owner.id(), owner.name(), name);
        if visited.contains(&here) {
            let mut chain: Vec<String> = visited.iter().map(|e| e.service.clone()).collect();
            chain.push(name.to_string());
            return Err(DiError::Circular(chain));
        }
        visited.push(here);
        Ok(owner.resolve(&self.target))
    }
}
