use std::sync::Arc;

use crate::container::WeakContainer;
use crate::context::InjectContext;
use crate::contract::{Identifier, TypeKey};
use crate::descriptor::{ExtraArgs, TypeDescriptor};
use crate::error::DiResult;
use crate::instance::AnyArc;

use super::{Provider, ProviderId, ProviderKind};

/// Builds a fresh object from its descriptor for every request.
pub(crate) struct TransientProvider {
    id: ProviderId,
    container: WeakContainer,
    descriptor: Arc<TypeDescriptor>,
    arguments: ExtraArgs,
    concrete_identifier: Option<Identifier>,
}

impl TransientProvider {
    pub(crate) fn new(
        container: WeakContainer,
        descriptor: Arc<TypeDescriptor>,
        arguments: ExtraArgs,
        concrete_identifier: Option<Identifier>,
    ) -> Self {
        TransientProvider {
            id: ProviderId::next(),
            container,
            descriptor,
            arguments,
            concrete_identifier,
        }
    }
}

impl Provider for TransientProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Transient
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(self.descriptor.type_key())
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let container = self.container.upgrade()?;
        let instance = container.instantiate_for(
            &self.descriptor,
            self.arguments.clone(),
            Some(ctx),
            self.concrete_identifier.clone(),
        )?;
        Ok(vec![instance])
    }

    fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        Some(&self.descriptor)
    }
}
