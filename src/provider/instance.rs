use crate::context::InjectContext;
use crate::contract::TypeKey;
use crate::error::DiResult;
use crate::instance::AnyArc;

use super::{Provider, ProviderId, ProviderKind};

pub(crate) struct InstanceProvider {
    id: ProviderId,
    instance: AnyArc,
    type_key: TypeKey,
}

impl InstanceProvider {
    pub(crate) fn new(instance: AnyArc, type_key: TypeKey) -> Self {
        InstanceProvider {
            id: ProviderId::next(),
            instance,
            type_key,
        }
    }
}

impl Provider for InstanceProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Instance
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(self.type_key)
    }

    fn get_all_instances(&self, _ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        Ok(vec![self.instance.clone()])
    }
}
