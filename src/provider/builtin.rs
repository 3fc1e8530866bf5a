use std::sync::Arc;

use crate::container::WeakContainer;
use crate::context::{Inject, InjectContext};
use crate::contract::TypeKey;
use crate::error::{DiError, DiResult};
use crate::instance::AnyArc;
use crate::lazy::LazyInstance;

use super::{Provider, ProviderId, ProviderKind};

/// Yields the container it was registered in.
pub(crate) struct ContainerProvider {
    id: ProviderId,
    container: WeakContainer,
}

impl ContainerProvider {
    pub(crate) fn new(container: WeakContainer) -> Self {
        ContainerProvider {
            id: ProviderId::next(),
            container,
        }
    }
}

impl Provider for ContainerProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Container
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(TypeKey::of::<crate::Container>())
    }

    fn get_all_instances(&self, _ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let container: AnyArc = Arc::new(self.container.upgrade()?);
        Ok(vec![container])
    }
}

/// Produces [`LazyInstance`]s for any `Lazy<T>` request made in its container.
///
/// In validation mode every handle produced is queued so the validation pass
/// can resolve it once the eager graph has been checked.
pub(crate) struct LazyProvider {
    id: ProviderId,
    container: WeakContainer,
}

impl LazyProvider {
    pub(crate) fn new(container: WeakContainer) -> Self {
        LazyProvider {
            id: ProviderId::next(),
            container,
        }
    }
}

impl Provider for LazyProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Lazy
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(TypeKey::of::<LazyInstance>())
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let element = ctx
            .contract()
            .lazy_element()
            .cloned()
            .ok_or_else(|| DiError::InvalidBinding(format!("{} is not a lazy contract", ctx.contract())))?;
        let container = self.container.upgrade()?;
        let request = ctx.request().clone().with_contract(element);
        let lazy = Arc::new(LazyInstance::new(container.downgrade(), request));
        if container.is_validating() {
            container.defer_validation(lazy.clone());
        }
        let lazy: AnyArc = lazy;
        Ok(vec![lazy])
    }
}

/// Forwards to another binding of the same or a different contract.
pub(crate) struct ResolveProvider {
    id: ProviderId,
    container: WeakContainer,
    request: Inject,
}

impl ResolveProvider {
    pub(crate) fn new(container: WeakContainer, request: Inject) -> Self {
        ResolveProvider {
            id: ProviderId::next(),
            container,
            request,
        }
    }
}

impl Provider for ResolveProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Resolve
    }

    fn instance_type(&self, ctx: &InjectContext<'_>) -> Option<TypeKey> {
        let container = self.container.upgrade().ok()?;
        let forwarded = ctx.spawn(&container, self.request.clone());
        container.resolve_type_in(&forwarded).ok().flatten()
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let container = self.container.upgrade()?;
        let forwarded = ctx.spawn(&container, self.request.clone().with_optional(ctx.is_optional()));
        Ok(container.resolve_in(&forwarded)?.into_iter().collect())
    }
}
