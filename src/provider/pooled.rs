use std::sync::Arc;

use crate::context::InjectContext;
use crate::contract::TypeKey;
use crate::error::DiResult;
use crate::instance::{erase, AnyArc, ValidationMarker};
use crate::pool::ErasedPool;

use super::{Provider, ProviderId, ProviderKind};

/// Acquires an item from a pool for every request.
///
/// Items are not returned automatically; the consumer releases them through
/// the pool, which is bound alongside under `MemoryPool<T>`.
pub(crate) struct PooledProvider {
    id: ProviderId,
    pool: Arc<dyn ErasedPool>,
}

impl PooledProvider {
    pub(crate) fn new(pool: Arc<dyn ErasedPool>) -> Self {
        PooledProvider {
            id: ProviderId::next(),
            pool,
        }
    }
}

impl Provider for PooledProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Pooled
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(self.pool.item_type())
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        if ctx.container().is_validating() {
            return Ok(vec![erase(ValidationMarker::new(self.pool.item_type(), false))]);
        }
        Ok(vec![self.pool.acquire_any()?])
    }

    fn validate(&self, _ctx: &InjectContext<'_>) -> Option<DiResult<()>> {
        Some(self.pool.validate_factory())
    }
}
