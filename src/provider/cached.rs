use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::context::InjectContext;
use crate::contract::TypeKey;
use crate::descriptor::TypeDescriptor;
use crate::error::DiResult;
use crate::instance::AnyArc;

use super::{Provider, ProviderId, ProviderKind};

/// Runs its inner provider once and replays the result.
///
/// The inner provider runs without any lock held, so a re-entrant request
/// during the first build reaches the in-flight guard instead of
/// deadlocking. If two threads race on the first build, the first result
/// stored wins and the other is discarded.
pub(crate) struct CachedProvider {
    id: ProviderId,
    inner: Arc<dyn Provider>,
    cache: OnceCell<Vec<AnyArc>>,
}

impl CachedProvider {
    pub(crate) fn new(inner: Arc<dyn Provider>) -> Self {
        CachedProvider {
            id: ProviderId::next(),
            inner,
            cache: OnceCell::new(),
        }
    }
}

impl Provider for CachedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cached
    }

    fn instance_type(&self, ctx: &InjectContext<'_>) -> Option<TypeKey> {
        self.inner.instance_type(ctx)
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.clone());
        }
        let created = self.inner.get_all_instances(ctx)?;
        Ok(self.cache.get_or_init(move || created).clone())
    }

    fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        self.inner.descriptor()
    }
}
