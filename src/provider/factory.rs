use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::InjectContext;
use crate::contract::TypeKey;
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::{erase, AnyArc};
use crate::pool::InstanceFactory;

use super::{Provider, ProviderId, ProviderKind};

/// Closure backing a method binding, already erased. Single-value methods yield one item.
pub(crate) type MethodFn = Arc<dyn Fn(&InjectContext<'_>) -> Result<Vec<AnyArc>, BoxError> + Send + Sync>;

/// Delegates to an [`InstanceFactory`]; failures surface as `FactoryCreationFailed`.
pub(crate) struct FactoryProvider<T> {
    id: ProviderId,
    factory: Arc<dyn InstanceFactory<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> FactoryProvider<T> {
    pub(crate) fn new(factory: Arc<dyn InstanceFactory<T>>) -> Self {
        FactoryProvider {
            id: ProviderId::next(),
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Provider for FactoryProvider<T> {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Factory
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        Some(TypeKey::of::<T>())
    }

    fn get_all_instances(&self, _ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let product = self
            .factory
            .create()
            .map_err(|e| DiError::factory(std::any::type_name::<T>(), e))?;
        Ok(vec![erase(product)])
    }
}

/// Calls a closure with the request context.
///
/// Errors raised by nested resolution keep their variant; anything else is
/// reported as `FactoryCreationFailed`.
pub(crate) struct MethodProvider {
    id: ProviderId,
    method: MethodFn,
    type_key: Option<TypeKey>,
}

impl MethodProvider {
    pub(crate) fn new(method: MethodFn, type_key: Option<TypeKey>) -> Self {
        MethodProvider {
            id: ProviderId::next(),
            method,
            type_key,
        }
    }
}

impl Provider for MethodProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Method
    }

    fn instance_type(&self, _ctx: &InjectContext<'_>) -> Option<TypeKey> {
        self.type_key
    }

    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let item = self.type_key.map_or("method", |key| key.name());
        (self.method)(ctx).map_err(|e| match e.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::factory(item, other),
        })
    }
}
