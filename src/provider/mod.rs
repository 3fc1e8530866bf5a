//! Providers: the strategies that turn a matched binding into instances.
//!
//! Every binding finalizes into one [`Provider`]. Providers are shared between
//! all contracts a binding registers, and across containers when a binding is
//! inherited into sub-containers.

mod builtin;
mod cached;
mod factory;
mod instance;
mod pooled;
mod transient;

pub(crate) use builtin::{ContainerProvider, LazyProvider, ResolveProvider};
pub(crate) use cached::CachedProvider;
pub(crate) use factory::{FactoryProvider, MethodFn, MethodProvider};
pub(crate) use instance::InstanceProvider;
pub(crate) use pooled::PooledProvider;
pub(crate) use transient::TransientProvider;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::InjectContext;
use crate::contract::TypeKey;
use crate::descriptor::TypeDescriptor;
use crate::error::DiResult;
use crate::instance::{is_validation_marker, AnyArc};

/// Process-unique identity of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl ProviderId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ProviderId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Strategy a provider uses to produce instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Builds a new object from a type descriptor on every request.
    Transient,
    /// Builds once and hands the cached result to every request.
    Cached,
    /// Returns a pre-built instance.
    Instance,
    /// Acquires an item from a memory pool.
    Pooled,
    /// Calls an instance factory.
    Factory,
    /// Calls a closure with the request context.
    Method,
    /// Forwards to another binding.
    Resolve,
    /// Produces deferred handles.
    Lazy,
    /// Yields the owning container.
    Container,
}

/// Produces instances for matched requests.
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn kind(&self) -> ProviderKind;

    /// Concrete type this provider yields for `ctx`, if known without building.
    fn instance_type(&self, ctx: &InjectContext<'_>) -> Option<TypeKey>;

    /// Produces the instances for one request; usually exactly one.
    fn get_all_instances(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>>;

    /// Descriptor of the type built, for providers backed by one.
    fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        None
    }

    /// Checks this provider during validation; `None` when there is nothing to check.
    fn validate(&self, ctx: &InjectContext<'_>) -> Option<DiResult<()>> {
        let descriptor = self.descriptor()?.clone();
        if !descriptor.is_validatable() {
            return None;
        }
        Some(self.get_all_instances(ctx).and_then(|instances| {
            instances
                .iter()
                .filter(|instance| !is_validation_marker(instance))
                .try_for_each(|instance| descriptor.validate_instance(instance))
        }))
    }
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
