//! Staged bindings and their fluent builders.
//!
//! [`Container::bind`](crate::Container::bind) queues a [`BindInfo`] and hands
//! back a builder that edits it in place. The queue is flushed, turning each
//! description into a provider registration, before any lookup, so a binding
//! must be fully described before the container is next queried.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::Container;
use crate::context::{Condition, Inject, InjectContext};
use crate::contract::{Contract, ContractKey, Identifier, TypeKey};
use crate::descriptor::{ExtraArgs, Injectable, TypeDescriptor};
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::{downcast, erase, erase_arc, erase_trait, AnyArc};
use crate::internal::sync::Mutex;
use crate::pool::{ErasedPool, InstanceFactory, MemoryPool};
use crate::provider::{
    CachedProvider, FactoryProvider, InstanceProvider, MethodFn, MethodProvider, PooledProvider, Provider,
    ResolveProvider, TransientProvider,
};
use crate::registry::{CastFn, ProviderInfo};

/// How a binding propagates into sub-containers created after it is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BindingInheritance {
    /// Local to the container it was declared in.
    #[default]
    None,
    /// Also installed into every descendant.
    CopyIntoAll,
    /// Also installed into direct children only.
    CopyDirectOnly,
    /// Installed into every descendant but not locally.
    MoveIntoAll,
    /// Installed into direct children only, not locally.
    MoveDirectOnly,
}

impl BindingInheritance {
    /// Whether the declaring container skips the binding.
    pub fn is_move(self) -> bool {
        matches!(self, BindingInheritance::MoveIntoAll | BindingInheritance::MoveDirectOnly)
    }

    pub fn is_inherited(self) -> bool {
        self != BindingInheritance::None
    }

    /// Whether descendants beyond direct children receive the binding.
    pub fn reaches_all(self) -> bool {
        matches!(self, BindingInheritance::CopyIntoAll | BindingInheritance::MoveIntoAll)
    }
}

/// Instance sharing of a constructed binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BindScope {
    /// Not chosen; behaves like [`BindScope::Transient`].
    #[default]
    Unset,
    Transient,
    /// One instance per container the binding is finalized in.
    Cached,
}

type ProviderBuilder = Arc<dyn Fn() -> Arc<dyn Provider> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ProviderSource {
    Unset,
    Construct(Arc<TypeDescriptor>),
    Instance { instance: AnyArc, type_key: TypeKey },
    Method { method: MethodFn, type_key: Option<TypeKey> },
    Factory(ProviderBuilder),
    Pool(Arc<dyn ErasedPool>),
    Resolve(Inject),
}

/// Complete description of one binding.
#[derive(Clone)]
pub struct BindInfo {
    pub(crate) contracts: Vec<(Contract, Option<CastFn>)>,
    pub(crate) identifier: Option<Identifier>,
    pub(crate) condition: Option<Condition>,
    pub(crate) non_lazy: bool,
    pub(crate) inheritance: BindingInheritance,
    pub(crate) scope: BindScope,
    pub(crate) arguments: ExtraArgs,
    pub(crate) source: ProviderSource,
}

impl BindInfo {
    pub(crate) fn new(contract: Contract) -> Self {
        BindInfo {
            contracts: vec![(contract, None)],
            identifier: None,
            condition: None,
            non_lazy: false,
            inheritance: BindingInheritance::None,
            scope: BindScope::Unset,
            arguments: ExtraArgs::new(),
            source: ProviderSource::Unset,
        }
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> + '_ {
        self.contracts.iter().map(|(contract, _)| contract)
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    pub fn is_non_lazy(&self) -> bool {
        self.non_lazy
    }

    pub fn inheritance(&self) -> BindingInheritance {
        self.inheritance
    }

    pub fn scope(&self) -> BindScope {
        self.scope
    }

    fn describe(&self) -> String {
        self.contracts()
            .map(|contract| ContractKey::new(contract.clone(), self.identifier.clone()).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds this binding's provider for `container` and registers it under every contract.
    pub(crate) fn finalize(&self, container: &Container) -> DiResult<()> {
        let provider = self.build_provider(container)?;
        for (contract, cast) in &self.contracts {
            container.register_provider(
                ContractKey::new(contract.clone(), self.identifier.clone()),
                ProviderInfo {
                    provider: provider.clone(),
                    condition: self.condition.clone(),
                    non_lazy: self.non_lazy,
                    cast: cast.clone(),
                },
            );
        }
        tracing::debug!(
            container = container.id(),
            contracts = %self.describe(),
            kind = ?provider.kind(),
            "binding finalized"
        );
        Ok(())
    }

    fn build_provider(&self, container: &Container) -> DiResult<Arc<dyn Provider>> {
        let provider: Arc<dyn Provider> = match &self.source {
            ProviderSource::Unset => {
                return Err(DiError::InvalidBinding(format!(
                    "binding for {} was never given a provider",
                    self.describe()
                )))
            }
            ProviderSource::Instance { instance, type_key } => {
                return Ok(Arc::new(InstanceProvider::new(instance.clone(), *type_key)))
            }
            ProviderSource::Pool(pool) => return Ok(Arc::new(PooledProvider::new(pool.clone()))),
            ProviderSource::Construct(descriptor) => Arc::new(TransientProvider::new(
                container.downgrade(),
                descriptor.clone(),
                self.arguments.clone(),
                self.identifier.clone(),
            )),
            ProviderSource::Method { method, type_key } => Arc::new(MethodProvider::new(method.clone(), *type_key)),
            ProviderSource::Factory(build) => build(),
            ProviderSource::Resolve(request) => Arc::new(ResolveProvider::new(container.downgrade(), request.clone())),
        };
        let provider: Arc<dyn Provider> = match self.scope {
            BindScope::Cached => Arc::new(CachedProvider::new(provider)),
            BindScope::Unset | BindScope::Transient => provider,
        };
        Ok(provider)
    }
}

impl std::fmt::Debug for BindInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindInfo")
            .field("contracts", &self.describe())
            .field("conditional", &self.condition.is_some())
            .field("non_lazy", &self.non_lazy)
            .field("inheritance", &self.inheritance)
            .field("scope", &self.scope)
            .finish()
    }
}

pub(crate) type BindHandle = Arc<Mutex<BindInfo>>;

fn trait_cast<C, T, F>(cast: F) -> CastFn
where
    C: Send + Sync + 'static,
    T: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
{
    Arc::new(move |value: AnyArc| -> DiResult<AnyArc> { Ok(erase_trait(cast(downcast::<C>(value)?))) })
}

fn method_fn<F>(method: F) -> MethodFn
where
    F: Fn(&InjectContext<'_>) -> Result<AnyArc, BoxError> + Send + Sync + 'static,
{
    Arc::new(move |ctx| method(ctx).map(|value| vec![value]))
}

fn multiple_method_fn<F>(method: F) -> MethodFn
where
    F: Fn(&InjectContext<'_>) -> Result<Vec<AnyArc>, BoxError> + Send + Sync + 'static,
{
    Arc::new(method)
}

macro_rules! binder_common {
    () => {
        /// Distinguishes this binding from others of the same contract.
        pub fn with_id(self, id: impl Into<Identifier>) -> Self {
            let id = id.into();
            self.update(move |info| info.identifier = Some(id))
        }

        /// Only matches requests for which `condition` holds.
        pub fn when<F>(self, condition: F) -> Self
        where
            F: Fn(&InjectContext<'_>) -> bool + Send + Sync + 'static,
        {
            self.update(move |info| info.condition = Some(Arc::new(condition)))
        }

        /// Only matches requests issued while constructing `U`.
        pub fn when_injected_into<U: ?Sized + 'static>(self) -> Self {
            let target = TypeKey::of::<U>();
            self.when(move |ctx| ctx.object_type() == Some(target))
        }

        /// Resolved eagerly by [`Container::resolve_roots`](crate::Container::resolve_roots).
        pub fn non_lazy(self) -> Self {
            self.update(|info| info.non_lazy = true)
        }

        pub fn lazy(self) -> Self {
            self.update(|info| info.non_lazy = false)
        }

        /// One shared instance per container this binding lives in.
        pub fn as_cached(self) -> Self {
            self.update(|info| info.scope = BindScope::Cached)
        }

        pub fn as_transient(self) -> Self {
            self.update(|info| info.scope = BindScope::Transient)
        }

        pub fn copy_into_all_sub_containers(self) -> Self {
            self.inherit(BindingInheritance::CopyIntoAll)
        }

        pub fn copy_into_direct_sub_containers(self) -> Self {
            self.inherit(BindingInheritance::CopyDirectOnly)
        }

        pub fn move_into_all_sub_containers(self) -> Self {
            self.inherit(BindingInheritance::MoveIntoAll)
        }

        pub fn move_into_direct_sub_containers(self) -> Self {
            self.inherit(BindingInheritance::MoveDirectOnly)
        }

        /// Snapshot of the binding as currently described.
        pub fn info(&self) -> BindInfo {
            self.info.lock().clone()
        }

        fn inherit(self, inheritance: BindingInheritance) -> Self {
            self.update(move |info| info.inheritance = inheritance)
        }

        fn update(self, f: impl FnOnce(&mut BindInfo)) -> Self {
            f(&mut self.info.lock());
            self
        }
    };
}

/// Builder for a binding of a concrete type `T`.
pub struct Binder<T> {
    info: BindHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Binder<T> {
    pub(crate) fn new(info: BindHandle) -> Self {
        Binder {
            info,
            _marker: PhantomData,
        }
    }

    binder_common!();

    /// Builds `T` from its own descriptor.
    pub fn to_self(self) -> Self
    where
        T: Injectable,
    {
        self.to_descriptor(T::descriptor())
    }

    /// Builds `T` from an explicit descriptor, which must describe `T`.
    pub fn to_descriptor(self, descriptor: TypeDescriptor) -> Self {
        let descriptor = Arc::new(descriptor);
        self.update(move |info| info.source = ProviderSource::Construct(descriptor))
    }

    /// Explicit arguments consumed by construction before resolution is tried.
    pub fn with_arguments(self, arguments: ExtraArgs) -> Self {
        self.update(move |info| info.arguments = arguments)
    }

    pub fn from_instance(self, value: T) -> Self {
        self.from_arc(Arc::new(value))
    }

    pub fn from_arc(self, value: Arc<T>) -> Self {
        self.update(move |info| {
            info.source = ProviderSource::Instance {
                instance: erase_arc(value),
                type_key: TypeKey::of::<T>(),
            }
        })
    }

    /// Calls `method` with the request context on each request.
    pub fn from_method<F>(self, method: F) -> Self
    where
        F: Fn(&InjectContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let method = method_fn(move |ctx| method(ctx).map(erase));
        self.update(move |info| {
            info.source = ProviderSource::Method {
                method,
                type_key: Some(TypeKey::of::<T>()),
            }
        })
    }

    /// Calls `method` on each request and yields every value it returns.
    ///
    /// A single-value request needs exactly one value; `resolve_all` takes them all.
    pub fn from_method_multiple<F>(self, method: F) -> Self
    where
        F: Fn(&InjectContext<'_>) -> Result<Vec<T>, BoxError> + Send + Sync + 'static,
    {
        let method = multiple_method_fn(move |ctx| Ok(method(ctx)?.into_iter().map(erase).collect()));
        self.update(move |info| {
            info.source = ProviderSource::Method {
                method,
                type_key: Some(TypeKey::of::<T>()),
            }
        })
    }

    pub fn from_factory(self, factory: impl InstanceFactory<T> + 'static) -> Self {
        let factory: Arc<dyn InstanceFactory<T>> = Arc::new(factory);
        let build: ProviderBuilder = Arc::new(move || -> Arc<dyn Provider> {
            Arc::new(FactoryProvider::new(factory.clone()))
        });
        self.update(move |info| info.source = ProviderSource::Factory(build))
    }

    /// Acquires from `pool` on each request.
    pub fn from_pool(self, pool: Arc<MemoryPool<T>>) -> Self {
        let pool: Arc<dyn ErasedPool> = pool;
        self.update(move |info| info.source = ProviderSource::Pool(pool))
    }

    /// Forwards to the binding of `T` under `id`.
    pub fn from_resolve_id(self, id: impl Into<Identifier>) -> Self {
        self.from_resolve(Inject::of::<T>().with_id(id))
    }

    /// Forwards to whatever `request` resolves to.
    pub fn from_resolve(self, request: Inject) -> Self {
        self.update(move |info| info.source = ProviderSource::Resolve(request))
    }

    /// Also registers this binding's provider under trait object `U`.
    pub fn also_as_trait<U, F>(self, cast: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        let cast = trait_cast::<T, U, F>(cast);
        self.update(move |info| info.contracts.push((Contract::of::<U>(), Some(cast))))
    }
}

/// Builder for a binding of a trait object `T`.
pub struct TraitBinder<T: ?Sized> {
    info: BindHandle,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> TraitBinder<T> {
    pub(crate) fn new(info: BindHandle) -> Self {
        TraitBinder {
            info,
            _marker: PhantomData,
        }
    }

    binder_common!();

    /// Builds concrete `C` from its descriptor and exposes it as `T`.
    pub fn to<C, F>(self, cast: F) -> Self
    where
        C: Injectable,
        F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        self.to_descriptor::<C, F>(C::descriptor(), cast)
    }

    pub fn to_descriptor<C, F>(self, descriptor: TypeDescriptor, cast: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let descriptor = Arc::new(descriptor);
        let cast = trait_cast::<C, T, F>(cast);
        self.update(move |info| {
            info.source = ProviderSource::Construct(descriptor);
            info.contracts[0].1 = Some(cast);
        })
    }

    pub fn with_arguments(self, arguments: ExtraArgs) -> Self {
        self.update(move |info| info.arguments = arguments)
    }

    pub fn from_instance(self, value: Arc<T>) -> Self {
        self.update(move |info| {
            info.source = ProviderSource::Instance {
                instance: erase_trait(value),
                type_key: TypeKey::of::<T>(),
            }
        })
    }

    pub fn from_method<F>(self, method: F) -> Self
    where
        F: Fn(&InjectContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let method = method_fn(move |ctx| method(ctx).map(erase_trait));
        self.update(move |info| info.source = ProviderSource::Method { method, type_key: None })
    }

    pub fn from_method_multiple<F>(self, method: F) -> Self
    where
        F: Fn(&InjectContext<'_>) -> Result<Vec<Arc<T>>, BoxError> + Send + Sync + 'static,
    {
        let method = multiple_method_fn(move |ctx| Ok(method(ctx)?.into_iter().map(erase_trait).collect()));
        self.update(move |info| info.source = ProviderSource::Method { method, type_key: None })
    }

    pub fn from_resolve_id(self, id: impl Into<Identifier>) -> Self {
        self.update(move |info| info.source = ProviderSource::Resolve(Inject::of::<T>().with_id(id)))
    }

    /// Forwards to the binding of concrete `C` and exposes it as `T`.
    pub fn to_resolved<C, F>(self, cast: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let cast = trait_cast::<C, T, F>(cast);
        self.update(move |info| {
            info.source = ProviderSource::Resolve(Inject::of::<C>());
            info.contracts[0].1 = Some(cast);
        })
    }
}

/// Builder for a binding keyed by an arbitrary [`Contract`], such as an open
/// generic definition or an array contract.
pub struct ContractBinder {
    info: BindHandle,
}

impl ContractBinder {
    pub(crate) fn new(info: BindHandle) -> Self {
        ContractBinder { info }
    }

    binder_common!();

    pub fn to_descriptor(self, descriptor: TypeDescriptor) -> Self {
        let descriptor = Arc::new(descriptor);
        self.update(move |info| info.source = ProviderSource::Construct(descriptor))
    }

    pub fn from_any(self, instance: AnyArc, type_key: TypeKey) -> Self {
        self.update(move |info| info.source = ProviderSource::Instance { instance, type_key })
    }

    /// Calls `method` with the request context, which names the exact closed contract requested.
    pub fn from_method_any<F>(self, method: F) -> Self
    where
        F: Fn(&InjectContext<'_>) -> Result<AnyArc, BoxError> + Send + Sync + 'static,
    {
        let method = method_fn(method);
        self.update(move |info| info.source = ProviderSource::Method { method, type_key: None })
    }

    pub fn from_resolve(self, request: Inject) -> Self {
        self.update(move |info| info.source = ProviderSource::Resolve(request))
    }
}
