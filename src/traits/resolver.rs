//! Resolver traits for typed resolution.

use std::sync::Arc;

use crate::context::Inject;
use crate::contract::Identifier;
use crate::error::{DiError, DiResult};
use crate::instance::{downcast, downcast_trait, AnyArc, InstanceList};
use crate::internal::BoxFutureUnit;
use crate::lazy::Lazy;
use crate::traits::{AsyncDispose, Dispose};

/// Object-safe resolution core.
///
/// Implemented by [`Container`](crate::Container) for requests made from
/// outside any construction, and by [`InjectContext`](crate::InjectContext)
/// for requests made while a provider is running. The latter keeps the
/// request chain intact for conditions and diagnostics.
pub trait ResolverCore {
    /// Resolves a single value. `Ok(None)` only for optional requests without a fallback.
    fn resolve_inject(&self, request: Inject) -> DiResult<Option<AnyArc>>;

    /// Resolves every matching value across the request's lookup scope.
    fn resolve_all_inject(&self, request: Inject) -> DiResult<Vec<AnyArc>>;

    /// Registers a synchronous teardown hook with the owning container.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous teardown hook with the owning container.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// Typed resolution built on [`ResolverCore`].
///
/// # Examples
///
/// ```rust
/// use ferrous_hive::{Container, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let container = Container::new();
/// container.bind::<u32>().from_instance(7);
/// container.bind_trait::<dyn Greeter>().from_instance(Arc::new(English));
///
/// assert_eq!(*container.resolve::<u32>().unwrap(), 7);
/// assert_eq!(container.resolve_trait::<dyn Greeter>().unwrap().greet(), "hello");
/// assert!(container.try_resolve::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the single provider of `T`.
    fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_with(Inject::of::<T>())
    }

    /// Resolves the provider of `T` bound under `id`.
    fn resolve_id<T: Send + Sync + 'static>(&self, id: impl Into<Identifier>) -> DiResult<Arc<T>> {
        self.resolve_with(Inject::of::<T>().with_id(id))
    }

    /// Resolves a fully specified request as `T`.
    fn resolve_with<T: Send + Sync + 'static>(&self, request: Inject) -> DiResult<Arc<T>> {
        let key = request.key();
        let value = self.resolve_inject(request)?.ok_or_else(|| missing(&key.to_string()))?;
        downcast(value)
    }

    /// Resolves `T` if bound, `None` otherwise.
    fn try_resolve<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_inject(Inject::of::<T>().optional())?
            .map(downcast)
            .transpose()
    }

    fn try_resolve_id<T: Send + Sync + 'static>(&self, id: impl Into<Identifier>) -> DiResult<Option<Arc<T>>> {
        self.resolve_inject(Inject::of::<T>().with_id(id).optional())?
            .map(downcast)
            .transpose()
    }

    /// Resolves `request` as optional: `None` when nothing matched.
    fn try_resolve_with<T: Send + Sync + 'static>(&self, request: Inject) -> DiResult<Option<Arc<T>>> {
        self.resolve_inject(request.optional())?.map(downcast).transpose()
    }

    /// Resolves the single provider of a trait object.
    fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_trait_with(Inject::of::<T>())
    }

    fn resolve_trait_id<T: ?Sized + Send + Sync + 'static>(&self, id: impl Into<Identifier>) -> DiResult<Arc<T>> {
        self.resolve_trait_with(Inject::of::<T>().with_id(id))
    }

    fn resolve_trait_with<T: ?Sized + Send + Sync + 'static>(&self, request: Inject) -> DiResult<Arc<T>> {
        let key = request.key();
        let value = self.resolve_inject(request)?.ok_or_else(|| missing(&key.to_string()))?;
        downcast_trait(value)
    }

    fn try_resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_inject(Inject::of::<T>().optional())?
            .map(downcast_trait)
            .transpose()
    }

    /// Every provider of `T` in lookup order; empty when none are bound.
    fn resolve_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_inject(Inject::of::<T>().optional())?
            .into_iter()
            .map(downcast)
            .collect()
    }

    fn resolve_all_id<T: Send + Sync + 'static>(&self, id: impl Into<Identifier>) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_inject(Inject::of::<T>().with_id(id).optional())?
            .into_iter()
            .map(downcast)
            .collect()
    }

    /// Every provider of a trait object in lookup order.
    fn resolve_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_inject(Inject::of::<T>().optional())?
            .into_iter()
            .map(downcast_trait)
            .collect()
    }

    /// Resolves the array contract of `T`.
    ///
    /// Unlike [`Resolver::resolve_all`], an explicit binding of the array
    /// contract itself takes precedence over collecting element providers.
    fn resolve_array<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        let list: Arc<InstanceList> = self.resolve_with(Inject::array_of::<T>())?;
        list.downcast_all()
    }

    /// Deferred handle to `T`, resolved on first access.
    fn resolve_lazy<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Lazy<T>> {
        let value = self
            .resolve_inject(Inject::lazy_of::<T>())?
            .ok_or_else(|| missing(std::any::type_name::<Lazy<T>>()))?;
        Lazy::from_any(value)
    }

    /// Runs `service.dispose()` when the owning container is disposed.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Runs `service.dispose().await` when the owning container is disposed asynchronously.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || -> BoxFutureUnit {
            Box::pin(async move { service.dispose().await })
        }));
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn missing(contract: &str) -> DiError {
    DiError::MissingBinding {
        contract: contract.to_string(),
        chain: vec![contract.to_string()],
    }
}
