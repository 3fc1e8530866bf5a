//! The container hierarchy.
//!
//! A [`Container`] owns a registry of bindings and may have any number of
//! parent containers. Lookups walk the requesting container and its
//! ancestors in breadth-first order, preferring the nearest match.
//!
//! # Examples
//!
//! ```rust
//! use ferrous_hive::{Container, Resolver};
//!
//! # fn main() -> ferrous_hive::DiResult<()> {
//! let root = Container::new();
//! root.bind::<String>().from_instance("root".to_string());
//!
//! let child = root.create_sub_container()?;
//! assert_eq!(child.resolve::<String>()?.as_str(), "root");
//!
//! child.bind::<String>().from_instance("child".to_string());
//! assert_eq!(child.resolve::<String>()?.as_str(), "child");
//! assert_eq!(root.resolve::<String>()?.as_str(), "root");
//! # Ok(())
//! # }
//! ```

mod instantiate;
mod resolve;
mod validate;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::binding::{BindHandle, BindInfo, Binder, ContractBinder, TraitBinder};
use crate::context::{Inject, InjectContext};
use crate::contract::{Contract, ContractKey, Identifier, LazyDefinition, TypeKey};
use crate::error::{DiError, DiResult};
use crate::instance::AnyArc;
use crate::internal::sync::{Mutex, RwLock};
use crate::internal::{BoxFutureUnit, DisposeBag};
use crate::lazy::LazyInstance;
use crate::observer::{ContainerObserver, Observers};
use crate::pool::{InstanceFactory, MemoryPool, NoHooks, PoolHooks, PoolRegistry, PoolSettings};
use crate::provider::{ContainerProvider, LazyProvider};
use crate::registry::{ProviderInfo, Registry};
use crate::settings::ContainerSettings;
use crate::traits::ResolverCore;

/// Failures a validating tree keeps between [`Container::validate`] calls.
/// Later ones are counted and dropped.
pub const MAX_VALIDATION_ERRORS: usize = 1024;

/// State shared by every container of one tree.
#[derive(Default)]
struct TreeState {
    pools: PoolRegistry,
    validation_errors: Mutex<Vec<DiError>>,
}

pub(crate) struct ContainerInner {
    id: u64,
    parents: Vec<Container>,
    /// Breadth-first ancestors with their distance, nearest first.
    ancestors: Vec<(Container, usize)>,
    settings: ContainerSettings,
    registry: RwLock<Registry>,
    pending: Mutex<VecDeque<BindHandle>>,
    child_bindings: Mutex<Vec<BindInfo>>,
    shared: Arc<TreeState>,
    observers: RwLock<Observers>,
    disposers: Mutex<DisposeBag>,
    installing: AtomicBool,
    install_warned: AtomicBool,
    deferred_lazies: Mutex<Vec<Arc<LazyInstance>>>,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let disposers = self.disposers.lock();
        if !disposers.is_empty() {
            tracing::warn!(
                container = self.id,
                pending = disposers.len(),
                "container dropped with teardown hooks that never ran; call dispose() first"
            );
        }
    }
}

/// A node of the container hierarchy. Cloning yields another handle to the same container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle held by providers that need their container back.
#[derive(Clone)]
pub(crate) struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    pub(crate) fn upgrade(&self) -> DiResult<Container> {
        self.0
            .upgrade()
            .map(|inner| Container { inner })
            .ok_or(DiError::ContainerDropped)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Root container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self::build(Vec::new(), settings, Arc::default(), Observers::default())
    }

    /// Container below every container in `parents`.
    ///
    /// The parents are flushed first. Every ancestor's inheritable bindings
    /// are then finalized into the new container: `*IntoAll` bindings from
    /// any ancestor, `*DirectOnly` bindings only from direct parents.
    pub fn with_parents(parents: impl IntoIterator<Item = Container>, settings: ContainerSettings) -> DiResult<Self> {
        let parents: Vec<Container> = parents.into_iter().collect();
        for parent in &parents {
            parent.flush()?;
        }
        let shared = parents
            .first()
            .map(|parent| parent.inner.shared.clone())
            .unwrap_or_default();
        let observers = parents
            .first()
            .map(|parent| parent.inner.observers.read().clone())
            .unwrap_or_default();
        let container = Self::build(parents, settings, shared, observers);
        for (ancestor, _) in &container.inner.ancestors {
            ancestor.flush()?;
        }
        container.inherit_bindings()?;
        Ok(container)
    }

    /// Child of this container with the same settings.
    pub fn create_sub_container(&self) -> DiResult<Container> {
        Container::with_parents([self.clone()], self.inner.settings)
    }

    fn build(parents: Vec<Container>, settings: ContainerSettings, shared: Arc<TreeState>, observers: Observers) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let ancestors = breadth_first_ancestors(&parents);
        let container = Container {
            inner: Arc::new(ContainerInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                parents,
                ancestors,
                settings,
                registry: RwLock::new(Registry::default()),
                pending: Mutex::new(VecDeque::new()),
                child_bindings: Mutex::new(Vec::new()),
                shared,
                observers: RwLock::new(observers),
                disposers: Mutex::new(DisposeBag::default()),
                installing: AtomicBool::new(false),
                install_warned: AtomicBool::new(false),
                deferred_lazies: Mutex::new(Vec::new()),
            }),
        };
        container.install_default_bindings();
        tracing::debug!(
            container = container.id(),
            parents = container.inner.parents.len(),
            ancestors = container.inner.ancestors.len(),
            validating = settings.validating,
            "container created"
        );
        container
    }

    /// Binds the container itself and the open `Lazy<_>` definition.
    fn install_default_bindings(&self) {
        let mut registry = self.inner.registry.write();
        registry.register(
            ContractKey::of::<Container>(),
            ProviderInfo {
                provider: Arc::new(ContainerProvider::new(self.downgrade())),
                condition: None,
                non_lazy: false,
                cast: None,
            },
        );
        registry.register(
            ContractKey::new(Contract::open(TypeKey::of::<LazyDefinition>()), None),
            ProviderInfo {
                provider: Arc::new(LazyProvider::new(self.downgrade())),
                condition: None,
                non_lazy: false,
                cast: None,
            },
        );
    }

    fn inherit_bindings(&self) -> DiResult<()> {
        for (ancestor, distance) in &self.inner.ancestors {
            let bindings = ancestor.inner.child_bindings.lock().clone();
            for info in bindings {
                if info.inheritance.reaches_all() || *distance == 1 {
                    info.finalize(self)?;
                }
            }
        }
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn settings(&self) -> ContainerSettings {
        self.inner.settings
    }

    pub fn is_validating(&self) -> bool {
        self.inner.settings.validating
    }

    pub fn parents(&self) -> &[Container] {
        &self.inner.parents
    }

    /// Every ancestor once, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Container> + '_ {
        self.inner.ancestors.iter().map(|(container, _)| container)
    }

    /// Length of the shortest parent path from this container to `other`.
    pub fn distance_to(&self, other: &Container) -> Option<usize> {
        if self.ptr_eq(other) {
            return Some(0);
        }
        self.inner
            .ancestors
            .iter()
            .find(|(ancestor, _)| ancestor.ptr_eq(other))
            .map(|(_, distance)| *distance)
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Pools created anywhere in this container's tree.
    pub fn pool_registry(&self) -> &PoolRegistry {
        &self.inner.shared.pools
    }

    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) {
        self.inner.observers.write().add(observer);
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    // ----- binding -----

    /// Starts a binding of concrete type `T`.
    pub fn bind<T: Send + Sync + 'static>(&self) -> Binder<T> {
        Binder::new(self.start_binding(Contract::of::<T>()))
    }

    /// Starts a binding of trait object `T`, e.g. `dyn Logger`.
    pub fn bind_trait<T: ?Sized + Send + Sync + 'static>(&self) -> TraitBinder<T> {
        TraitBinder::new(self.start_binding(Contract::of::<T>()))
    }

    /// Starts a binding of an arbitrary contract.
    pub fn bind_contract(&self, contract: Contract) -> ContractBinder {
        ContractBinder::new(self.start_binding(contract))
    }

    fn start_binding(&self, contract: Contract) -> BindHandle {
        let handle = Arc::new(Mutex::new(BindInfo::new(contract)));
        self.inner.pending.lock().push_back(handle.clone());
        handle
    }

    /// Creates a pool of `T`, binds `T` to acquire from it and `MemoryPool<T>`
    /// to the pool itself, and on dispose destroys its inactive items and
    /// drops it from the pool registry.
    ///
    /// In validation mode the pool is created empty.
    pub fn bind_pool<T: Send + Sync + 'static>(
        &self,
        settings: PoolSettings,
        factory: impl InstanceFactory<T> + 'static,
    ) -> DiResult<Arc<MemoryPool<T>>> {
        self.bind_pool_with_hooks(settings, factory, NoHooks)
    }

    pub fn bind_pool_with_hooks<T: Send + Sync + 'static>(
        &self,
        settings: PoolSettings,
        factory: impl InstanceFactory<T> + 'static,
        hooks: impl PoolHooks<T> + 'static,
    ) -> DiResult<Arc<MemoryPool<T>>> {
        let pool = Arc::new(if self.is_validating() {
            MemoryPool::unfilled(settings, factory, hooks)
        } else {
            MemoryPool::with_hooks(settings, factory, hooks)?
        });
        self.pool_registry().register(&pool);
        self.bind::<T>().from_pool(pool.clone());
        self.bind::<MemoryPool<T>>().from_arc(pool.clone());
        let teardown = pool.clone();
        let registry = self.pool_registry().clone();
        self.push_sync_disposer(Box::new(move || {
            registry.unregister(&teardown);
            teardown.drain();
        }));
        Ok(pool)
    }

    /// Finalizes every queued binding.
    ///
    /// Called implicitly before every lookup. Bindings marked for
    /// inheritance are also recorded for sub-containers created later.
    pub fn flush(&self) -> DiResult<()> {
        loop {
            let next = self.inner.pending.lock().pop_front();
            let Some(handle) = next else {
                return Ok(());
            };
            let info = handle.lock().clone();
            if !info.inheritance.is_move() {
                info.finalize(self)?;
            }
            if info.inheritance.is_inherited() {
                self.inner.child_bindings.lock().push(info);
            }
        }
    }

    pub(crate) fn register_provider(&self, key: ContractKey, info: ProviderInfo) {
        self.inner.registry.write().register(key, info);
    }

    pub(crate) fn local_providers(&self, key: &ContractKey) -> Vec<ProviderInfo> {
        self.inner.registry.read().local(key)
    }

    // ----- unbinding and queries -----

    /// Removes every local provider of `T`. Returns whether any existed.
    pub fn unbind<T: ?Sized + 'static>(&self) -> DiResult<bool> {
        self.unbind_key(&ContractKey::of::<T>())
    }

    pub fn unbind_id<T: ?Sized + 'static>(&self, id: impl Into<Identifier>) -> DiResult<bool> {
        self.unbind_key(&ContractKey::of::<T>().with_id(id))
    }

    pub fn unbind_key(&self, key: &ContractKey) -> DiResult<bool> {
        self.flush()?;
        let removed = self.inner.registry.write().remove(key);
        tracing::debug!(container = self.id(), contract = %key, removed, "unbind");
        Ok(removed)
    }

    /// Removes the local providers of `T` whose product is concrete type `C`.
    pub fn unbind_concrete<T: ?Sized + 'static, C: ?Sized + 'static>(&self) -> DiResult<bool> {
        self.unbind_concrete_key(&ContractKey::of::<T>(), TypeKey::of::<C>())
    }

    pub fn unbind_concrete_key(&self, key: &ContractKey, concrete: TypeKey) -> DiResult<bool> {
        self.flush()?;
        let ctx = InjectContext::root(
            self.clone(),
            Inject::for_contract(key.contract.clone()).with_identifier(key.identifier.clone()),
        );
        let doomed: HashSet<_> = self
            .local_providers(key)
            .into_iter()
            .filter(|info| info.provider.instance_type(&ctx) == Some(concrete))
            .map(|info| info.provider.id())
            .collect();
        let removed = self
            .inner
            .registry
            .write()
            .remove_where(key, |info| doomed.contains(&info.provider.id()));
        Ok(removed > 0)
    }

    /// Removes every local binding; the built-in container and lazy bindings are restored.
    pub fn unbind_all(&self) -> DiResult<()> {
        self.flush()?;
        self.inner.registry.write().clear();
        self.install_default_bindings();
        Ok(())
    }

    /// Unbinds `T` and starts a fresh binding of it.
    pub fn rebind<T: Send + Sync + 'static>(&self) -> DiResult<Binder<T>> {
        self.unbind::<T>()?;
        Ok(self.bind::<T>())
    }

    pub fn rebind_id<T: Send + Sync + 'static>(&self, id: impl Into<Identifier>) -> DiResult<Binder<T>> {
        let id = id.into();
        self.unbind_id::<T>(id.clone())?;
        Ok(self.bind::<T>().with_id(id))
    }

    pub fn rebind_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<TraitBinder<T>> {
        self.unbind::<T>()?;
        Ok(self.bind_trait::<T>())
    }

    /// Whether a request for `T` would find a provider anywhere in scope.
    pub fn has_binding<T: ?Sized + 'static>(&self) -> DiResult<bool> {
        self.has_binding_with(Inject::of::<T>())
    }

    pub fn has_binding_id<T: ?Sized + 'static>(&self, id: impl Into<Identifier>) -> DiResult<bool> {
        self.has_binding_with(Inject::of::<T>().with_id(id))
    }

    pub fn has_binding_with(&self, request: Inject) -> DiResult<bool> {
        let ctx = InjectContext::root(self.clone(), request);
        Ok(!self.provider_matches(&ctx)?.is_empty())
    }

    /// Every contract key with a local provider, in first-registration order.
    pub fn all_contracts(&self) -> DiResult<Vec<ContractKey>> {
        self.flush()?;
        Ok(self.inner.registry.read().keys())
    }

    pub(crate) fn binding_count(&self) -> usize {
        self.inner.registry.read().len()
    }

    // ----- teardown -----

    /// Runs synchronous teardown hooks, newest first.
    ///
    /// Async hooks stay registered for [`Container::dispose_async`].
    pub fn dispose(&self) {
        self.clear_validation_state();
        let bag = self.inner.disposers.lock().take_sync();
        tracing::debug!(container = self.id(), hooks = bag.len(), "disposing");
        bag.run_sync();
    }

    /// Runs async teardown hooks, then synchronous ones, each newest first.
    pub async fn dispose_async(&self) {
        self.clear_validation_state();
        let bag = self.inner.disposers.lock().take();
        tracing::debug!(container = self.id(), hooks = bag.len(), "disposing asynchronously");
        bag.run_async().await;
    }

    /// Whether an installer is currently running against this container.
    pub fn is_installing(&self) -> bool {
        self.inner.installing.load(Ordering::SeqCst)
    }

    pub(crate) fn defer_validation(&self, lazy: Arc<LazyInstance>) {
        self.inner.deferred_lazies.lock().push(lazy);
    }

    pub(crate) fn record_validation_error(&self, error: DiError) {
        let mut errors = self.inner.shared.validation_errors.lock();
        if errors.len() >= MAX_VALIDATION_ERRORS {
            tracing::warn!(container = self.id(), %error, "validation error dropped, limit reached");
            return;
        }
        tracing::debug!(container = self.id(), %error, "validation error recorded");
        errors.push(error);
    }

    /// Collected errors belong to the tree, so only a root drops them.
    fn clear_validation_state(&self) {
        if self.inner.parents.is_empty() {
            self.inner.shared.validation_errors.lock().clear();
        }
        self.inner.deferred_lazies.lock().clear();
    }

    pub(crate) fn take_validation_errors(&self) -> Vec<DiError> {
        std::mem::take(&mut *self.inner.shared.validation_errors.lock())
    }
}

impl ResolverCore for Container {
    fn resolve_inject(&self, request: Inject) -> DiResult<Option<AnyArc>> {
        self.resolve_in(&InjectContext::root(self.clone(), request))
    }

    fn resolve_all_inject(&self, request: Inject) -> DiResult<Vec<AnyArc>> {
        self.resolve_all_in(&InjectContext::root(self.clone(), request))
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.disposers.lock().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner.disposers.lock().push_async(f);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("parents", &self.inner.parents.iter().map(Container::id).collect::<Vec<_>>())
            .field("bindings", &self.binding_count())
            .field("validating", &self.inner.settings.validating)
            .finish()
    }
}

fn breadth_first_ancestors(parents: &[Container]) -> Vec<(Container, usize)> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut queue: VecDeque<(Container, usize)> = parents.iter().map(|parent| (parent.clone(), 1)).collect();
    while let Some((container, distance)) = queue.pop_front() {
        if !seen.insert(container.id()) {
            continue;
        }
        for parent in &container.inner.parents {
            queue.push_back((parent.clone(), distance + 1));
        }
        ordered.push((container, distance));
    }
    ordered
}
