//! Reusable object pools.
//!
//! A [`MemoryPool`] keeps a stack of inactive items. [`MemoryPool::acquire`]
//! hands one out, growing the stack according to the pool's
//! [`PoolExpandMethod`] when it is empty; [`MemoryPool::release`] takes it
//! back and trims the stack to the configured maximum.
//!
//! # Examples
//!
//! ```rust
//! use ferrous_hive::{MemoryPool, PoolExpandMethod, PoolSettings};
//!
//! let pool = MemoryPool::from_fn(PoolSettings::new(2, 8, PoolExpandMethod::Double), || Vec::<u8>::new())
//!     .unwrap();
//! assert_eq!(pool.num_inactive(), 2);
//!
//! let buffer = pool.acquire().unwrap();
//! assert_eq!(pool.num_active(), 1);
//! pool.release(buffer).unwrap();
//! assert_eq!(pool.num_total(), 2);
//! ```

mod registry;

pub use registry::{PoolRegistry, PoolStats, PoolStatsSource};

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::contract::TypeKey;
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::AnyArc;
use crate::internal::sync::Mutex;

/// How a pool grows when acquired from while empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum PoolExpandMethod {
    /// Fixed size: acquiring from an empty pool fails.
    Disabled,
    /// Allocate a single item.
    #[default]
    OneAtATime,
    /// Double the total item count, or allocate one when the pool is empty.
    Double,
}

/// Sizing policy of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PoolSettings {
    /// Items allocated when the pool is created.
    pub initial_size: usize,
    /// Upper bound on inactive items kept after a release.
    pub max_size: usize,
    pub expand_method: PoolExpandMethod,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            initial_size: 0,
            max_size: usize::MAX,
            expand_method: PoolExpandMethod::OneAtATime,
        }
    }
}

impl PoolSettings {
    pub fn new(initial_size: usize, max_size: usize, expand_method: PoolExpandMethod) -> Self {
        PoolSettings {
            initial_size,
            max_size,
            expand_method,
        }
    }

    /// Pool of exactly `size` items that never grows.
    pub fn fixed(size: usize) -> Self {
        PoolSettings::new(size, size, PoolExpandMethod::Disabled)
    }
}

/// Produces new pool items.
pub trait InstanceFactory<T>: Send + Sync {
    fn create(&self) -> Result<T, BoxError>;
}

impl<T, F> InstanceFactory<T> for F
where
    F: Fn() -> Result<T, BoxError> + Send + Sync,
{
    fn create(&self) -> Result<T, BoxError> {
        self()
    }
}

/// Lifecycle callbacks of pooled items. All default to no-ops.
///
/// Callbacks run while the pool's lock is held and must not call back into
/// the same pool.
pub trait PoolHooks<T>: Send + Sync {
    /// Item was just allocated.
    fn on_created(&self, _item: &T) {}
    /// Item is being removed from the pool for good.
    fn on_destroyed(&self, _item: &T) {}
    /// Item is being handed out.
    fn on_spawned(&self, _item: &T) {}
    /// Item was returned to the pool.
    fn on_despawned(&self, _item: &T) {}
}

/// Hook set that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T> PoolHooks<T> for NoHooks {}

struct PoolState<T> {
    inactive: Vec<Arc<T>>,
    active: usize,
}

/// Pool of reusable `T` items.
pub struct MemoryPool<T> {
    settings: PoolSettings,
    factory: Box<dyn InstanceFactory<T>>,
    hooks: Box<dyn PoolHooks<T>>,
    state: Mutex<PoolState<T>>,
}

impl<T: Send + Sync + 'static> MemoryPool<T> {
    /// Creates a pool and allocates `settings.initial_size` items.
    pub fn new(settings: PoolSettings, factory: impl InstanceFactory<T> + 'static) -> DiResult<Self> {
        Self::with_hooks(settings, factory, NoHooks)
    }

    /// Creates a pool from an infallible constructor.
    pub fn from_fn<F>(settings: PoolSettings, create: F) -> DiResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(settings, move || -> Result<T, BoxError> { Ok(create()) })
    }

    pub fn with_hooks(
        settings: PoolSettings,
        factory: impl InstanceFactory<T> + 'static,
        hooks: impl PoolHooks<T> + 'static,
    ) -> DiResult<Self> {
        let pool = Self::unfilled(settings, factory, hooks);
        pool.fill()?;
        Ok(pool)
    }

    /// Pool with no items allocated yet.
    pub(crate) fn unfilled(
        settings: PoolSettings,
        factory: impl InstanceFactory<T> + 'static,
        hooks: impl PoolHooks<T> + 'static,
    ) -> Self {
        MemoryPool {
            settings,
            factory: Box::new(factory),
            hooks: Box::new(hooks),
            state: Mutex::new(PoolState {
                inactive: Vec::new(),
                active: 0,
            }),
        }
    }

    fn fill(&self) -> DiResult<()> {
        let mut state = self.state.lock();
        for _ in 0..self.settings.initial_size {
            let item = self.allocate()?;
            state.inactive.push(item);
        }
        tracing::debug!(item = Self::item_name(), size = state.inactive.len(), "pool filled");
        Ok(())
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    pub fn num_active(&self) -> usize {
        self.state.lock().active
    }

    pub fn num_inactive(&self) -> usize {
        self.state.lock().inactive.len()
    }

    pub fn num_total(&self) -> usize {
        let state = self.state.lock();
        state.active + state.inactive.len()
    }

    /// Hands out an inactive item, expanding the pool first if none is left.
    pub fn acquire(&self) -> DiResult<Arc<T>> {
        let mut state = self.state.lock();
        if state.inactive.is_empty() {
            self.expand(&mut state)?;
        }
        let item = state.inactive.pop().ok_or(DiError::PoolExhausted {
            item: Self::item_name(),
            size: state.active,
        })?;
        state.active += 1;
        self.hooks.on_spawned(&item);
        Ok(item)
    }

    /// Returns an item handed out by [`MemoryPool::acquire`].
    pub fn release(&self, item: Arc<T>) -> DiResult<()> {
        let mut state = self.state.lock();
        if state.active == 0 || state.inactive.iter().any(|held| Arc::ptr_eq(held, &item)) {
            return Err(DiError::DoubleRelease {
                item: Self::item_name(),
            });
        }
        state.active -= 1;
        self.hooks.on_despawned(&item);
        state.inactive.push(item);
        if state.inactive.len() > self.settings.max_size {
            let max = self.settings.max_size;
            self.shrink_to(&mut state, max);
        }
        Ok(())
    }

    /// Sets the number of inactive items to exactly `target`.
    pub fn resize(&self, target: usize) -> DiResult<()> {
        let mut state = self.state.lock();
        self.resize_locked(&mut state, target)
    }

    pub fn expand_by(&self, count: usize) -> DiResult<()> {
        let mut state = self.state.lock();
        let target = state.inactive.len().saturating_add(count);
        self.resize_locked(&mut state, target)
    }

    pub fn shrink_by(&self, count: usize) -> DiResult<()> {
        let mut state = self.state.lock();
        let target = state.inactive.len().saturating_sub(count);
        self.resize_locked(&mut state, target)
    }

    /// Destroys every inactive item.
    pub fn clear(&self) -> DiResult<()> {
        self.resize(0)
    }

    /// Checks that the factory can produce an item, without pooling it.
    pub fn validate(&self) -> DiResult<()> {
        self.factory
            .create()
            .map(drop)
            .map_err(|e| DiError::allocation(Self::item_name(), e))
    }

    /// Destroys every inactive item regardless of the expansion policy.
    pub(crate) fn drain(&self) {
        let mut state = self.state.lock();
        self.shrink_to(&mut state, 0);
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            item_type: Self::item_name(),
            active: state.active,
            inactive: state.inactive.len(),
            total: state.active + state.inactive.len(),
        }
    }

    fn expand(&self, state: &mut PoolState<T>) -> DiResult<()> {
        let total = state.active + state.inactive.len();
        let grow_by = match self.settings.expand_method {
            PoolExpandMethod::Disabled => {
                return Err(DiError::PoolExhausted {
                    item: Self::item_name(),
                    size: total,
                })
            }
            PoolExpandMethod::OneAtATime => 1,
            PoolExpandMethod::Double if total == 0 => 1,
            PoolExpandMethod::Double => total,
        };
        tracing::trace!(item = Self::item_name(), grow_by, "expanding pool");
        let target = state.inactive.len() + grow_by;
        self.resize_locked(state, target)
    }

    fn resize_locked(&self, state: &mut PoolState<T>, target: usize) -> DiResult<()> {
        let current = state.inactive.len();
        if current == target {
            return Ok(());
        }
        if self.settings.expand_method == PoolExpandMethod::Disabled {
            return Err(DiError::PoolExceededFixedSize {
                item: Self::item_name(),
                size: current,
            });
        }
        if target < current {
            self.shrink_to(state, target);
        } else {
            while state.inactive.len() < target {
                let item = self.allocate()?;
                state.inactive.push(item);
            }
        }
        Ok(())
    }

    fn shrink_to(&self, state: &mut PoolState<T>, target: usize) {
        while state.inactive.len() > target {
            if let Some(item) = state.inactive.pop() {
                self.hooks.on_destroyed(&item);
            }
        }
    }

    fn allocate(&self) -> DiResult<Arc<T>> {
        let item = self
            .factory
            .create()
            .map_err(|e| DiError::allocation(Self::item_name(), e))?;
        self.hooks.on_created(&item);
        Ok(Arc::new(item))
    }

    fn item_name() -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: Send + Sync + 'static> PoolStatsSource for MemoryPool<T> {
    fn stats(&self) -> PoolStats {
        MemoryPool::stats(self)
    }
}

impl<T> fmt::Debug for MemoryPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("item", &std::any::type_name::<T>())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Pool seen through the provider layer.
pub(crate) trait ErasedPool: Send + Sync {
    fn acquire_any(&self) -> DiResult<AnyArc>;
    fn item_type(&self) -> TypeKey;
    fn validate_factory(&self) -> DiResult<()>;
}

impl<T: Send + Sync + 'static> ErasedPool for MemoryPool<T> {
    fn acquire_any(&self) -> DiResult<AnyArc> {
        let item: AnyArc = self.acquire()?;
        Ok(item)
    }

    fn item_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn validate_factory(&self) -> DiResult<()> {
        self.validate()
    }
}
