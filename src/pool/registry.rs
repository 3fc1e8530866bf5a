//! Registry of live pools for diagnostics.

use std::sync::{Arc, Weak};

use crate::internal::sync::Mutex;

/// Snapshot of one pool's occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub item_type: &'static str,
    pub active: usize,
    pub inactive: usize,
    pub total: usize,
}

/// Anything that can report [`PoolStats`].
pub trait PoolStatsSource: Send + Sync {
    fn stats(&self) -> PoolStats;
}

/// Tracks pools without keeping them alive.
///
/// Each container tree shares one registry, reachable from any container via
/// [`Container::pool_registry`](crate::Container::pool_registry). Pools that
/// have been dropped disappear from snapshots.
#[derive(Clone, Default)]
pub struct PoolRegistry {
    pools: Arc<Mutex<Vec<Weak<dyn PoolStatsSource>>>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: PoolStatsSource + 'static>(&self, pool: &Arc<P>) {
        let erased: Arc<dyn PoolStatsSource> = pool.clone();
        self.pools.lock().push(Arc::downgrade(&erased));
    }

    /// Forgets `pool`. Returns whether it was registered.
    pub fn unregister<P: PoolStatsSource + 'static>(&self, pool: &Arc<P>) -> bool {
        let target = Arc::as_ptr(pool) as *const ();
        let mut pools = self.pools.lock();
        let before = pools.len();
        pools.retain(|weak| weak.as_ptr() as *const () != target);
        pools.len() != before
    }

    /// Stats of every live pool, in registration order.
    pub fn snapshot(&self) -> Vec<PoolStats> {
        let mut pools = self.pools.lock();
        pools.retain(|weak| weak.strong_count() > 0);
        pools.iter().filter_map(Weak::upgrade).map(|pool| pool.stats()).collect()
    }

    pub fn len(&self) -> usize {
        let mut pools = self.pools.lock();
        pools.retain(|weak| weak.strong_count() > 0);
        pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry").field("pools", &self.len()).finish()
    }
}
