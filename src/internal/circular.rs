//! Per-thread tracking of in-flight provider invocations.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::contract::ContractKey;
use crate::error::{DiError, DiResult};
use crate::provider::ProviderId;

const MAX_DEPTH: usize = 1024;

/// Invocations of one provider for one key that may be in flight at once.
///
/// The first re-entry is allowed so that a provider may legitimately serve a
/// nested request for its own contract (for example a decorator resolving
/// the instance it wraps from a parent container).
const MAX_IN_FLIGHT: u8 = 2;

thread_local! {
    static IN_FLIGHT: RefCell<InFlightTls> = RefCell::new(InFlightTls::default());
}

#[derive(Default)]
struct InFlightTls {
    counts: HashMap<LookupId, u8>,
    depth: usize,
}

/// Identity of one provider invocation: owning container, provider, requested key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct LookupId {
    pub(crate) container: u64,
    pub(crate) provider: ProviderId,
    pub(crate) key: ContractKey,
}

/// Marks a lookup in flight until dropped.
pub(crate) struct InFlightGuard {
    id: LookupId,
}

impl InFlightGuard {
    /// Fails with `CircularDependency` when `id` is already in flight twice.
    pub(crate) fn enter(id: LookupId, chain: impl FnOnce() -> Vec<String>) -> DiResult<Self> {
        IN_FLIGHT.with(|tls| {
            let mut tls = tls.borrow_mut();
            if tls.depth >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(tls.depth));
            }
            let count = tls.counts.get(&id).copied().unwrap_or(0);
            if count >= MAX_IN_FLIGHT {
                return Err(DiError::CircularDependency { chain: chain() });
            }
            tls.counts.insert(id.clone(), count + 1);
            tls.depth += 1;
            Ok(())
        })?;
        Ok(InFlightGuard { id })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Thread-local storage may already be gone during thread teardown.
        let _ = IN_FLIGHT.try_with(|tls| {
            let mut tls = tls.borrow_mut();
            if let Some(count) = tls.counts.get_mut(&self.id) {
                *count -= 1;
                if *count == 0 {
                    tls.counts.remove(&self.id);
                }
            }
            tls.depth = tls.depth.saturating_sub(1);
        });
    }
}
