//! Observation hooks for resolution events.

use std::sync::Arc;
use std::time::Duration;

use crate::contract::ContractKey;
use crate::error::DiError;
use crate::provider::ProviderKind;

/// Receives provider invocations made by a container.
///
/// Observers are called synchronously around every provider invocation, so
/// implementations should stay cheap. Sub-containers start with a copy of
/// their first parent's observers.
///
/// # Examples
///
/// ```
/// use ferrous_hive::{Container, ContainerObserver, ContractKey, ProviderKind, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ContainerObserver for Counter {
///     fn resolving(&self, _key: &ContractKey, _kind: ProviderKind) {}
///
///     fn resolved(&self, _key: &ContractKey, _kind: ProviderKind, _duration: Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let container = Container::new();
/// container.add_observer(counter.clone());
/// container.bind::<u8>().from_instance(1);
///
/// container.resolve::<u8>().unwrap();
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// A provider is about to run for `key`.
    fn resolving(&self, key: &ContractKey, kind: ProviderKind);

    /// The provider for `key` returned successfully.
    fn resolved(&self, key: &ContractKey, kind: ProviderKind, duration: Duration);

    /// The provider for `key` failed.
    fn failed(&self, _key: &ContractKey, _kind: ProviderKind, _error: &DiError) {}
}

/// Observer that forwards events to `tracing`.
///
/// Resolutions are logged at `TRACE`, failures at `DEBUG`; install a
/// subscriber filter for `ferrous_hive` to see them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ContainerObserver for TracingObserver {
    fn resolving(&self, key: &ContractKey, kind: ProviderKind) {
        tracing::trace!(contract = %key, ?kind, "resolving");
    }

    fn resolved(&self, key: &ContractKey, kind: ProviderKind, duration: Duration) {
        tracing::trace!(contract = %key, ?kind, elapsed_us = duration.as_micros() as u64, "resolved");
    }

    fn failed(&self, key: &ContractKey, kind: ProviderKind, error: &DiError) {
        tracing::debug!(contract = %key, ?kind, %error, "resolution failed");
    }
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &ContractKey, kind: ProviderKind) {
        for observer in &self.observers {
            observer.resolving(key, kind);
        }
    }

    pub(crate) fn resolved(&self, key: &ContractKey, kind: ProviderKind, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, kind, duration);
        }
    }

    pub(crate) fn failed(&self, key: &ContractKey, kind: ProviderKind, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, kind, error);
        }
    }
}
