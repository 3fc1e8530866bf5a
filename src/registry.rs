//! Per-container binding storage.

use std::sync::Arc;

use crate::context::{Condition, InjectContext};
use crate::contract::ContractKey;
use crate::error::DiResult;
use crate::instance::AnyArc;
use crate::internal::HashMap;
use crate::provider::Provider;

/// Converts a provider's product into the representation a contract expects,
/// e.g. `Arc<Impl>` into `Arc<dyn Trait>`.
pub(crate) type CastFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// One registration of a provider under a contract key.
#[derive(Clone)]
pub(crate) struct ProviderInfo {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) condition: Option<Condition>,
    pub(crate) non_lazy: bool,
    pub(crate) cast: Option<CastFn>,
}

impl ProviderInfo {
    pub(crate) fn matches(&self, ctx: &InjectContext<'_>) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition(ctx))
    }

    pub(crate) fn has_condition(&self) -> bool {
        self.condition.is_some()
    }
}

/// Provider lists keyed by contract, kept in first-registration order.
#[derive(Default)]
pub(crate) struct Registry {
    providers: HashMap<ContractKey, Vec<ProviderInfo>>,
    order: Vec<ContractKey>,
}

impl Registry {
    pub(crate) fn register(&mut self, key: ContractKey, info: ProviderInfo) {
        match self.providers.get_mut(&key) {
            Some(list) => list.push(info),
            None => {
                self.order.push(key.clone());
                self.providers.insert(key, vec![info]);
            }
        }
    }

    /// Providers for `key`, falling back to the open generic definition.
    pub(crate) fn local(&self, key: &ContractKey) -> Vec<ProviderInfo> {
        if let Some(list) = self.providers.get(key) {
            return list.clone();
        }
        let Some(open) = key.contract.open_definition() else {
            return Vec::new();
        };
        self.providers
            .get(&ContractKey::new(open, key.identifier.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn remove(&mut self, key: &ContractKey) -> bool {
        let removed = self.providers.remove(key).is_some();
        if removed {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Drops the providers of `key` for which `pred` holds. Returns how many were dropped.
    pub(crate) fn remove_where(&mut self, key: &ContractKey, pred: impl Fn(&ProviderInfo) -> bool) -> usize {
        let Some(list) = self.providers.get_mut(key) else {
            return 0;
        };
        let before = list.len();
        list.retain(|info| !pred(info));
        let removed = before - list.len();
        if list.is_empty() {
            self.remove(key);
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.providers.clear();
        self.order.clear();
    }

    pub(crate) fn keys(&self) -> Vec<ContractKey> {
        self.order.clone()
    }

    /// Every registration in key order.
    pub(crate) fn entries(&self) -> Vec<(ContractKey, ProviderInfo)> {
        self.order
            .iter()
            .flat_map(|key| {
                self.providers
                    .get(key)
                    .into_iter()
                    .flatten()
                    .map(move |info| (key.clone(), info.clone()))
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.values().map(Vec::len).sum()
    }
}
