use std::collections::HashSet;
use std::sync::atomic::Ordering;

use crate::context::{Inject, InjectContext, InjectSource};
use crate::contract::ContractKey;
use crate::error::{DiError, DiResult};
use crate::installer::Installer;
use crate::registry::ProviderInfo;

use super::resolve::ProviderPair;
use super::Container;

impl Container {
    /// Runs an installer against this container, then flushes its bindings.
    pub fn install<I: Installer + ?Sized>(&self, installer: &I) -> DiResult<()> {
        let was_installing = self.inner.installing.swap(true, Ordering::SeqCst);
        let result = installer.install_bindings(self);
        self.inner.installing.store(was_installing, Ordering::SeqCst);
        result?;
        self.flush()
    }

    /// Runs several installers in order, stopping at the first failure.
    pub fn install_all<'i>(&self, installers: impl IntoIterator<Item = &'i dyn Installer>) -> DiResult<()> {
        installers
            .into_iter()
            .try_for_each(|installer| self.install(installer))
    }

    /// Builds every local binding marked non-lazy. Returns how many were built.
    pub fn resolve_roots(&self) -> DiResult<usize> {
        let roots = self.non_lazy_roots()?;
        let count = roots.len();
        for (key, info) in roots {
            self.resolve_root(key, info)?;
        }
        tracing::debug!(container = self.id(), roots = count, "dependency roots resolved");
        Ok(count)
    }

    /// Walks the dependency graph without building ordinary objects.
    ///
    /// Resolves every non-lazy root, runs validators of validatable types,
    /// checks pool factories, and resolves every lazy created on the way.
    /// All failures are reported together.
    pub fn validate(&self) -> DiResult<()> {
        if !self.is_validating() {
            return Err(DiError::NotValidating);
        }
        let mut errors = Vec::new();

        for (key, info) in self.non_lazy_roots()? {
            if let Err(error) = self.resolve_root(key, info) {
                errors.push(error);
            }
        }

        let entries = self.inner.registry.read().entries();
        let mut checked = HashSet::new();
        for (key, info) in entries {
            if !checked.insert(info.provider.id()) {
                continue;
            }
            let request = Inject::for_contract(key.contract).with_identifier(key.identifier);
            let ctx = InjectContext::root(self.clone(), request);
            if let Some(Err(error)) = info.provider.validate(&ctx) {
                errors.push(error);
            }
        }

        loop {
            let next = self.inner.deferred_lazies.lock().pop();
            let Some(lazy) = next else {
                break;
            };
            if let Err(error) = lazy.validate() {
                errors.push(error);
            }
        }

        errors.extend(self.take_validation_errors());
        tracing::debug!(container = self.id(), errors = errors.len(), "validation finished");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DiError::Validation(errors))
        }
    }

    fn non_lazy_roots(&self) -> DiResult<Vec<(ContractKey, ProviderInfo)>> {
        self.flush()?;
        Ok(self
            .inner
            .registry
            .read()
            .entries()
            .into_iter()
            .filter(|(_, info)| info.non_lazy)
            .collect())
    }

    fn resolve_root(&self, key: ContractKey, info: ProviderInfo) -> DiResult<()> {
        let request = Inject::for_contract(key.contract)
            .with_identifier(key.identifier)
            .from_source(InjectSource::Local)
            .optional();
        let ctx = InjectContext::root(self.clone(), request);
        let pair = ProviderPair {
            info,
            container: self.clone(),
        };
        self.safe_get_instances(&pair, &ctx).map(drop)
    }
}
