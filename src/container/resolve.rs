use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::context::{Inject, InjectContext, InjectSource};
use crate::contract::TypeKey;
use crate::error::{DiError, DiResult};
use crate::instance::{erase, is_validation_marker, AnyArc, InstanceList};
use crate::internal::{InFlightGuard, LookupId};
use crate::registry::ProviderInfo;

use super::Container;

/// A provider together with the container it was found in.
pub(crate) struct ProviderPair {
    pub(crate) info: ProviderInfo,
    pub(crate) container: Container,
}

impl Container {
    /// Containers searched for `source`, with their distance from `self`, nearest first.
    fn lookup_containers(&self, source: InjectSource) -> Vec<(Container, usize)> {
        let ancestors = self.inner.ancestors.iter().cloned();
        match source {
            InjectSource::Local => vec![(self.clone(), 0)],
            InjectSource::Parent => ancestors.filter(|(_, distance)| *distance == 1).collect(),
            InjectSource::AnyParent => ancestors.collect(),
            InjectSource::Any => std::iter::once((self.clone(), 0)).chain(ancestors).collect(),
        }
    }

    fn flushed_lookup(&self, source: InjectSource) -> DiResult<Vec<(Container, usize)>> {
        let containers = self.lookup_containers(source);
        for (container, _) in &containers {
            container.flush()?;
        }
        Ok(containers)
    }

    /// Every provider in scope whose condition accepts `ctx`.
    pub(crate) fn provider_matches(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<ProviderPair>> {
        let key = ctx.key();
        let mut matches = Vec::new();
        for (container, _) in self.flushed_lookup(ctx.source())? {
            for info in container.local_providers(&key) {
                if info.matches(ctx) {
                    matches.push(ProviderPair {
                        info,
                        container: container.clone(),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// The one provider that should serve `ctx`.
    ///
    /// Nearer containers win. Within the winning distance a conditional match
    /// beats unconditional ones; two survivors of the same kind are ambiguous.
    pub(super) fn single_provider_match(&self, ctx: &InjectContext<'_>) -> DiResult<Option<ProviderPair>> {
        let key = ctx.key();
        let mut selected: Option<(ProviderPair, usize)> = None;
        let mut selected_has_condition = false;
        let mut ambiguous = false;

        for (container, distance) in self.flushed_lookup(ctx.source())? {
            if matches!(&selected, Some((_, best)) if distance > *best) {
                continue;
            }
            for info in container.local_providers(&key) {
                let has_condition = info.has_condition();
                if has_condition {
                    if !info.matches(ctx) {
                        continue;
                    }
                    ambiguous = selected_has_condition;
                } else {
                    if selected_has_condition {
                        continue;
                    }
                    if selected.is_some() {
                        ambiguous = true;
                    }
                }
                if ambiguous {
                    continue;
                }
                selected = Some((
                    ProviderPair {
                        info,
                        container: container.clone(),
                    },
                    distance,
                ));
                selected_has_condition = has_condition;
            }
        }

        if ambiguous {
            return Err(DiError::AmbiguousBinding {
                contract: key.to_string(),
                chain: ctx.request_chain(),
            });
        }
        Ok(selected.map(|(pair, _)| pair))
    }

    /// Runs one provider under the circular-dependency guard and applies the binding's cast.
    pub(super) fn safe_get_instances(&self, pair: &ProviderPair, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let key = ctx.key();
        let provider = &pair.info.provider;
        let _guard = InFlightGuard::enter(
            LookupId {
                container: pair.container.id(),
                provider: provider.id(),
                key: key.clone(),
            },
            || ctx.request_chain(),
        )?;
        self.warn_if_installing(ctx);

        let observers = {
            let observers = self.inner.observers.read();
            (!observers.is_empty()).then(|| observers.clone())
        };
        let kind = provider.kind();
        let started = Instant::now();
        if let Some(observers) = &observers {
            observers.resolving(&key, kind);
        }
        tracing::trace!(container = self.id(), contract = %key, provider = %provider.id(), ?kind, "providing");

        let result = provider.get_all_instances(ctx).and_then(|instances| match &pair.info.cast {
            Some(cast) => instances
                .into_iter()
                .map(|instance| {
                    if is_validation_marker(&instance) {
                        Ok(instance)
                    } else {
                        cast(instance)
                    }
                })
                .collect(),
            None => Ok(instances),
        });

        if let Some(observers) = &observers {
            match &result {
                Ok(_) => observers.resolved(&key, kind, started.elapsed()),
                Err(error) => observers.failed(&key, kind, error),
            }
        }
        result
    }

    /// Resolves exactly one instance for `ctx`.
    pub(crate) fn resolve_in(&self, ctx: &InjectContext<'_>) -> DiResult<Option<AnyArc>> {
        // Lazy handles are bound once per container, without identifier.
        let lookup = ctx.contract().is_lazy().then(|| {
            ctx.with_request(
                ctx.request()
                    .clone()
                    .with_identifier(None)
                    .from_source(InjectSource::Local)
                    .with_optional(false),
            )
        });
        let Some(pair) = self.single_provider_match(lookup.as_ref().unwrap_or(ctx))? else {
            return self.resolve_unmatched(ctx);
        };

        let instances = self.safe_get_instances(&pair, ctx)?;
        match instances.len() {
            1 => Ok(instances.into_iter().next()),
            0 if ctx.is_optional() => Ok(ctx.request().fallback_value().cloned()),
            found => Err(DiError::ProviderArityMismatch {
                contract: ctx.key().to_string(),
                found,
                chain: ctx.request_chain(),
            }),
        }
    }

    /// Array and list requests collect every element binding; anything else
    /// falls back to the request's default or fails.
    fn resolve_unmatched(&self, ctx: &InjectContext<'_>) -> DiResult<Option<AnyArc>> {
        let contract = ctx.contract();
        if let Some(element) = contract.array_element().or_else(|| contract.list_element()) {
            let elements = ctx.with_request(ctx.request().clone().with_contract(element.clone()).with_optional(true));
            let items = self.resolve_all_in(&elements)?;
            return Ok(Some(erase(InstanceList::new(items))));
        }
        if ctx.is_optional() {
            return Ok(ctx.request().fallback_value().cloned());
        }
        Err(DiError::MissingBinding {
            contract: ctx.key().to_string(),
            chain: ctx.request_chain(),
        })
    }

    /// Concatenates the instances of every matching provider.
    ///
    /// In validation mode placeholder instances are left out.
    pub(crate) fn resolve_all_in(&self, ctx: &InjectContext<'_>) -> DiResult<Vec<AnyArc>> {
        let matches = self.provider_matches(ctx)?;
        if matches.is_empty() && !ctx.is_optional() {
            return Err(DiError::MissingBinding {
                contract: ctx.key().to_string(),
                chain: ctx.request_chain(),
            });
        }
        let mut all = Vec::new();
        for pair in &matches {
            all.extend(self.safe_get_instances(pair, ctx)?);
        }
        // Providers matched but produced nothing.
        if all.is_empty() && !ctx.is_optional() {
            return Err(DiError::MissingBinding {
                contract: ctx.key().to_string(),
                chain: ctx.request_chain(),
            });
        }
        if self.is_validating() {
            all.retain(|instance| !is_validation_marker(instance));
        }
        Ok(all)
    }

    pub(crate) fn resolve_type_in(&self, ctx: &InjectContext<'_>) -> DiResult<Option<TypeKey>> {
        Ok(self
            .single_provider_match(ctx)?
            .and_then(|pair| pair.info.provider.instance_type(ctx)))
    }

    /// Concrete type that a request would produce, without building anything.
    pub fn resolve_type(&self, request: Inject) -> DiResult<Option<TypeKey>> {
        self.resolve_type_in(&InjectContext::root(self.clone(), request))
    }

    /// Concrete types of every provider matching the request.
    pub fn resolve_type_all(&self, request: Inject) -> DiResult<Vec<TypeKey>> {
        let ctx = InjectContext::root(self.clone(), request);
        Ok(self
            .provider_matches(&ctx)?
            .iter()
            .filter_map(|pair| pair.info.provider.instance_type(&ctx))
            .collect())
    }

    fn warn_if_installing(&self, ctx: &InjectContext<'_>) {
        if self.inner.settings.warn_on_install_resolve
            && self.is_installing()
            && !self.inner.install_warned.swap(true, Ordering::SeqCst)
        {
            tracing::warn!(
                container = self.id(),
                contract = %ctx.key(),
                "resolved while installers are still running; bindings installed afterwards are not visible to it"
            );
        }
    }
}
