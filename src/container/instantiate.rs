use std::any::Any;
use std::sync::Arc;

use crate::context::{Inject, InjectContext};
use crate::contract::{Contract, Identifier};
use crate::descriptor::{ExtraArgs, InjectedArgs, Injectable, TypeDescriptor};
use crate::error::{DiError, DiResult};
use crate::instance::{downcast, erase, is_validation_marker, AnyArc, ValidationMarker};

use super::Container;

impl Container {
    /// Builds a new `T` from its descriptor, resolving every dependency.
    pub fn instantiate<T: Injectable>(&self) -> DiResult<Arc<T>> {
        self.instantiate_with(ExtraArgs::new())
    }

    /// Builds a new `T`, feeding `args` to matching parameters before resolving.
    ///
    /// Every extra argument must be consumed. In validation mode the result
    /// is usually a placeholder; use [`Container::instantiate_descriptor`]
    /// there instead.
    pub fn instantiate_with<T: Injectable>(&self, args: ExtraArgs) -> DiResult<Arc<T>> {
        downcast(self.instantiate_descriptor(&T::descriptor(), args)?)
    }

    /// Type-erased [`Container::instantiate_with`].
    pub fn instantiate_descriptor(&self, descriptor: &TypeDescriptor, args: ExtraArgs) -> DiResult<AnyArc> {
        self.instantiate_for(descriptor, args, None, None)
    }

    /// Builds on behalf of a provider serving `parent`.
    ///
    /// In validation mode failures are recorded and a failed placeholder is
    /// returned, so one run reports every broken dependency.
    pub(crate) fn instantiate_for(
        &self,
        descriptor: &TypeDescriptor,
        args: ExtraArgs,
        parent: Option<&InjectContext<'_>>,
        concrete_id: Option<Identifier>,
    ) -> DiResult<AnyArc> {
        let result = self.build_object(descriptor, args, parent, concrete_id);
        match result {
            Err(error) if self.is_validating() => {
                self.record_validation_error(error);
                Ok(erase(ValidationMarker::new(descriptor.type_key(), true)))
            }
            other => other,
        }
    }

    fn build_object(
        &self,
        descriptor: &TypeDescriptor,
        mut args: ExtraArgs,
        parent: Option<&InjectContext<'_>>,
        concrete_id: Option<Identifier>,
    ) -> DiResult<AnyArc> {
        self.flush()?;
        let ctor = descriptor.single_constructor()?;

        let root;
        let object_ctx = match parent {
            Some(ctx) => ctx,
            None => {
                root = InjectContext::root(
                    self.clone(),
                    Inject::for_contract(Contract::Type(descriptor.type_key())),
                );
                &root
            }
        };
        let target = descriptor.type_name();

        // Placeholder arguments reach the constructor as absent values.
        let values = self.resolve_params(descriptor, ctor.params(), &mut args, object_ctx, &concrete_id)?;
        let dry_run = self.is_validating() && !descriptor.constructs_during_validation();

        let mut object: Box<dyn Any + Send + Sync> = if dry_run {
            Box::new(ValidationMarker::new(descriptor.type_key(), false))
        } else {
            descriptor.construct(ctor, InjectedArgs::new(target, values))?
        };

        for member in descriptor.members() {
            let value = match args.take_for(member.inject().contract()) {
                Some(value) => Some(value),
                None => self.resolve_param(descriptor, member.inject(), object_ctx, &concrete_id)?,
            };
            match value {
                Some(value) if !dry_run && !is_validation_marker(&value) => {
                    descriptor.apply_member(member, object.as_mut(), value)?
                }
                _ => {}
            }
        }

        for hook in descriptor.hooks() {
            let values = self.resolve_params(descriptor, hook.params(), &mut args, object_ctx, &concrete_id)?;
            if !dry_run {
                tracing::trace!(target_type = target, hook = hook.name(), "post-inject hook");
                descriptor.run_hook(hook, object.as_mut(), InjectedArgs::new(target, values))?;
            }
        }

        if !args.is_empty() {
            return Err(DiError::UnconsumedArguments {
                target,
                arguments: args.type_names(),
                chain: object_ctx.request_chain(),
            });
        }
        Ok(Arc::from(object))
    }

    /// Values for `params` in declaration order.
    fn resolve_params(
        &self,
        descriptor: &TypeDescriptor,
        params: &[Inject],
        args: &mut ExtraArgs,
        object_ctx: &InjectContext<'_>,
        concrete_id: &Option<Identifier>,
    ) -> DiResult<Vec<Option<AnyArc>>> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            let value = match args.take_for(param.contract()) {
                Some(value) => Some(value),
                None => self.resolve_param(descriptor, param, object_ctx, concrete_id)?,
            };
            values.push(value);
        }
        Ok(values)
    }

    fn resolve_param(
        &self,
        descriptor: &TypeDescriptor,
        request: &Inject,
        object_ctx: &InjectContext<'_>,
        concrete_id: &Option<Identifier>,
    ) -> DiResult<Option<AnyArc>> {
        let ctx = object_ctx
            .spawn(self, request.clone())
            .building(descriptor.type_key(), concrete_id.clone());
        self.resolve_in(&ctx)
    }
}
