//! Type descriptors: how the container builds and completes an object.
//!
//! Rust has no runtime reflection, so a type opts into container-driven
//! construction by describing itself: one constructor with its parameter
//! requests, optional injectable members, post-inject hooks, and an optional
//! validation routine. [`Container::instantiate`](crate::Container::instantiate)
//! walks that description.
//!
//! # Examples
//!
//! ```rust
//! use ferrous_hive::{Container, Inject, Injectable, Resolver, TypeDescriptor};
//! use std::sync::Arc;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Client {
//!     config: Arc<Config>,
//!     retries: u32,
//! }
//!
//! impl Injectable for Client {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Client>()
//!             .constructor([Inject::of::<Config>()], |mut args| {
//!                 Ok(Client { config: args.next()?, retries: 0 })
//!             })
//!             .member(Inject::of::<u32>().optional(), |client: &mut Client, retries: Arc<u32>| {
//!                 client.retries = *retries;
//!             })
//!             .build()
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind::<Config>().from_instance(Config { url: "db://local".into() });
//! container.bind::<Client>().to_self();
//!
//! let client = container.resolve::<Client>().unwrap();
//! assert_eq!(client.config.url, "db://local");
//! assert_eq!(client.retries, 0);
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Inject;
use crate::contract::{Contract, TypeKey};
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::{downcast, downcast_trait, erase_arc, erase_trait, is_validation_marker, AnyArc, InstanceList};
use crate::lazy::Lazy;

type ErasedObject = dyn Any + Send + Sync;
type ConstructFn = Arc<dyn Fn(InjectedArgs) -> Result<Box<ErasedObject>, BoxError> + Send + Sync>;
type MemberFn = Arc<dyn Fn(&mut ErasedObject, AnyArc) -> Result<(), BoxError> + Send + Sync>;
type HookFn = Arc<dyn Fn(&mut ErasedObject, InjectedArgs) -> Result<(), BoxError> + Send + Sync>;
type ValidateFn = Arc<dyn Fn(&ErasedObject) -> Result<(), BoxError> + Send + Sync>;

/// A type that describes its own construction to the container.
pub trait Injectable: Send + Sync + Sized + 'static {
    fn descriptor() -> TypeDescriptor;
}

/// Constructor entry of a [`TypeDescriptor`].
#[derive(Clone)]
pub struct ConstructorInfo {
    params: Vec<Inject>,
    construct: ConstructFn,
}

impl ConstructorInfo {
    pub fn params(&self) -> &[Inject] {
        &self.params
    }
}

/// Injectable member entry of a [`TypeDescriptor`].
#[derive(Clone)]
pub struct MemberInfo {
    inject: Inject,
    apply: MemberFn,
}

impl MemberInfo {
    pub fn inject(&self) -> &Inject {
        &self.inject
    }
}

/// Post-inject hook entry of a [`TypeDescriptor`].
#[derive(Clone)]
pub struct HookInfo {
    name: &'static str,
    params: Vec<Inject>,
    invoke: HookFn,
}

impl HookInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Inject] {
        &self.params
    }
}

/// Construction recipe for one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    type_key: TypeKey,
    constructors: Vec<ConstructorInfo>,
    members: Vec<MemberInfo>,
    hooks: Vec<HookInfo>,
    validator: Option<ValidateFn>,
    allow_during_validation: bool,
}

impl TypeDescriptor {
    pub fn builder<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            descriptor: TypeDescriptor {
                type_key: TypeKey::of::<T>(),
                constructors: Vec::new(),
                members: Vec::new(),
                hooks: Vec::new(),
                validator: None,
                allow_during_validation: false,
            },
            _marker: PhantomData,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn hooks(&self) -> &[HookInfo] {
        &self.hooks
    }

    pub fn is_validatable(&self) -> bool {
        self.validator.is_some()
    }

    /// Whether the real constructor runs while the container is validating.
    pub fn constructs_during_validation(&self) -> bool {
        self.allow_during_validation || self.validator.is_some()
    }

    /// Every request this type makes, across constructor, members, and hooks.
    pub fn dependencies(&self) -> impl Iterator<Item = &Inject> + '_ {
        self.constructors
            .iter()
            .flat_map(|ctor| ctor.params.iter())
            .chain(self.members.iter().map(|member| &member.inject))
            .chain(self.hooks.iter().flat_map(|hook| hook.params.iter()))
    }

    pub(crate) fn single_constructor(&self) -> DiResult<&ConstructorInfo> {
        match self.constructors.as_slice() {
            [only] => Ok(only),
            other => Err(DiError::AmbiguousConstructor {
                target: self.type_name(),
                found: other.len(),
            }),
        }
    }

    pub(crate) fn construct(&self, ctor: &ConstructorInfo, args: InjectedArgs) -> DiResult<Box<ErasedObject>> {
        (ctor.construct)(args).map_err(|e| DiError::lift(self.type_name(), e))
    }

    pub(crate) fn apply_member(&self, member: &MemberInfo, object: &mut ErasedObject, value: AnyArc) -> DiResult<()> {
        (member.apply)(object, value).map_err(|e| DiError::lift(self.type_name(), e))
    }

    pub(crate) fn run_hook(&self, hook: &HookInfo, object: &mut ErasedObject, args: InjectedArgs) -> DiResult<()> {
        (hook.invoke)(object, args).map_err(|e| DiError::lift(self.type_name(), e))
    }

    /// Runs the validation routine against a built instance.
    pub(crate) fn validate_instance(&self, instance: &AnyArc) -> DiResult<()> {
        match &self.validator {
            Some(validate) => validate(instance.as_ref()).map_err(|e| match e.downcast::<DiError>() {
                Ok(inner) => *inner,
                Err(other) => DiError::ValidationFailed {
                    target: self.type_name(),
                    source: Arc::from(other),
                },
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.type_key)
            .field("constructors", &self.constructors.len())
            .field("members", &self.members.len())
            .field("hooks", &self.hooks.iter().map(|h| h.name).collect::<Vec<_>>())
            .field("validatable", &self.validator.is_some())
            .finish()
    }
}

/// Typed builder for a [`TypeDescriptor`].
pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    /// Adds a constructor. Declaring more than one makes the type uninstantiable.
    pub fn constructor<F>(mut self, params: impl IntoIterator<Item = Inject>, construct: F) -> Self
    where
        F: Fn(InjectedArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.descriptor.constructors.push(ConstructorInfo {
            params: params.into_iter().collect(),
            construct: Arc::new(move |args| {
                let value = construct(args)?;
                Ok(Box::new(value) as Box<ErasedObject>)
            }),
        });
        self
    }

    /// Member filled from a concrete type after construction.
    ///
    /// An optional request that finds nothing leaves the member untouched.
    pub fn member<V, F>(self, inject: Inject, apply: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) + Send + Sync + 'static,
    {
        self.member_with(inject, move |object, value| {
            apply(object, downcast::<V>(value)?);
            Ok(())
        })
    }

    /// Member filled from a trait object binding.
    pub fn member_trait<V, F>(self, inject: Inject, apply: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) + Send + Sync + 'static,
    {
        self.member_with(inject, move |object, value| {
            apply(object, downcast_trait::<V>(value)?);
            Ok(())
        })
    }

    /// Member filled from every provider of `V`.
    pub fn member_all<V, F>(self, apply: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&mut T, Vec<Arc<V>>) + Send + Sync + 'static,
    {
        self.member_with(Inject::list_of::<V>(), move |object, value| {
            let list = downcast::<InstanceList>(value)?;
            apply(object, list.downcast_all::<V>()?);
            Ok(())
        })
    }

    /// Member holding a deferred handle, resolved on first use.
    pub fn member_lazy<V, F>(self, apply: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Lazy<V>) + Send + Sync + 'static,
    {
        self.member_with(Inject::lazy_of::<V>(), move |object, value| {
            apply(object, Lazy::from_any(value)?);
            Ok(())
        })
    }

    fn member_with<F>(mut self, inject: Inject, apply: F) -> Self
    where
        F: Fn(&mut T, AnyArc) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.descriptor.members.push(MemberInfo {
            inject,
            apply: Arc::new(move |object, value| {
                let object = object
                    .downcast_mut::<T>()
                    .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
                apply(object, value)
            }),
        });
        self
    }

    /// Method invoked after members are filled, in declaration order.
    pub fn post_inject<F>(mut self, name: &'static str, params: impl IntoIterator<Item = Inject>, hook: F) -> Self
    where
        F: Fn(&mut T, InjectedArgs) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.descriptor.hooks.push(HookInfo {
            name,
            params: params.into_iter().collect(),
            invoke: Arc::new(move |object, args| {
                let object = object
                    .downcast_mut::<T>()
                    .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
                hook(object, args)
            }),
        });
        self
    }

    /// Marks the type validatable. Its constructor then runs in validation mode,
    /// with placeholder dependencies read as absent.
    pub fn validatable<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.descriptor.validator = Some(Arc::new(move |object| {
            let object = object
                .downcast_ref::<T>()
                .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
            validate(object)
        }));
        self
    }

    /// Runs the real constructor even in validation mode.
    pub fn allow_during_validation(mut self) -> Self {
        self.descriptor.allow_during_validation = true;
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Injected values handed to a constructor or hook, in declaration order.
///
/// While validating, a dependency that was not really built arrives as a
/// placeholder. Optional reads see it as absent; required reads fail with
/// [`DiError::PlaceholderArgument`].
pub struct InjectedArgs {
    target: &'static str,
    values: VecDeque<Option<AnyArc>>,
    index: usize,
}

impl InjectedArgs {
    pub(crate) fn new(target: &'static str, values: Vec<Option<AnyArc>>) -> Self {
        InjectedArgs {
            target,
            values: values.into(),
            index: 0,
        }
    }

    fn next_slot(&mut self) -> DiResult<(usize, Option<AnyArc>)> {
        let index = self.index;
        self.index += 1;
        let value = self.values.pop_front().ok_or(DiError::MissingArgument {
            target: self.target,
            index,
        })?;
        Ok((index, value))
    }

    fn next_required(&mut self) -> DiResult<AnyArc> {
        match self.next_slot()? {
            (index, Some(value)) if is_validation_marker(&value) => Err(DiError::PlaceholderArgument {
                target: self.target,
                index,
            }),
            (_, Some(value)) => Ok(value),
            (index, None) => Err(DiError::MissingArgument {
                target: self.target,
                index,
            }),
        }
    }

    /// Next raw value; `None` when an optional request found nothing or the value is a placeholder.
    pub fn next_any(&mut self) -> DiResult<Option<AnyArc>> {
        Ok(self.next_slot()?.1.filter(|value| !is_validation_marker(value)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next<V: Send + Sync + 'static>(&mut self) -> DiResult<Arc<V>> {
        downcast::<V>(self.next_required()?)
    }

    pub fn next_optional<V: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<V>>> {
        self.next_any()?.map(downcast::<V>).transpose()
    }

    pub fn next_trait<V: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<V>> {
        downcast_trait::<V>(self.next_required()?)
    }

    pub fn next_optional_trait<V: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<V>>> {
        self.next_any()?.map(downcast_trait::<V>).transpose()
    }

    /// Next value as a list of concrete instances, for array or list parameters.
    pub fn next_all<V: Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<V>>> {
        match self.next_any()? {
            Some(value) => downcast::<InstanceList>(value)?.downcast_all::<V>(),
            None => Ok(Vec::new()),
        }
    }

    pub fn next_all_trait<V: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Vec<Arc<V>>> {
        match self.next_any()? {
            Some(value) => downcast::<InstanceList>(value)?.downcast_all_trait::<V>(),
            None => Ok(Vec::new()),
        }
    }

    pub fn next_lazy<V: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Lazy<V>> {
        Lazy::from_any(self.next_required()?)
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// An explicit argument tagged with the type it satisfies.
#[derive(Clone)]
pub struct TypedValue {
    type_key: TypeKey,
    value: AnyArc,
}

impl TypedValue {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        TypedValue {
            type_key: TypeKey::of::<T>(),
            value: erase_arc(value),
        }
    }

    /// Argument satisfying a trait object parameter.
    pub fn from_trait<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        TypedValue {
            type_key: TypeKey::of::<T>(),
            value: erase_trait(value),
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedValue").field(&self.type_key).finish()
    }
}

/// Explicit arguments supplied to a construction.
///
/// Each constructor parameter or member consumes the first remaining argument
/// whose type matches its contract exactly, before falling back to
/// resolution. Anything left over afterwards is an error.
#[derive(Clone, Default, Debug)]
pub struct ExtraArgs {
    values: Vec<TypedValue>,
}

impl ExtraArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.push(TypedValue::new(value));
        self
    }

    pub fn push(&mut self, value: TypedValue) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn take_for(&mut self, contract: &Contract) -> Option<AnyArc> {
        let wanted = contract.type_key()?;
        let position = self.values.iter().position(|arg| arg.type_key == wanted)?;
        Some(self.values.remove(position).value)
    }

    pub(crate) fn type_names(&self) -> Vec<&'static str> {
        self.values.iter().map(|arg| arg.type_key.name()).collect()
    }
}

impl FromIterator<TypedValue> for ExtraArgs {
    fn from_iter<I: IntoIterator<Item = TypedValue>>(iter: I) -> Self {
        ExtraArgs {
            values: iter.into_iter().collect(),
        }
    }
}
