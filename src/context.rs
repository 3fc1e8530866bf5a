//! Resolution requests and the context chain handed to providers.

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::contract::{Contract, ContractKey, Identifier, TypeKey};
use crate::error::DiResult;
use crate::instance::{erase, AnyArc};
use crate::internal::BoxFutureUnit;
use crate::traits::ResolverCore;

/// Which containers of the hierarchy a request may be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum InjectSource {
    /// The requesting container and all of its ancestors.
    #[default]
    Any,
    /// Only the requesting container.
    Local,
    /// Only the direct parents of the requesting container.
    Parent,
    /// All ancestors, excluding the requesting container.
    AnyParent,
}

/// A resolution request: what is wanted, and how to look for it.
///
/// # Examples
///
/// ```rust
/// use ferrous_hive::{Inject, InjectSource};
///
/// let request = Inject::of::<String>()
///     .with_id("greeting")
///     .from_source(InjectSource::Parent)
///     .optional();
/// assert!(request.is_optional());
/// ```
#[derive(Clone)]
pub struct Inject {
    pub(crate) contract: Contract,
    pub(crate) identifier: Option<Identifier>,
    pub(crate) source: InjectSource,
    pub(crate) optional: bool,
    pub(crate) fallback: Option<AnyArc>,
    pub(crate) name: Option<&'static str>,
}

impl Inject {
    pub fn for_contract(contract: Contract) -> Self {
        Inject {
            contract,
            identifier: None,
            source: InjectSource::Any,
            optional: false,
            fallback: None,
            name: None,
        }
    }

    /// Request for a concrete type or a trait object.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Inject::for_contract(Contract::of::<T>())
    }

    /// Request for an array of every provider of `T`.
    pub fn array_of<T: ?Sized + 'static>() -> Self {
        Inject::for_contract(Contract::array_of(Contract::of::<T>()))
    }

    /// Request for a list of every provider of `T`.
    pub fn list_of<T: ?Sized + 'static>() -> Self {
        Inject::for_contract(Contract::list_of(Contract::of::<T>()))
    }

    /// Request for a deferred handle to `T`.
    pub fn lazy_of<T: ?Sized + 'static>() -> Self {
        Inject::for_contract(Contract::lazy_of(Contract::of::<T>()))
    }

    pub fn with_id(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub(crate) fn with_identifier(mut self, identifier: Option<Identifier>) -> Self {
        self.identifier = identifier;
        self
    }

    pub(crate) fn with_contract(mut self, contract: Contract) -> Self {
        self.contract = contract;
        self
    }

    pub fn from_source(mut self, source: InjectSource) -> Self {
        self.source = source;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub(crate) fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Value returned when an optional request finds nothing. Implies [`Inject::optional`].
    pub fn fallback<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.fallback = Some(erase(value));
        self.optional = true;
        self
    }

    /// Member or parameter name reported in diagnostics.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn source(&self) -> InjectSource {
        self.source
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn fallback_value(&self) -> Option<&AnyArc> {
        self.fallback.as_ref()
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn key(&self) -> ContractKey {
        ContractKey::new(self.contract.clone(), self.identifier.clone())
    }
}

impl fmt::Debug for Inject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("contract", &self.contract)
            .field("identifier", &self.identifier)
            .field("source", &self.source)
            .field("optional", &self.optional)
            .field("has_fallback", &self.fallback.is_some())
            .field("name", &self.name)
            .finish()
    }
}

/// A request in flight, linked to the request that caused it.
///
/// Providers and binding conditions receive the context of the request being
/// served. Walking [`InjectContext::parent`] yields the chain of enclosing
/// requests up to the one the caller made.
pub struct InjectContext<'a> {
    container: Container,
    request: Inject,
    object_type: Option<TypeKey>,
    concrete_identifier: Option<Identifier>,
    parent: Option<&'a InjectContext<'a>>,
}

impl InjectContext<'static> {
    pub(crate) fn root(container: Container, request: Inject) -> Self {
        InjectContext {
            container,
            request,
            object_type: None,
            concrete_identifier: None,
            parent: None,
        }
    }
}

impl<'a> InjectContext<'a> {
    /// Child request issued while serving this one.
    pub(crate) fn spawn<'b>(&'b self, container: &Container, request: Inject) -> InjectContext<'b>
    where
        'a: 'b,
    {
        InjectContext {
            container: container.clone(),
            request,
            object_type: None,
            concrete_identifier: None,
            parent: Some(self),
        }
    }

    /// Same position in the chain, different request.
    pub(crate) fn with_request(&self, request: Inject) -> InjectContext<'a> {
        InjectContext {
            container: self.container.clone(),
            request,
            object_type: self.object_type,
            concrete_identifier: self.concrete_identifier.clone(),
            parent: self.parent,
        }
    }

    pub(crate) fn building(mut self, object_type: TypeKey, concrete_identifier: Option<Identifier>) -> Self {
        self.object_type = Some(object_type);
        self.concrete_identifier = concrete_identifier;
        self
    }

    /// Container that issued this request.
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn request(&self) -> &Inject {
        &self.request
    }

    pub fn contract(&self) -> &Contract {
        &self.request.contract
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.request.identifier.as_ref()
    }

    pub fn source(&self) -> InjectSource {
        self.request.source
    }

    pub fn is_optional(&self) -> bool {
        self.request.optional
    }

    pub fn key(&self) -> ContractKey {
        self.request.key()
    }

    /// Type whose construction issued this request, if any.
    pub fn object_type(&self) -> Option<TypeKey> {
        self.object_type
    }

    /// Identifier of the binding whose construction issued this request.
    pub fn concrete_identifier(&self) -> Option<&Identifier> {
        self.concrete_identifier.as_ref()
    }

    pub fn parent(&self) -> Option<&InjectContext<'a>> {
        self.parent
    }

    /// This context followed by each enclosing one.
    pub fn parents_and_self(&self) -> impl Iterator<Item = &InjectContext<'_>> + '_ {
        let mut next: Option<&InjectContext<'_>> = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent;
            Some(current)
        })
    }

    /// Human readable request chain, innermost request first.
    pub fn request_chain(&self) -> Vec<String> {
        self.parents_and_self().map(InjectContext::describe).collect()
    }

    fn describe(&self) -> String {
        let mut out = self.key().to_string();
        if let Some(name) = self.request.name {
            out = format!("{} ({})", out, name);
        }
        if let Some(object_type) = self.object_type {
            out = format!("{} <- {}", out, object_type);
        }
        out
    }
}

impl ResolverCore for InjectContext<'_> {
    fn resolve_inject(&self, request: Inject) -> DiResult<Option<AnyArc>> {
        let mut child = self.spawn(&self.container, request);
        child.object_type = self.contract().type_key();
        self.container.resolve_in(&child)
    }

    fn resolve_all_inject(&self, request: Inject) -> DiResult<Vec<AnyArc>> {
        let mut child = self.spawn(&self.container, request);
        child.object_type = self.contract().type_key();
        self.container.resolve_all_in(&child)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.container.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.container.push_async_disposer(f);
    }
}

impl fmt::Debug for InjectContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectContext")
            .field("container", &self.container.id())
            .field("request", &self.request)
            .field("object_type", &self.object_type)
            .field("depth", &self.parents_and_self().count())
            .finish()
    }
}

pub(crate) type Condition = Arc<dyn Fn(&InjectContext<'_>) -> bool + Send + Sync>;
