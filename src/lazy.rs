//! Deferred resolution handles.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::WeakContainer;
use crate::context::Inject;
use crate::error::{DiError, DiResult};
use crate::instance::{downcast, downcast_trait, AnyArc};
use crate::traits::ResolverCore;

/// Type-erased state behind a [`Lazy`] handle.
///
/// Holds the request it was created for and resolves it against the issuing
/// container on first access. The result is cached for every later access.
pub struct LazyInstance {
    container: WeakContainer,
    request: Inject,
    value: OnceCell<Option<AnyArc>>,
}

impl LazyInstance {
    pub(crate) fn new(container: WeakContainer, request: Inject) -> Self {
        LazyInstance {
            container,
            request,
            value: OnceCell::new(),
        }
    }

    pub fn request(&self) -> &Inject {
        &self.request
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// Resolves on first call; `None` only for optional requests.
    pub fn value(&self) -> DiResult<Option<AnyArc>> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }
        let container = self.container.upgrade()?;
        let resolved = container.resolve_inject(self.request.clone())?;
        Ok(self.value.get_or_init(move || resolved).clone())
    }

    fn required(&self) -> DiResult<AnyArc> {
        self.value()?.ok_or_else(|| DiError::MissingBinding {
            contract: self.request.key().to_string(),
            chain: vec![self.request.key().to_string()],
        })
    }

    pub(crate) fn validate(&self) -> DiResult<()> {
        self.value().map(|_| ())
    }
}

impl fmt::Debug for LazyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInstance")
            .field("request", &self.request)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Handle that resolves `T` on first use instead of at injection time.
///
/// Lazies break construction-time cycles: two types may hold lazies of one
/// another, as long as neither dereferences its lazy while being built.
///
/// # Examples
///
/// ```rust
/// use ferrous_hive::{Container, Resolver};
///
/// let container = Container::new();
/// container.bind::<String>().from_instance("late".to_string());
///
/// let lazy = container.resolve_lazy::<String>().unwrap();
/// assert!(!lazy.is_resolved());
/// assert_eq!(lazy.get().unwrap().as_str(), "late");
/// assert!(lazy.is_resolved());
/// ```
pub struct Lazy<T: ?Sized> {
    inner: Arc<LazyInstance>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Lazy<T> {
    pub(crate) fn from_any(value: AnyArc) -> DiResult<Self> {
        let inner = value
            .downcast::<LazyInstance>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<Lazy<T>>()))?;
        Ok(Lazy::from(inner))
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.is_resolved()
    }
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub fn get(&self) -> DiResult<Arc<T>> {
        downcast(self.inner.required()?)
    }

    pub fn try_get(&self) -> DiResult<Option<Arc<T>>> {
        self.inner.value()?.map(downcast).transpose()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    /// Resolves a lazy of a trait object, e.g. `Lazy<dyn Logger>`.
    pub fn get_trait(&self) -> DiResult<Arc<T>> {
        downcast_trait(self.inner.required()?)
    }
}

/// Wraps an erased handle. The element type is checked on access, not here.
impl<T: ?Sized> From<Arc<LazyInstance>> for Lazy<T> {
    fn from(inner: Arc<LazyInstance>) -> Self {
        Lazy {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Lazy {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("type", &std::any::type_name::<T>())
            .field("resolved", &self.inner.is_resolved())
            .finish()
    }
}
