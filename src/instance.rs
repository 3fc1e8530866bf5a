//! Type-erased instance storage.
//!
//! Concrete instances are stored as `Arc<T>` erased to [`AnyArc`]. Trait
//! objects cannot be erased directly, so they are stored one level deeper as
//! `Arc<Arc<dyn Trait>>` and unwrapped again on the way out.

use std::any::Any;
use std::sync::Arc;

use crate::contract::TypeKey;
use crate::error::{DiError, DiResult};

/// Type-erased shared instance.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Value produced for array and list contracts.
#[derive(Clone, Default)]
pub struct InstanceList {
    items: Vec<AnyArc>,
}

impl InstanceList {
    pub fn new(items: Vec<AnyArc>) -> Self {
        InstanceList { items }
    }

    pub fn items(&self) -> &[AnyArc] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Downcasts every real item to a concrete type. Placeholders are skipped.
    pub fn downcast_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.real_items().map(downcast::<T>).collect()
    }

    /// Downcasts every real item to a trait object. Placeholders are skipped.
    pub fn downcast_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.real_items().map(downcast_trait::<T>).collect()
    }

    fn real_items(&self) -> impl Iterator<Item = AnyArc> + '_ {
        self.items.iter().filter(|item| !is_validation_marker(item)).cloned()
    }
}

impl std::fmt::Debug for InstanceList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceList").field("len", &self.items.len()).finish()
    }
}

/// Placeholder produced instead of a real object while validating.
///
/// Validation walks the whole object graph without running constructors that
/// have not opted in; their slots are filled with a marker naming the type
/// that would have been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMarker {
    marked: TypeKey,
    instantiate_failed: bool,
}

impl ValidationMarker {
    pub fn new(marked: TypeKey, instantiate_failed: bool) -> Self {
        ValidationMarker {
            marked,
            instantiate_failed,
        }
    }

    pub fn marked_type(&self) -> TypeKey {
        self.marked
    }

    pub fn instantiate_failed(&self) -> bool {
        self.instantiate_failed
    }
}

/// Returns true when `value` is a [`ValidationMarker`].
pub fn is_validation_marker(value: &AnyArc) -> bool {
    value.is::<ValidationMarker>()
}

pub(crate) fn erase<T: Send + Sync + 'static>(value: T) -> AnyArc {
    Arc::new(value)
}

pub(crate) fn erase_arc<T: Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    value
}

pub(crate) fn erase_trait<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

pub(crate) fn downcast<T: Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
