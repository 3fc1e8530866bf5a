//! Lock primitives, backed by `parking_lot` when the `parking-lot` feature is on.
//!
//! Both variants expose the same non-poisoning surface: `lock`, `read` and
//! `write` return guards directly.

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, RwLock};

#[cfg(not(feature = "parking-lot"))]
pub(crate) use self::std_locks::{Mutex, RwLock};

#[cfg(not(feature = "parking-lot"))]
mod std_locks {
    use std::sync::{self, PoisonError};

    #[derive(Debug, Default)]
    pub(crate) struct Mutex<T>(sync::Mutex<T>);

    impl<T> Mutex<T> {
        pub(crate) const fn new(value: T) -> Self {
            Self(sync::Mutex::new(value))
        }

        pub(crate) fn lock(&self) -> sync::MutexGuard<'_, T> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct RwLock<T>(sync::RwLock<T>);

    impl<T> RwLock<T> {
        pub(crate) const fn new(value: T) -> Self {
            Self(sync::RwLock::new(value))
        }

        pub(crate) fn read(&self) -> sync::RwLockReadGuard<'_, T> {
            self.0.read().unwrap_or_else(PoisonError::into_inner)
        }

        pub(crate) fn write(&self) -> sync::RwLockWriteGuard<'_, T> {
            self.0.write().unwrap_or_else(PoisonError::into_inner)
        }
    }
}
