//! LIFO teardown hooks owned by a container.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by async teardown hooks.
pub type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Teardown hooks, executed newest first.
///
/// Async hooks run before sync hooks when disposing asynchronously.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    pub(crate) fn push_async(&mut self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.asyncs.push(f);
    }

    /// Moves every hook out, leaving the bag empty so hooks can re-register.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    /// Moves the sync hooks out, leaving async hooks in place.
    pub(crate) fn take_sync(&mut self) -> DisposeBag {
        DisposeBag {
            sync: std::mem::take(&mut self.sync),
            asyncs: Vec::new(),
        }
    }

    pub(crate) fn run_sync(mut self) {
        while let Some(f) = self.sync.pop() {
            f();
        }
    }

    pub(crate) async fn run_async(mut self) {
        while let Some(f) = self.asyncs.pop() {
            f().await;
        }
        self.run_sync();
    }

    pub(crate) fn len(&self) -> usize {
        self.sync.len() + self.asyncs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}
