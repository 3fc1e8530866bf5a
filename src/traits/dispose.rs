//! Teardown traits for container-owned resources.

/// Synchronous teardown, run by [`Container::dispose`](crate::Container::dispose).
///
/// Hooks run in reverse registration order.
///
/// # Examples
///
/// ```
/// use ferrous_hive::{Container, Dispose, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Socket {
///     closed: AtomicBool,
/// }
///
/// impl Dispose for Socket {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let container = Container::new();
/// let socket = Arc::new(Socket { closed: AtomicBool::new(false) });
/// container.register_disposer(socket.clone());
///
/// container.dispose();
/// assert!(socket.closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

/// Asynchronous teardown, run by [`Container::dispose_async`](crate::Container::dispose_async)
/// before any synchronous hooks.
///
/// # Examples
///
/// ```
/// use ferrous_hive::AsyncDispose;
/// use async_trait::async_trait;
///
/// struct Connection {
///     id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for Connection {
///     async fn dispose(&self) {
///         let _ = &self.id;
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    async fn dispose(&self);
}
