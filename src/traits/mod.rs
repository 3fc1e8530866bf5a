//! Resolution and teardown traits.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
