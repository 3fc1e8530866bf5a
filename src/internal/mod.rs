//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;
pub(crate) mod sync;

pub(crate) use circular::{InFlightGuard, LookupId};
pub use dispose_bag::BoxFutureUnit;
pub(crate) use dispose_bag::DisposeBag;

#[cfg(feature = "ahash")]
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V>;
