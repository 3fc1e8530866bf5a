//! Error types for container, resolution, and pool operations.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by user-supplied constructors, factories, and hooks.
///
/// Any error type converts into this with `?`, including [`DiError`] itself,
/// which the container unwraps again so nested resolution failures keep
/// their original variant.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shared form of a collaborator error, kept cloneable inside [`DiError`].
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Dependency resolution and lifecycle errors.
///
/// Resolution failures carry the request chain that led to them, ordered
/// innermost request first, so the caller can see which object graph
/// produced the failing lookup.
///
/// # Examples
///
/// ```rust
/// use ferrous_hive::{Container, DiError, Resolver};
///
/// struct Unbound;
///
/// let container = Container::new();
/// match container.resolve::<Unbound>() {
///     Err(DiError::MissingBinding { contract, .. }) => {
///         assert!(contract.ends_with("Unbound"));
///     }
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No provider matched a required request.
    #[error("unable to resolve {contract}\nobject graph:\n{}", render_chain(.chain))]
    MissingBinding { contract: String, chain: Vec<String> },

    /// Two equally preferred providers matched a single-value request.
    #[error("found multiple matches for {contract} when only one was expected\nobject graph:\n{}", render_chain(.chain))]
    AmbiguousBinding { contract: String, chain: Vec<String> },

    /// A single-value request matched a provider yielding zero or several instances.
    #[error("provider for {contract} returned {found} instances when one was expected\nobject graph:\n{}", render_chain(.chain))]
    ProviderArityMismatch {
        contract: String,
        found: usize,
        chain: Vec<String>,
    },

    /// The same provider was re-entered past the permitted depth for one request.
    #[error("circular dependency detected\nobject graph:\n{}", render_chain(.chain))]
    CircularDependency { chain: Vec<String> },

    /// Explicit construction arguments were supplied but never consumed.
    #[error("passed unnecessary arguments to {target}: {}", .arguments.join(", "))]
    UnconsumedArguments {
        target: &'static str,
        arguments: Vec<&'static str>,
        chain: Vec<String>,
    },

    /// A described type exposes zero or several constructors.
    #[error("{target} must declare exactly one constructor, found {found}")]
    AmbiguousConstructor { target: &'static str, found: usize },

    /// A pool with expansion disabled ran out of inactive items.
    #[error("pool of {item} exhausted at fixed size {size}")]
    PoolExhausted { item: &'static str, size: usize },

    /// A pool with expansion disabled was asked to resize.
    #[error("pool of {item} cannot be resized from fixed size {size}")]
    PoolExceededFixedSize { item: &'static str, size: usize },

    /// An item was released to a pool that does not hold it as active.
    #[error("item of type {item} released to pool twice")]
    DoubleRelease { item: &'static str },

    /// The pool's instance factory failed.
    #[error("pool of {item} failed to allocate a new item: {source}")]
    PoolAllocationFailed {
        item: &'static str,
        source: SharedError,
    },

    /// A factory-backed provider failed to build its product.
    #[error("factory for {item} failed: {source}")]
    FactoryCreationFailed {
        item: &'static str,
        source: SharedError,
    },

    /// A constructor, member setter, or post-inject hook failed.
    #[error("failed to construct {target}: {source}")]
    ConstructionFailed {
        target: &'static str,
        source: SharedError,
    },

    /// A validatable instance reported itself invalid.
    #[error("validation of {target} failed: {source}")]
    ValidationFailed {
        target: &'static str,
        source: SharedError,
    },

    /// A stored value could not be downcast to the requested type.
    #[error("type mismatch for: {0}")]
    TypeMismatch(&'static str),

    /// A constructor asked for more injected arguments than were declared.
    #[error("{target} requested argument #{index} which was not declared")]
    MissingArgument { target: &'static str, index: usize },

    /// A type built during validation required a dependency that was only a placeholder.
    #[error("{target} requires argument #{index}, which is a placeholder during validation; read it with next_optional")]
    PlaceholderArgument { target: &'static str, index: usize },

    /// A binding was finalized without a complete provider description.
    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    /// A provider outlived the container that owns it.
    #[error("owning container was dropped")]
    ContainerDropped,

    /// `validate` was called on a container not created in validation mode.
    #[error("container is not in validation mode")]
    NotValidating,

    /// Resolution nested deeper than the per-thread limit.
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// Aggregated failures collected by a validation pass.
    #[error("validation found {} error(s):\n{}", .0.len(), render_errors(.0))]
    Validation(Vec<DiError>),
}

impl DiError {
    /// Request chain captured with the failure, innermost first.
    pub fn chain(&self) -> &[String] {
        match self {
            DiError::MissingBinding { chain, .. }
            | DiError::AmbiguousBinding { chain, .. }
            | DiError::ProviderArityMismatch { chain, .. }
            | DiError::CircularDependency { chain }
            | DiError::UnconsumedArguments { chain, .. } => chain,
            _ => &[],
        }
    }

    /// Returns true for resolution failures caused by a missing provider.
    pub fn is_missing_binding(&self) -> bool {
        matches!(self, DiError::MissingBinding { .. })
    }

    /// Converts a user-supplied error, keeping nested `DiError`s intact.
    pub(crate) fn lift(target: &'static str, error: BoxError) -> DiError {
        match error.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::ConstructionFailed {
                target,
                source: Arc::from(other),
            },
        }
    }

    pub(crate) fn factory(item: &'static str, error: BoxError) -> DiError {
        DiError::FactoryCreationFailed {
            item,
            source: Arc::from(error),
        }
    }

    pub(crate) fn allocation(item: &'static str, error: BoxError) -> DiError {
        DiError::PoolAllocationFailed {
            item,
            source: Arc::from(error),
        }
    }
}

fn render_chain(chain: &[String]) -> String {
    chain
        .iter()
        .map(|entry| format!("    {}", entry))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_errors(errors: &[DiError]) -> String {
    errors
        .iter()
        .map(|error| format!("  - {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
