//! # ferrous-hive
//!
//! Hierarchical dependency injection for Rust: containers with parents, a
//! contract-keyed binding registry, and a resolution engine that builds
//! objects from type descriptors.
//!
//! ## Features
//!
//! - **Container hierarchy**: sub-containers see their ancestors' bindings and shadow them locally
//! - **Conditional bindings**: identifiers, `when` predicates, and injection-target filters
//! - **Collections**: resolve every binding of a contract as a `Vec` or list
//! - **Lazies**: deferred handles that break construction-time cycles
//! - **Circular dependency detection**: reported with the full request chain
//! - **Validation mode**: walk the graph without building objects and collect every error
//! - **Memory pools**: reusable items with configurable growth, bindable as providers
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_hive::{Container, Inject, Injectable, Resolver, TypeDescriptor};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<UserService>()
//!             .constructor([Inject::of::<Database>()], |mut args| Ok(UserService { db: args.next()? }))
//!             .build()
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind::<Database>().from_instance(Database { url: "postgres://localhost".into() });
//! container.bind::<UserService>().to_self().as_cached();
//!
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! assert!(Arc::ptr_eq(&users, &container.resolve::<UserService>().unwrap()));
//! ```
//!
//! ## Trait Bindings
//!
//! ```rust
//! use ferrous_hive::{Container, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn prefix(&self) -> &str;
//! }
//!
//! struct Console;
//! impl Logger for Console {
//!     fn prefix(&self) -> &str {
//!         "console"
//!     }
//! }
//!
//! struct File;
//! impl Logger for File {
//!     fn prefix(&self) -> &str {
//!         "file"
//!     }
//! }
//!
//! let container = Container::new();
//! container.bind_trait::<dyn Logger>().from_instance(Arc::new(Console));
//! container.bind_trait::<dyn Logger>().from_instance(Arc::new(File));
//!
//! let loggers = container.resolve_all_trait::<dyn Logger>().unwrap();
//! let prefixes: Vec<_> = loggers.iter().map(|l| l.prefix().to_string()).collect();
//! assert_eq!(prefixes, ["console", "file"]);
//! ```
//!
//! ## Sub-containers
//!
//! ```rust
//! use ferrous_hive::{Container, Resolver};
//!
//! let root = Container::new();
//! root.bind::<u32>().from_instance(1).copy_into_all_sub_containers();
//!
//! let child = root.create_sub_container().unwrap();
//! let grandchild = child.create_sub_container().unwrap();
//! assert_eq!(*grandchild.resolve::<u32>().unwrap(), 1);
//! ```

pub mod binding;
pub mod container;
pub mod context;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod installer;
pub mod instance;
pub mod lazy;
pub mod observer;
pub mod pool;
pub mod provider;
pub mod settings;
pub mod traits;

mod internal;
mod registry;

pub use binding::{BindInfo, BindScope, Binder, BindingInheritance, ContractBinder, TraitBinder};
pub use container::{Container, MAX_VALIDATION_ERRORS};
pub use context::{Inject, InjectContext, InjectSource};
pub use contract::{Contract, ContractKey, Identifier, LazyDefinition, ListDefinition, TypeKey};
pub use descriptor::{
    ConstructorInfo, DescriptorBuilder, ExtraArgs, HookInfo, InjectedArgs, Injectable, MemberInfo, TypeDescriptor,
    TypedValue,
};
pub use error::{BoxError, DiError, DiResult};
pub use installer::Installer;
pub use instance::{is_validation_marker, AnyArc, InstanceList, ValidationMarker};
pub use internal::BoxFutureUnit;
pub use lazy::{Lazy, LazyInstance};
pub use observer::{ContainerObserver, TracingObserver};
pub use pool::{
    InstanceFactory, MemoryPool, NoHooks, PoolExpandMethod, PoolHooks, PoolRegistry, PoolSettings, PoolStats,
    PoolStatsSource,
};
pub use provider::{Provider, ProviderId, ProviderKind};
pub use settings::ContainerSettings;
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};
