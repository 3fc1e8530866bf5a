//! Contract identities used as lookup keys.
//!
//! A [`Contract`] names what a consumer asks for: a concrete type, a trait
//! object, an array or list of another contract, a lazy handle, or an open
//! generic definition that any closed instantiation can fall back to.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime identity of a Rust type, paired with its name for diagnostics.
///
/// Equality and hashing use only the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`, which may be a trait object such as `dyn Logger`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths, e.g. `Vec<Foo>` for `alloc::vec::Vec<app::Foo>`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                    out.push_str(&segment);
                    segment.clear();
                    out.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        out.push_str(&segment);
        out
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then(self.id.cmp(&other.id))
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Generic definition marker for list contracts (`List<T>`).
pub enum ListDefinition {}

/// Generic definition marker for lazy contracts (`Lazy<T>`).
pub enum LazyDefinition {}

/// A requested or provided type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Contract {
    /// A concrete type or trait object.
    Type(TypeKey),
    /// An array of some element contract.
    Array(Arc<Contract>),
    /// A generic definition closed over its arguments.
    Generic(TypeKey, Arc<[Contract]>),
    /// A generic definition with unbound arguments.
    Open(TypeKey),
}

impl Contract {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Contract::Type(TypeKey::of::<T>())
    }

    pub fn array_of(element: Contract) -> Self {
        Contract::Array(Arc::new(element))
    }

    pub fn list_of(element: Contract) -> Self {
        Contract::generic(TypeKey::of::<ListDefinition>(), [element])
    }

    pub fn lazy_of(element: Contract) -> Self {
        Contract::generic(TypeKey::of::<LazyDefinition>(), [element])
    }

    pub fn generic(definition: TypeKey, arguments: impl IntoIterator<Item = Contract>) -> Self {
        Contract::Generic(definition, arguments.into_iter().collect())
    }

    pub fn open(definition: TypeKey) -> Self {
        Contract::Open(definition)
    }

    /// The concrete type key, when this contract names a plain type.
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Contract::Type(key) => Some(*key),
            _ => None,
        }
    }

    /// Open definition of a closed generic contract.
    pub fn open_definition(&self) -> Option<Contract> {
        match self {
            Contract::Generic(definition, _) => Some(Contract::Open(*definition)),
            _ => None,
        }
    }

    pub fn array_element(&self) -> Option<&Contract> {
        match self {
            Contract::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn list_element(&self) -> Option<&Contract> {
        self.single_argument_of(TypeKey::of::<ListDefinition>())
    }

    pub fn lazy_element(&self) -> Option<&Contract> {
        self.single_argument_of(TypeKey::of::<LazyDefinition>())
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy_element().is_some()
    }

    fn single_argument_of(&self, definition: TypeKey) -> Option<&Contract> {
        match self {
            Contract::Generic(def, args) if *def == definition && args.len() == 1 => args.first(),
            _ => None,
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contract::Type(key) => write!(f, "{}", key),
            Contract::Array(element) => write!(f, "[{}]", element),
            Contract::Generic(definition, args) => {
                if *definition == TypeKey::of::<ListDefinition>() {
                    f.write_str("List")?;
                } else if *definition == TypeKey::of::<LazyDefinition>() {
                    f.write_str("Lazy")?;
                } else {
                    write!(f, "{}", definition)?;
                }
                f.write_str("<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            Contract::Open(definition) => write!(f, "{}<_>", definition),
        }
    }
}

/// Optional discriminator distinguishing several bindings of one contract.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Identifier {
    Name(Arc<str>),
    Index(i64),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Name(name) => write!(f, "\"{}\"", name),
            Identifier::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(Arc::from(name))
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::Name(Arc::from(name))
    }
}

impl From<i64> for Identifier {
    fn from(index: i64) -> Self {
        Identifier::Index(index)
    }
}

impl From<i32> for Identifier {
    fn from(index: i32) -> Self {
        Identifier::Index(i64::from(index))
    }
}

/// Registry key: a contract plus its optional identifier.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContractKey {
    pub contract: Contract,
    pub identifier: Option<Identifier>,
}

impl ContractKey {
    pub fn new(contract: Contract, identifier: Option<Identifier>) -> Self {
        ContractKey {
            contract,
            identifier,
        }
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        ContractKey::new(Contract::of::<T>(), None)
    }

    pub fn with_id(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{} (id: {})", self.contract, id),
            None => write!(f, "{}", self.contract),
        }
    }
}
