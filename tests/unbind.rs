use ferrous_hive::{Container, ContractKey, DiError, Injectable, Resolver, TypeDescriptor};
use std::sync::Arc;

trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Gzip;
struct Brotli;

impl Codec for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }
}

impl Codec for Brotli {
    fn name(&self) -> &'static str {
        "brotli"
    }
}

impl Injectable for Gzip {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Gzip>().constructor([], |_| Ok(Gzip)).build()
    }
}

impl Injectable for Brotli {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Brotli>().constructor([], |_| Ok(Brotli)).build()
    }
}

#[test]
fn test_unbind_removes_every_provider() {
    let container = Container::new();
    container.bind::<u8>().from_instance(1);
    container.bind::<u8>().from_instance(2);

    assert!(container.unbind::<u8>().unwrap());
    assert!(matches!(container.resolve::<u8>(), Err(DiError::MissingBinding { .. })));
    assert!(!container.unbind::<u8>().unwrap());
}

#[test]
fn test_unbind_id_leaves_other_identifiers() {
    let container = Container::new();
    container.bind::<u8>().from_instance(1);
    container.bind::<u8>().with_id("spare").from_instance(2);

    assert!(container.unbind_id::<u8>("spare").unwrap());
    assert_eq!(*container.resolve::<u8>().unwrap(), 1);
    assert!(container.try_resolve_id::<u8>("spare").unwrap().is_none());
}

#[test]
fn test_unbind_concrete_filters_by_product() {
    let container = Container::new();
    container
        .bind_trait::<dyn Codec>()
        .to::<Gzip, _>(|codec| codec as Arc<dyn Codec>);
    container
        .bind_trait::<dyn Codec>()
        .to::<Brotli, _>(|codec| codec as Arc<dyn Codec>);

    assert!(container.unbind_concrete::<dyn Codec, Gzip>().unwrap());
    assert_eq!(container.resolve_trait::<dyn Codec>().unwrap().name(), "brotli");
    assert!(!container.unbind_concrete::<dyn Codec, Gzip>().unwrap());
}

#[test]
fn test_unbind_all_keeps_builtin_bindings() {
    let container = Container::new();
    container.bind::<u8>().from_instance(1);
    container.bind::<String>().from_instance("gone".to_string());

    container.unbind_all().unwrap();
    assert!(container.try_resolve::<u8>().unwrap().is_none());

    let itself = container.resolve::<Container>().unwrap();
    assert!(itself.ptr_eq(&container));
    container.bind::<u8>().from_instance(9);
    assert_eq!(*container.resolve_lazy::<u8>().unwrap().get().unwrap(), 9);
}

#[test]
fn test_rebind_replaces_binding() {
    let container = Container::new();
    container.bind::<u8>().from_instance(1);
    container.rebind::<u8>().unwrap().from_instance(2);
    assert_eq!(*container.resolve::<u8>().unwrap(), 2);

    container.bind::<u8>().with_id(3).from_instance(30);
    container.rebind_id::<u8>(3).unwrap().from_instance(31);
    assert_eq!(*container.resolve_id::<u8>(3).unwrap(), 31);

    container
        .bind_trait::<dyn Codec>()
        .to::<Gzip, _>(|codec| codec as Arc<dyn Codec>);
    container
        .rebind_trait::<dyn Codec>()
        .unwrap()
        .to::<Brotli, _>(|codec| codec as Arc<dyn Codec>);
    assert_eq!(container.resolve_trait::<dyn Codec>().unwrap().name(), "brotli");
}

#[test]
fn test_unbind_in_child_does_not_touch_parent() {
    let root = Container::new();
    root.bind::<u8>().from_instance(5);
    let child = root.create_sub_container().unwrap();

    assert!(!child.unbind::<u8>().unwrap());
    assert_eq!(*child.resolve::<u8>().unwrap(), 5);
}

#[test]
fn test_has_binding_queries() {
    let root = Container::new();
    root.bind::<u8>().from_instance(5);
    root.bind::<u16>().with_id("port").from_instance(8080);
    let child = root.create_sub_container().unwrap();

    assert!(child.has_binding::<u8>().unwrap());
    assert!(child.has_binding_id::<u16>("port").unwrap());
    assert!(!child.has_binding::<u16>().unwrap());
    assert!(!root.has_binding::<u32>().unwrap());
}

#[test]
fn test_all_contracts_lists_local_keys() {
    let root = Container::new();
    root.bind::<u64>().from_instance(1);
    let child = root.create_sub_container().unwrap();
    child.bind::<u8>().from_instance(1);
    child.bind::<u8>().with_id("primary").from_instance(2);

    let contracts = child.all_contracts().unwrap();
    assert!(contracts.contains(&ContractKey::of::<u8>()));
    assert!(contracts.contains(&ContractKey::of::<u8>().with_id("primary")));
    assert!(contracts.contains(&ContractKey::of::<Container>()));
    assert!(!contracts.contains(&ContractKey::of::<u64>()));

    let plain = contracts.iter().position(|k| *k == ContractKey::of::<u8>()).unwrap();
    let named = contracts
        .iter()
        .position(|k| *k == ContractKey::of::<u8>().with_id("primary"))
        .unwrap();
    assert!(plain < named);
}
