use ferrous_hive::{
    AnyArc, BoxError, Container, Contract, DiError, Inject, InjectContext, InstanceList, Resolver, ResolverCore,
    TypeKey,
};
use std::sync::Arc;

trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Audio;
struct Video;

impl Plugin for Audio {
    fn name(&self) -> &'static str {
        "audio"
    }
}

impl Plugin for Video {
    fn name(&self) -> &'static str {
        "video"
    }
}

#[test]
fn test_resolve_all_in_registration_order() {
    let container = Container::new();
    container.bind::<u16>().from_instance(1);
    container.bind::<u16>().from_instance(2);
    container.bind::<u16>().from_instance(3);

    let values: Vec<u16> = container.resolve_all::<u16>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(values, [1, 2, 3]);
}

#[test]
fn test_resolve_all_empty_when_unbound() {
    let container = Container::new();
    assert!(container.resolve_all::<u16>().unwrap().is_empty());
}

#[test]
fn test_resolve_all_respects_identifier() {
    let container = Container::new();
    container.bind::<u16>().from_instance(1);
    container.bind::<u16>().with_id("tagged").from_instance(2);
    container.bind::<u16>().with_id("tagged").from_instance(3);

    let tagged: Vec<u16> = container.resolve_all_id::<u16>("tagged").unwrap().iter().map(|v| **v).collect();
    assert_eq!(tagged, [2, 3]);
    assert_eq!(container.resolve_all::<u16>().unwrap().len(), 1);
}

#[test]
fn test_resolve_all_trait_objects() {
    let container = Container::new();
    container.bind_trait::<dyn Plugin>().from_instance(Arc::new(Audio));
    container.bind_trait::<dyn Plugin>().from_instance(Arc::new(Video));

    let names: Vec<&str> = container
        .resolve_all_trait::<dyn Plugin>()
        .unwrap()
        .iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(names, ["audio", "video"]);
}

#[test]
fn test_resolve_array_collects_elements() {
    let container = Container::new();
    container.bind::<u16>().from_instance(4);
    container.bind::<u16>().from_instance(5);

    let values: Vec<u16> = container.resolve_array::<u16>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(values, [4, 5]);
}

#[test]
fn test_explicit_array_binding_takes_precedence() {
    let container = Container::new();
    container.bind::<u16>().from_instance(4);

    let explicit: AnyArc = Arc::new(99u16);
    container
        .bind_contract(Contract::array_of(Contract::of::<u16>()))
        .from_any(Arc::new(InstanceList::new(vec![explicit])), TypeKey::of::<InstanceList>());

    let values: Vec<u16> = container.resolve_array::<u16>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(values, [99]);
    // Collecting element providers is unaffected.
    assert_eq!(container.resolve_all::<u16>().unwrap().len(), 1);
}

#[test]
fn test_list_request_collects_across_parents() {
    let root = Container::new();
    root.bind::<u16>().from_instance(1);
    let child = root.create_sub_container().unwrap();
    child.bind::<u16>().from_instance(2);

    let list: Arc<InstanceList> = child.resolve_with(Inject::list_of::<u16>()).unwrap();
    let values: Vec<u16> = list.downcast_all::<u16>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(values, [2, 1]);
}

enum RepositoryDefinition {}

#[test]
fn test_open_generic_binding_serves_closed_requests() {
    let container = Container::new();
    container
        .bind_contract(Contract::open(TypeKey::of::<RepositoryDefinition>()))
        .from_method_any(|ctx: &InjectContext<'_>| -> Result<AnyArc, BoxError> {
            Ok(Arc::new(format!("repository of {}", ctx.contract())))
        });

    let closed = |element: Contract| {
        Inject::for_contract(Contract::generic(TypeKey::of::<RepositoryDefinition>(), [element]))
    };
    let users: Arc<String> = container.resolve_with(closed(Contract::of::<u32>())).unwrap();
    let orders: Arc<String> = container.resolve_with(closed(Contract::of::<i64>())).unwrap();

    assert_eq!(users.as_str(), "repository of RepositoryDefinition<u32>");
    assert_eq!(orders.as_str(), "repository of RepositoryDefinition<i64>");
}

#[test]
fn test_closed_binding_beats_open_definition() {
    let container = Container::new();
    let closed = Contract::generic(TypeKey::of::<RepositoryDefinition>(), [Contract::of::<u32>()]);
    container
        .bind_contract(Contract::open(TypeKey::of::<RepositoryDefinition>()))
        .from_any(Arc::new("open".to_string()), TypeKey::of::<String>());
    container
        .bind_contract(closed.clone())
        .from_any(Arc::new("closed".to_string()), TypeKey::of::<String>());

    let value: Arc<String> = container.resolve_with(Inject::for_contract(closed)).unwrap();
    assert_eq!(value.as_str(), "closed");
}

// ===== Multi-value method bindings =====

#[test]
fn test_empty_method_multiple_fails_single_resolve() {
    let container = Container::new();
    container.bind::<u32>().from_method_multiple(|_| Ok(Vec::new()));

    match container.resolve::<u32>() {
        Err(DiError::ProviderArityMismatch { contract, found, .. }) => {
            assert_eq!(found, 0);
            assert!(contract.contains("u32"));
        }
        other => panic!("expected arity mismatch, got {:?}", other),
    }
}

#[test]
fn test_empty_method_multiple_uses_optional_fallback() {
    let container = Container::new();
    container.bind::<u32>().from_method_multiple(|_| Ok(Vec::new()));

    let value: Arc<u32> = container.resolve_with(Inject::of::<u32>().fallback(9u32)).unwrap();
    assert_eq!(*value, 9);
    assert!(container.try_resolve::<u32>().unwrap().is_none());
}

#[test]
fn test_method_multiple_feeds_resolve_all_but_not_resolve() {
    let container = Container::new();
    container.bind::<u32>().from_method_multiple(|_| Ok(vec![4, 5]));

    match container.resolve::<u32>() {
        Err(DiError::ProviderArityMismatch { found: 2, .. }) => {}
        other => panic!("expected arity mismatch, got {:?}", other),
    }
    let all: Vec<u32> = container.resolve_all::<u32>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(all, [4, 5]);
}

#[test]
fn test_method_multiple_trait_objects() {
    let container = Container::new();
    container
        .bind_trait::<dyn Plugin>()
        .from_method_multiple(|_| -> Result<Vec<Arc<dyn Plugin>>, BoxError> { Ok(vec![Arc::new(Audio), Arc::new(Video)]) });

    let names: Vec<&str> = container
        .resolve_all_trait::<dyn Plugin>()
        .unwrap()
        .iter()
        .map(|plugin| plugin.name())
        .collect();
    assert_eq!(names, ["audio", "video"]);
}

#[test]
fn test_required_resolve_all_fails_when_providers_yield_nothing() {
    let container = Container::new();
    container.bind::<u32>().from_method_multiple(|_| Ok(Vec::new()));

    match container.resolve_all_inject(Inject::of::<u32>()) {
        Err(error) => assert!(error.is_missing_binding()),
        Ok(values) => panic!("expected missing binding, got {} values", values.len()),
    }
    assert!(container.resolve_all_inject(Inject::of::<u32>().optional()).unwrap().is_empty());
}
