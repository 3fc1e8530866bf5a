use ferrous_hive::{Container, DiError, Inject, InjectSource, Injectable, Lazy, Resolver, TypeDescriptor};
use std::sync::Arc;

struct SelfReferencing;

impl Injectable for SelfReferencing {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<SelfReferencing>()
            .constructor([Inject::of::<SelfReferencing>()], |mut args| {
                let _inner = args.next::<SelfReferencing>()?;
                Ok(SelfReferencing)
            })
            .build()
    }
}

struct Left {
    _right: Arc<Right>,
}

struct Right {
    _left: Arc<Left>,
}

impl Injectable for Left {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Left>()
            .constructor([Inject::of::<Right>()], |mut args| Ok(Left { _right: args.next()? }))
            .build()
    }
}

impl Injectable for Right {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Right>()
            .constructor([Inject::of::<Left>()], |mut args| Ok(Right { _left: args.next()? }))
            .build()
    }
}

fn assert_circular(result: Result<impl Sized, DiError>, expected: &[&str]) {
    match result {
        Err(DiError::CircularDependency { chain }) => {
            let rendered = chain.join("\n");
            for entry in expected {
                assert!(
                    rendered.contains(entry),
                    "chain missing '{}'; got:\n{}",
                    entry,
                    rendered
                );
            }
        }
        Err(other) => panic!("expected circular dependency, got {}", other),
        Ok(_) => panic!("expected circular dependency, resolution succeeded"),
    }
}

#[test]
fn test_self_circular_dependency() {
    let container = Container::new();
    container.bind::<SelfReferencing>().to_self();

    assert_circular(container.resolve::<SelfReferencing>(), &["SelfReferencing"]);
}

#[test]
fn test_two_way_circular_dependency() {
    let container = Container::new();
    container.bind::<Left>().to_self();
    container.bind::<Right>().to_self();

    assert_circular(container.resolve::<Left>(), &["Left", "Right"]);
}

#[test]
fn test_instantiate_detects_cycle() {
    let container = Container::new();
    container.bind::<Left>().to_self();
    container.bind::<Right>().to_self();

    assert_circular(container.instantiate::<Left>(), &["Left", "Right"]);
}

#[test]
fn test_cached_cycle_is_detected() {
    let container = Container::new();
    container.bind::<Left>().to_self().as_cached();
    container.bind::<Right>().to_self().as_cached();

    assert_circular(container.resolve::<Right>(), &["Left", "Right"]);
}

#[test]
fn test_chain_is_innermost_first() {
    let container = Container::new();
    container.bind::<Left>().to_self();
    container.bind::<Right>().to_self();

    let err = container.resolve::<Left>().err().unwrap();
    let chain = err.chain();
    assert!(chain.len() >= 3);
    assert!(chain.last().unwrap().starts_with("Left"));
}

#[test]
fn test_decorating_parent_binding_is_not_a_cycle() {
    let root = Container::new();
    root.bind::<u32>().from_instance(1);
    let child = root.create_sub_container().unwrap();
    child
        .bind::<u32>()
        .from_method(|ctx| {
            let parent = ctx.resolve_with::<u32>(Inject::of::<u32>().from_source(InjectSource::Parent))?;
            Ok(*parent + 1)
        })
        .as_cached();

    assert_eq!(*child.resolve::<u32>().unwrap(), 2);
}

#[test]
fn test_guard_released_after_failure() {
    let container = Container::new();
    container.bind::<SelfReferencing>().to_self();

    assert!(container.resolve::<SelfReferencing>().is_err());
    container.bind::<u8>().from_instance(3);
    assert_eq!(*container.resolve::<u8>().unwrap(), 3);
    assert!(matches!(
        container.resolve::<SelfReferencing>(),
        Err(DiError::CircularDependency { .. })
    ));
}

struct Chicken {
    egg: Lazy<Egg>,
}

struct Egg {
    chicken: Arc<Chicken>,
}

impl Injectable for Chicken {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Chicken>()
            .constructor([Inject::lazy_of::<Egg>()], |mut args| Ok(Chicken { egg: args.next_lazy()? }))
            .build()
    }
}

impl Injectable for Egg {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Egg>()
            .constructor([Inject::of::<Chicken>()], |mut args| Ok(Egg { chicken: args.next()? }))
            .build()
    }
}

#[test]
fn test_lazy_breaks_construction_cycle() {
    let container = Container::new();
    container.bind::<Chicken>().to_self().as_cached();
    container.bind::<Egg>().to_self().as_cached();

    let chicken = container.resolve::<Chicken>().unwrap();
    assert!(!chicken.egg.is_resolved());

    let egg = chicken.egg.get().unwrap();
    assert!(Arc::ptr_eq(&egg.chicken, &chicken));
    assert!(chicken.egg.is_resolved());
}
