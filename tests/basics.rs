use ferrous_hive::{
    BoxError, Container, DiError, ExtraArgs, Inject, Injectable, Resolver, TypeDescriptor, TypeKey,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    port: u16,
}

#[derive(Debug)]
struct Server {
    config: Arc<Config>,
    workers: u32,
}

impl Injectable for Server {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Server>()
            .constructor([Inject::of::<Config>(), Inject::of::<u32>()], |mut args| {
                Ok(Server {
                    config: args.next()?,
                    workers: *args.next::<u32>()?,
                })
            })
            .build()
    }
}

#[test]
fn test_instance_binding_shares_one_value() {
    let container = Container::new();
    container.bind::<usize>().from_instance(42);
    container.bind::<String>().from_instance("hello".to_string());

    let num1 = container.resolve::<usize>().unwrap();
    let num2 = container.resolve::<usize>().unwrap();
    let str1 = container.resolve::<String>().unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(str1.as_str(), "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
}

#[test]
fn test_descriptor_construction_with_dependencies() {
    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 8080 });
    container.bind::<u32>().from_instance(4);
    container.bind::<Server>().to_self();

    let server = container.resolve::<Server>().unwrap();
    assert_eq!(server.config.port, 8080);
    assert_eq!(server.workers, 4);
}

#[test]
fn test_transient_binding_builds_each_time() {
    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 1 });
    container.bind::<u32>().from_instance(1);
    container.bind::<Server>().to_self();

    let a = container.resolve::<Server>().unwrap();
    let b = container.resolve::<Server>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a.config, &b.config));
}

#[test]
fn test_cached_binding_builds_once() {
    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 1 });
    container.bind::<u32>().from_instance(1);
    container.bind::<Server>().to_self().as_cached();

    let a = container.resolve::<Server>().unwrap();
    let b = container.resolve::<Server>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_identifiers_select_bindings() {
    let container = Container::new();
    container.bind::<u32>().with_id("primary").from_instance(1);
    container.bind::<u32>().with_id("backup").from_instance(2);
    container.bind::<u32>().with_id(7).from_instance(3);

    assert_eq!(*container.resolve_id::<u32>("primary").unwrap(), 1);
    assert_eq!(*container.resolve_id::<u32>("backup").unwrap(), 2);
    assert_eq!(*container.resolve_id::<u32>(7).unwrap(), 3);
    assert!(container.resolve::<u32>().unwrap_err().is_missing_binding());
}

#[test]
fn test_optional_requests() {
    let container = Container::new();

    assert!(container.try_resolve::<u64>().unwrap().is_none());

    let fallback = container
        .resolve_with::<u64>(Inject::of::<u64>().fallback(5u64))
        .unwrap();
    assert_eq!(*fallback, 5);

    container.bind::<u64>().from_instance(9);
    assert_eq!(*container.try_resolve::<u64>().unwrap().unwrap(), 9);
}

#[test]
fn test_two_unconditional_bindings_are_ambiguous() {
    let container = Container::new();
    container.bind::<u32>().from_instance(1);
    container.bind::<u32>().from_instance(2);

    match container.resolve::<u32>() {
        Err(DiError::AmbiguousBinding { contract, .. }) => assert_eq!(contract, "u32"),
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_conditional_binding_beats_unconditional() {
    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 1 });
    container.bind::<u32>().from_instance(1);
    container.bind::<u32>().from_instance(16).when_injected_into::<Server>();
    container.bind::<Server>().to_self();

    assert_eq!(*container.resolve::<u32>().unwrap(), 1);
    assert_eq!(container.resolve::<Server>().unwrap().workers, 16);
}

#[test]
fn test_condition_sees_request_context() {
    let container = Container::new();
    container
        .bind::<String>()
        .from_instance("named".to_string())
        .when(|ctx| ctx.request().name() == Some("title"));

    assert!(container.try_resolve::<String>().unwrap().is_none());
    let named = container
        .resolve_with::<String>(Inject::of::<String>().named("title"))
        .unwrap();
    assert_eq!(named.as_str(), "named");
}

#[test]
fn test_method_binding_receives_context() {
    let container = Container::new();
    container.bind::<u16>().from_instance(8080);
    container
        .bind::<Config>()
        .from_method(|ctx| Ok(Config { port: *ctx.resolve::<u16>()? }));

    assert_eq!(container.resolve::<Config>().unwrap().port, 8080);
}

#[test]
fn test_factory_binding() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let container = Container::new();
    container.bind::<Config>().from_factory(move || -> Result<Config, BoxError> {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(Config { port: 3000 })
    });

    assert_eq!(container.resolve::<Config>().unwrap().port, 3000);
    assert_eq!(container.resolve::<Config>().unwrap().port, 3000);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_factory_failure_is_reported() {
    let container = Container::new();
    container
        .bind::<Config>()
        .from_factory(|| -> Result<Config, BoxError> { Err("port unavailable".into()) });

    match container.resolve::<Config>() {
        Err(DiError::FactoryCreationFailed { source, .. }) => {
            assert_eq!(source.to_string(), "port unavailable")
        }
        other => panic!("expected factory failure, got {:?}", other),
    }
}

#[test]
fn test_forwarding_binding() {
    let container = Container::new();
    container.bind::<u32>().with_id("real").from_instance(11);
    container.bind::<u32>().from_resolve_id("real");

    assert_eq!(*container.resolve::<u32>().unwrap(), 11);
    assert_eq!(
        container.resolve_type(Inject::of::<u32>()).unwrap(),
        Some(TypeKey::of::<u32>())
    );
}

#[test]
fn test_trait_binding_to_described_type() {
    trait Endpoint: Send + Sync {
        fn port(&self) -> u16;
    }

    impl Endpoint for Server {
        fn port(&self) -> u16 {
            self.config.port
        }
    }

    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 443 });
    container.bind::<u32>().from_instance(1);
    container
        .bind_trait::<dyn Endpoint>()
        .to::<Server, _>(|server| server as Arc<dyn Endpoint>);

    assert_eq!(container.resolve_trait::<dyn Endpoint>().unwrap().port(), 443);
    assert_eq!(
        container.resolve_type(Inject::of::<dyn Endpoint>()).unwrap(),
        Some(TypeKey::of::<Server>())
    );
}

#[test]
fn test_also_as_trait_shares_cached_instance() {
    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Service(String);

    impl Named for Service {
        fn name(&self) -> &str {
            &self.0
        }
    }

    let container = Container::new();
    container
        .bind::<Service>()
        .from_method(|_| Ok(Service("svc".into())))
        .also_as_trait::<dyn Named, _>(|service| service as Arc<dyn Named>)
        .as_cached();

    let concrete = container.resolve::<Service>().unwrap();
    let named = container.resolve_trait::<dyn Named>().unwrap();
    assert_eq!(named.name(), "svc");
    assert_eq!(
        Arc::as_ptr(&concrete) as *const u8,
        Arc::as_ptr(&named) as *const Service as *const u8
    );
}

#[test]
fn test_unset_binding_fails_on_flush() {
    let container = Container::new();
    let _ = container.bind::<Config>();

    assert!(matches!(container.flush(), Err(DiError::InvalidBinding(_))));
}

#[test]
fn test_binding_arguments_feed_constructor() {
    let container = Container::new();
    container.bind::<Config>().from_instance(Config { port: 1 });
    container
        .bind::<Server>()
        .to_self()
        .with_arguments(ExtraArgs::new().with(12u32));

    assert_eq!(container.resolve::<Server>().unwrap().workers, 12);
}
