use ferrous_hive::{
    BoxError, Container, ContainerSettings, DiError, MemoryPool, PoolExpandMethod, PoolHooks, PoolSettings, Resolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Bullet {
    damage: u32,
}

fn bullets(settings: PoolSettings) -> MemoryPool<Bullet> {
    MemoryPool::from_fn(settings, Bullet::default).unwrap()
}

#[test]
fn test_initial_fill() {
    let pool = bullets(PoolSettings::new(3, 10, PoolExpandMethod::OneAtATime));
    assert_eq!(pool.num_inactive(), 3);
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_total(), 3);
}

#[test]
fn test_acquire_and_release() {
    let pool = bullets(PoolSettings::new(2, 10, PoolExpandMethod::OneAtATime));

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert_eq!(pool.num_active(), 2);
    assert_eq!(pool.num_inactive(), 0);

    pool.release(a).unwrap();
    pool.release(b).unwrap();
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_inactive(), 2);
}

#[test]
fn test_released_items_are_reused() {
    let pool = bullets(PoolSettings::new(1, 10, PoolExpandMethod::OneAtATime));

    let first = pool.acquire().unwrap();
    let address = Arc::as_ptr(&first);
    pool.release(first).unwrap();

    let second = pool.acquire().unwrap();
    assert_eq!(Arc::as_ptr(&second), address);
}

#[test]
fn test_expand_one_at_a_time() {
    let pool = bullets(PoolSettings::new(0, 10, PoolExpandMethod::OneAtATime));

    let _a = pool.acquire().unwrap();
    assert_eq!(pool.num_total(), 1);
    let _b = pool.acquire().unwrap();
    assert_eq!(pool.num_total(), 2);
    assert_eq!(pool.num_inactive(), 0);
}

#[test]
fn test_expand_double() {
    let pool = bullets(PoolSettings::new(2, 100, PoolExpandMethod::Double));

    let held: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
    // Two initial items, then the pool doubles from 2 to 4 total.
    assert_eq!(pool.num_total(), 4);
    assert_eq!(pool.num_inactive(), 1);

    let more: Vec<_> = (0..2).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(pool.num_total(), 8);
    assert_eq!(held.len() + more.len(), pool.num_active());
}

#[test]
fn test_expand_double_from_empty() {
    let pool = bullets(PoolSettings::new(0, 100, PoolExpandMethod::Double));
    let _a = pool.acquire().unwrap();
    assert_eq!(pool.num_total(), 1);
}

#[test]
fn test_fixed_pool_exhausts() {
    let pool = bullets(PoolSettings::fixed(1));

    let held = pool.acquire().unwrap();
    assert!(matches!(pool.acquire(), Err(DiError::PoolExhausted { size: 1, .. })));

    pool.release(held).unwrap();
    assert!(pool.acquire().is_ok());
}

#[test]
fn test_fixed_pool_refuses_resize() {
    let pool = bullets(PoolSettings::fixed(2));

    assert!(matches!(pool.resize(5), Err(DiError::PoolExceededFixedSize { .. })));
    assert!(matches!(pool.shrink_by(1), Err(DiError::PoolExceededFixedSize { .. })));
    assert!(pool.resize(2).is_ok());
    assert_eq!(pool.num_inactive(), 2);
}

#[test]
fn test_resize_expand_shrink_clear() {
    let pool = bullets(PoolSettings::default());

    pool.resize(4).unwrap();
    assert_eq!(pool.num_inactive(), 4);
    pool.expand_by(2).unwrap();
    assert_eq!(pool.num_inactive(), 6);
    pool.shrink_by(5).unwrap();
    assert_eq!(pool.num_inactive(), 1);
    pool.shrink_by(10).unwrap();
    assert_eq!(pool.num_inactive(), 0);
    pool.expand_by(3).unwrap();
    pool.clear().unwrap();
    assert_eq!(pool.num_total(), 0);
}

#[test]
fn test_release_trims_to_max_size() {
    let pool = bullets(PoolSettings::new(0, 2, PoolExpandMethod::OneAtATime));

    let held: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(pool.num_total(), 4);
    for item in held {
        pool.release(item).unwrap();
    }
    assert_eq!(pool.num_inactive(), 2);
    assert_eq!(pool.num_active(), 0);
}

#[test]
fn test_double_release_is_rejected() {
    let pool = bullets(PoolSettings::new(2, 10, PoolExpandMethod::OneAtATime));

    let held = pool.acquire().unwrap();
    let _other = pool.acquire().unwrap();
    pool.release(held.clone()).unwrap();
    assert!(matches!(pool.release(held), Err(DiError::DoubleRelease { .. })));
    assert_eq!(pool.num_active(), 1);
}

#[test]
fn test_release_without_active_items_is_rejected() {
    let pool = bullets(PoolSettings::new(1, 10, PoolExpandMethod::OneAtATime));
    let stray = Arc::new(Bullet::default());
    assert!(matches!(pool.release(stray), Err(DiError::DoubleRelease { .. })));
}

#[test]
fn test_factory_failure_surfaces_as_allocation_error() {
    let pool = MemoryPool::<Bullet>::new(PoolSettings::default(), || -> Result<Bullet, BoxError> {
        Err("out of ammo".into())
    })
    .unwrap();

    match pool.acquire() {
        Err(DiError::PoolAllocationFailed { source, .. }) => assert_eq!(source.to_string(), "out of ammo"),
        other => panic!("expected allocation failure, got {:?}", other),
    }
    assert!(pool.validate().is_err());
}

#[derive(Default)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl PoolHooks<Bullet> for RecordingHooks {
    fn on_created(&self, _item: &Bullet) {
        self.events.lock().unwrap().push("created");
    }

    fn on_destroyed(&self, _item: &Bullet) {
        self.events.lock().unwrap().push("destroyed");
    }

    fn on_spawned(&self, _item: &Bullet) {
        self.events.lock().unwrap().push("spawned");
    }

    fn on_despawned(&self, _item: &Bullet) {
        self.events.lock().unwrap().push("despawned");
    }
}

#[test]
fn test_lifecycle_hooks_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let hooks = RecordingHooks { events: events.clone() };
    let pool = MemoryPool::with_hooks(
        PoolSettings::new(1, 10, PoolExpandMethod::OneAtATime),
        || -> Result<Bullet, BoxError> { Ok(Bullet::default()) },
        hooks,
    )
    .unwrap();

    let item = pool.acquire().unwrap();
    pool.release(item).unwrap();
    pool.clear().unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        ["created", "spawned", "despawned", "destroyed"]
    );
}

#[test]
fn test_pool_binding_acquires_per_request() {
    let created = Arc::new(AtomicUsize::new(0));
    let seen = created.clone();

    let container = Container::new();
    let pool = container
        .bind_pool::<Bullet>(
            PoolSettings::new(2, 10, PoolExpandMethod::OneAtATime),
            move || -> Result<Bullet, BoxError> {
                Ok(Bullet {
                    damage: seen.fetch_add(1, Ordering::SeqCst) as u32,
                })
            },
        )
        .unwrap();

    let a = container.resolve::<Bullet>().unwrap();
    let b = container.resolve::<Bullet>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(pool.num_active(), 2);

    let same_pool = container.resolve::<MemoryPool<Bullet>>().unwrap();
    assert!(Arc::ptr_eq(&same_pool, &pool));
    same_pool.release(a).unwrap();
    assert_eq!(pool.num_active(), 1);
    assert!(b.damage < 2);
}

#[test]
fn test_pool_registry_tracks_pools_in_tree() {
    let root = Container::new();
    let child = root.create_sub_container().unwrap();
    let _pool = child
        .bind_pool::<Bullet>(PoolSettings::new(3, 10, PoolExpandMethod::OneAtATime), || -> Result<Bullet, BoxError> {
            Ok(Bullet::default())
        })
        .unwrap();

    let stats = root.pool_registry().snapshot();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].inactive, 3);
    assert_eq!(stats[0].total, 3);
    assert!(stats[0].item_type.ends_with("Bullet"));
}

#[test]
fn test_dispose_drains_bound_pool() {
    let container = Container::new();
    let pool = container
        .bind_pool::<Bullet>(PoolSettings::new(4, 10, PoolExpandMethod::OneAtATime), || -> Result<Bullet, BoxError> {
            Ok(Bullet::default())
        })
        .unwrap();

    assert_eq!(pool.num_inactive(), 4);
    assert_eq!(container.pool_registry().len(), 1);
    container.dispose();
    assert_eq!(pool.num_inactive(), 0);
    assert!(container.pool_registry().is_empty());
}

#[test]
fn test_validating_container_leaves_pool_empty() {
    let created = Arc::new(AtomicUsize::new(0));
    let seen = created.clone();

    let container = Container::with_settings(ContainerSettings::validating());
    let pool = container
        .bind_pool::<Bullet>(PoolSettings::new(5, 10, PoolExpandMethod::OneAtATime), move || -> Result<Bullet, BoxError> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Bullet::default())
        })
        .unwrap();

    assert_eq!(pool.num_total(), 0);
    container.validate().unwrap();
    // The factory is exercised once by validation, but nothing is pooled.
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(pool.num_total(), 0);
}
