mod common;

use common::TestFactory;
use upool::{PoolError, PoolOptions, PoolRegistry};

#[tokio::test]
async fn test_register_and_lookup() {
    let registry = PoolRegistry::new();
    registry
        .register("main", PoolOptions::new(2), TestFactory::new())
        .unwrap();
    registry
        .register("replica", PoolOptions::new(4), TestFactory::new())
        .unwrap();

    let main = registry.pool("main").unwrap();
    let replica = registry.pool("replica").unwrap();
    assert!(registry.pool("missing").is_none());

    // The pools are independent: each creates its own connection #1.
    let a = main.connect().await.unwrap();
    let b = replica.connect().await.unwrap();
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 1);
    assert_eq!(main.status().maxsize, 2);
    assert_eq!(replica.status().maxsize, 4);
}

#[test]
fn test_register_rejects_invalid_options() {
    let registry = PoolRegistry::new();
    let err = registry
        .register("broken", PoolOptions::new(0), TestFactory::new())
        .unwrap_err();
    assert!(matches!(err, PoolError::Config(_)));
    assert!(registry.pool("broken").is_none());
}

#[tokio::test]
async fn test_register_replaces_previous_pool() {
    let registry = PoolRegistry::new();
    registry
        .register("main", PoolOptions::new(1), TestFactory::new())
        .unwrap();
    let old = registry.pool("main").unwrap();
    let _held = old.connect().await.unwrap();

    registry
        .register("main", PoolOptions::new(1), TestFactory::new())
        .unwrap();
    let fresh = registry.pool("main").unwrap();
    assert_eq!(fresh.status().created, 0);

    // The replacement starts empty even though the old pool was drained.
    let conn = fresh.connect().await.unwrap();
    assert_eq!(conn.id, 1);
}

#[tokio::test]
async fn test_close_all_aggregates_failures() {
    let registry = PoolRegistry::new();
    registry
        .register("left", PoolOptions::new(2), TestFactory::failing_close())
        .unwrap();
    registry
        .register("right", PoolOptions::new(2), TestFactory::failing_close())
        .unwrap();

    for name in ["left", "right"] {
        let pool = registry.pool(name).unwrap();
        let conn = pool.connect().await.unwrap();
        drop(conn);
    }

    let err = registry.close_all().await.unwrap_err();
    match err {
        PoolError::Shutdown(failures) => assert_eq!(failures.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}
