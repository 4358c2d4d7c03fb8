//! Cache contract over the memory engine

use serde::{Deserialize, Serialize};
use serde_json::json;
use stash_domain::{CacheEngine, CacheName, CacheOptions, EngineState, ErrorKind, SetOptions};
use stash_infrastructure::Cache;
use stash_providers::cache::MemoryEngine;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: u32,
    tags: Vec<String>,
    nickname: Option<String>,
}

fn memory_cache(name: &str) -> Cache {
    let name = CacheName::new(name).unwrap();
    let config = CacheOptions::memory().resolve(&name).unwrap();
    Cache::new(name, config).unwrap()
}

/// Two caches sharing one physical memory engine
fn shared_pair() -> (Cache, Cache, Arc<MemoryEngine>) {
    let a = CacheName::new("a").unwrap();
    let b = CacheName::new("b").unwrap();
    let engine = Arc::new(MemoryEngine::new(a.clone()));
    let config = CacheOptions::memory().resolve(&a).unwrap();
    (
        Cache::with_engine(a, config.clone(), engine.clone()),
        Cache::with_engine(b, config, engine.clone()),
        engine,
    )
}

#[tokio::test]
async fn test_round_trip() {
    let cache = memory_cache("roundtrip");
    let profile = Profile {
        id: 7,
        tags: vec!["x".into(), "y".into()],
        nickname: None,
    };

    cache.set("p", &profile, SetOptions::new()).await.unwrap();
    cache.set("n", &42_i64, SetOptions::new()).await.unwrap();
    cache.set("s", "text", SetOptions::new()).await.unwrap();
    cache.set("null", &json!(null), SetOptions::new()).await.unwrap();

    assert_eq!(cache.get::<Profile>("p").await.unwrap(), Some(profile));
    assert_eq!(cache.get::<i64>("n").await.unwrap(), Some(42));
    assert_eq!(cache.get::<String>("s").await.unwrap().as_deref(), Some("text"));
    assert_eq!(
        cache.get::<serde_json::Value>("null").await.unwrap(),
        Some(json!(null))
    );
}

#[tokio::test]
async fn test_keys_are_normalized() {
    let cache = memory_cache("norm");
    cache.set("  User:One ", &1, SetOptions::new()).await.unwrap();

    assert!(cache.has("user:one").await.unwrap());
    assert_eq!(cache.get::<i32>("USER:ONE").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_missing_key() {
    let cache = memory_cache("missing");
    assert!(!cache.has("nope").await.unwrap());
    assert_eq!(cache.get::<i32>("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let cache = memory_cache("del");
    cache.delete("never-set").await.unwrap();

    cache.set("k", &1, SetOptions::new()).await.unwrap();
    cache.delete("k").await.unwrap();
    cache.delete("k").await.unwrap();
    assert!(!cache.has("k").await.unwrap());
}

#[tokio::test]
async fn test_overwrite_is_last_write_wins() {
    let cache = memory_cache("overwrite");
    cache.set("k", &1, SetOptions::new()).await.unwrap();
    cache.set("k", &2, SetOptions::new()).await.unwrap();
    assert_eq!(cache.get::<i32>("k").await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_namespace_isolation_on_shared_engine() {
    let (a, b, engine) = shared_pair();

    a.set("x", &1, SetOptions::new()).await.unwrap();
    assert!(a.has("x").await.unwrap());
    assert!(!b.has("x").await.unwrap());
    assert!(engine.exists("a:x").await.unwrap());

    b.set("x", &2, SetOptions::new()).await.unwrap();
    assert_eq!(a.get::<i32>("x").await.unwrap(), Some(1));
    assert_eq!(b.get::<i32>("x").await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_clear_is_scoped_to_namespace() {
    let (a, b, _engine) = shared_pair();
    for key in ["k1", "k2", "k3"] {
        a.set(key, &key, SetOptions::new()).await.unwrap();
    }
    b.set("k1", &"kept", SetOptions::new()).await.unwrap();

    assert_eq!(a.clear().await.unwrap(), 3);
    for key in ["k1", "k2", "k3"] {
        assert!(!a.has(key).await.unwrap());
    }
    assert_eq!(b.get::<String>("k1").await.unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_expiry_bounds() {
    let cache = memory_cache("bounds");

    for rejected in [-1, 216_001] {
        let error = cache
            .set("k", &1, SetOptions::new().with_expiry(rejected))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        let metadata = error.metadata().unwrap();
        assert_eq!(metadata.key.as_deref(), Some("k"));
        assert_eq!(metadata.config_key.as_deref(), Some("expiry"));
        assert_eq!(metadata.config_value, Some(rejected.to_string()));
        assert!(!cache.has("k").await.unwrap());
    }

    for accepted in [0, 216_000] {
        cache
            .set("k", &1, SetOptions::new().with_expiry(accepted))
            .await
            .unwrap();
        assert!(cache.has("k").await.unwrap());
    }
}

#[tokio::test]
async fn test_lazy_init_and_finalize() {
    let cache = memory_cache("life");
    assert_eq!(cache.state(), EngineState::Closed);

    cache.init().await.unwrap();
    cache.init().await.unwrap();
    assert_eq!(cache.state(), EngineState::Open);

    cache.close().await.unwrap();
    cache.finalize().await.unwrap();
    assert_eq!(cache.state(), EngineState::Closed);

    // First operation after finalize reopens the engine
    cache.set("k", &1, SetOptions::new()).await.unwrap();
    assert_eq!(cache.state(), EngineState::Open);
}

#[tokio::test]
async fn test_finalize_empties_memory_cache() {
    let cache = memory_cache("volatile");
    cache.set("k", &1, SetOptions::new()).await.unwrap();

    cache.finalize().await.unwrap();
    assert!(!cache.has("k").await.unwrap());
    assert_eq!(cache.get::<i32>("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_type_mismatch_is_operation_error() {
    let cache = memory_cache("mismatch");
    cache.set("k", "not a number", SetOptions::new()).await.unwrap();

    let error = cache.get::<u32>("k").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Operation);
    let metadata = error.metadata().unwrap();
    assert_eq!(metadata.instance.as_deref(), Some("mismatch"));
    assert_eq!(metadata.key.as_deref(), Some("k"));
}

#[tokio::test]
async fn test_corrupt_record_is_operation_error() {
    let name = CacheName::new("corrupt").unwrap();
    let engine = Arc::new(MemoryEngine::new(name.clone()));
    let config = CacheOptions::memory().resolve(&name).unwrap();
    let cache = Cache::with_engine(name, config, engine.clone());

    engine.write("corrupt:k", "{not json", 0).await.unwrap();
    let error = cache.get::<i32>("k").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Operation);
}

#[tokio::test]
async fn test_stored_record_format() {
    let name = CacheName::new("wire").unwrap();
    let engine = Arc::new(MemoryEngine::new(name.clone()));
    let config = CacheOptions::memory().resolve(&name).unwrap();
    let cache = Cache::with_engine(name, config, engine.clone());

    cache
        .set("u1", &json!({"id": 1}), SetOptions::new().with_window(true))
        .await
        .unwrap();
    let payload = engine.read("wire:u1").await.unwrap().unwrap();
    let record: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(
        record,
        json!({"data": {"id": 1}, "expiry": 300, "window": true})
    );
}
