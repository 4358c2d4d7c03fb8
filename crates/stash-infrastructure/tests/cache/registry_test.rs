//! Registry declaration, lookup and lazy materialization

use serde_json::json;
use stash_domain::{CacheOptions, EngineKind, EngineState, ErrorKind, SetOptions};
use stash_infrastructure::{CacheRegistry, StashConfig};
use std::sync::Arc;

#[test]
fn test_register_and_has() {
    let registry = CacheRegistry::new();
    assert!(!registry.has("sessions"));

    registry.register(" Sessions ", &CacheOptions::memory()).unwrap();
    assert!(registry.has("sessions"));
    assert!(registry.has("SESSIONS"));
    assert!(!registry.is_materialized("sessions"));
    assert_eq!(registry.names(), vec!["sessions".to_string()]);
}

#[test]
fn test_identical_reregistration_is_noop() {
    let registry = CacheRegistry::new();
    registry.register("n", &CacheOptions::memory()).unwrap();
    registry.register("N", &CacheOptions::new("memory")).unwrap();
    assert_eq!(registry.names().len(), 1);
}

#[test]
fn test_conflicting_reregistration_is_duplicate() {
    let registry = CacheRegistry::new();
    registry.register("n", &CacheOptions::memory()).unwrap();

    let error = registry
        .register("n", &CacheOptions::memory().with_default_expiry(10))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Duplicate);
    assert_eq!(error.metadata().unwrap().instance.as_deref(), Some("n"));

    // The original declaration is untouched
    assert_eq!(registry.config("n").unwrap().default_expiry(), 300);
}

#[test]
fn test_unknown_engine_is_unsupported() {
    let registry = CacheRegistry::new();
    let error = registry
        .register("n", &CacheOptions::new("BOGUS"))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unsupported);
    assert!(!registry.has("n"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let registry = CacheRegistry::new();
    let error = registry
        .register("n", &CacheOptions::new("REDIS"))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
    assert!(!registry.has("n"));
}

#[test]
fn test_get_unknown_is_not_found() {
    let registry = CacheRegistry::new();
    let error = registry.get("ghost").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.metadata().unwrap().instance.as_deref(), Some("ghost"));

    assert_eq!(registry.get("   ").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_get_memoizes_instance() {
    let registry = CacheRegistry::new();
    registry.register("n", &CacheOptions::memory()).unwrap();

    let first = registry.get("n").unwrap();
    let second = registry.get(" N ").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry.is_materialized("n"));
    assert_eq!(first.engine_kind(), EngineKind::Memory);
}

#[test]
fn test_declared_network_cache_never_connects_until_used() {
    let registry = CacheRegistry::new();
    registry
        .register("remote", &CacheOptions::redis("127.0.0.1").with_port(1))
        .unwrap();

    let cache = registry.get("remote").unwrap();
    assert_eq!(cache.state(), EngineState::Closed);
}

#[test]
fn test_from_config() {
    let config = StashConfig::default()
        .with_cache("sessions", CacheOptions::memory())
        .with_cache("profiles", CacheOptions::redis("cache.internal").with_db(1));

    let registry = CacheRegistry::from_config(&config).unwrap();
    assert_eq!(registry.names(), vec!["profiles", "sessions"]);
    assert_eq!(
        registry.config("profiles").unwrap().kind(),
        EngineKind::Redis
    );
}

#[tokio::test]
async fn test_end_to_end_sessions() {
    let registry = CacheRegistry::new();
    registry
        .register(
            "sessions",
            &CacheOptions::memory().with_default_expiry(300),
        )
        .unwrap();

    let sessions = registry.get("sessions").unwrap();
    sessions
        .set("u1", &json!({"id": 1}), SetOptions::new())
        .await
        .unwrap();
    assert_eq!(
        sessions.get::<serde_json::Value>("u1").await.unwrap(),
        Some(json!({"id": 1}))
    );
    assert!(!sessions.has("missing").await.unwrap());

    sessions.delete("u1").await.unwrap();
    assert!(!sessions.has("u1").await.unwrap());
}

#[tokio::test]
async fn test_separate_registrations_are_isolated() {
    let registry = CacheRegistry::new();
    registry.register("a", &CacheOptions::memory()).unwrap();
    registry.register("b", &CacheOptions::memory()).unwrap();

    let a = registry.get("a").unwrap();
    let b = registry.get("b").unwrap();
    a.set("x", &1, SetOptions::new()).await.unwrap();
    assert!(!b.has("x").await.unwrap());
}

#[tokio::test]
async fn test_finalize_all() {
    let registry = CacheRegistry::new();
    registry.register("a", &CacheOptions::memory()).unwrap();
    registry.register("b", &CacheOptions::memory()).unwrap();

    let a = registry.get("a").unwrap();
    a.init().await.unwrap();
    assert_eq!(a.state(), EngineState::Open);

    registry.finalize_all().await.unwrap();
    assert_eq!(a.state(), EngineState::Closed);
    assert!(!registry.is_materialized("b"));
}

#[cfg(feature = "cache-redis")]
#[tokio::test]
async fn test_unreachable_backend_fails_fast() {
    let registry = CacheRegistry::new();
    registry
        .register(
            "down",
            &CacheOptions::redis("127.0.0.1")
                .with_port(1)
                .with_connect_timeout_secs(1),
        )
        .unwrap();
    let cache = registry.get("down").unwrap();

    let first = cache.has("k").await.unwrap_err();
    assert_eq!(first.kind(), ErrorKind::Connection);
    assert_eq!(cache.state(), EngineState::Failed);

    let started = std::time::Instant::now();
    let second = cache.set("k", &1, SetOptions::new()).await.unwrap_err();
    assert_eq!(second.kind(), ErrorKind::Connection);
    assert!(started.elapsed() < std::time::Duration::from_millis(500));

    cache.finalize().await.unwrap();
    assert_eq!(cache.state(), EngineState::Closed);
}
