//! Unit tests for cache configuration resolution

use stash_domain::{
    CacheName, CacheOptions, EngineConfig, EngineKind, ErrorKind, SetOptions, expiry_in_bounds,
};
use std::time::Duration;

fn name() -> CacheName {
    CacheName::new("sessions").unwrap()
}

#[test]
fn test_memory_defaults() {
    let config = CacheOptions::memory().resolve(&name()).unwrap();
    assert_eq!(config.kind(), EngineKind::Memory);
    assert_eq!(config.default_expiry(), 300);
    assert_eq!(config.engine(), &EngineConfig::Memory);
}

#[test]
fn test_engine_is_case_insensitive() {
    let config = CacheOptions::new("redis")
        .with_host("localhost")
        .resolve(&name())
        .unwrap();
    assert_eq!(config.kind(), EngineKind::Redis);
}

#[test]
fn test_unknown_engine_is_unsupported() {
    let error = CacheOptions::new("BOGUS").resolve(&name()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unsupported);
    let metadata = error.metadata().unwrap();
    assert_eq!(metadata.config_key.as_deref(), Some("engine"));
    assert_eq!(metadata.config_value.as_deref(), Some("BOGUS"));
}

#[test]
fn test_missing_engine_is_config_error() {
    let error = CacheOptions::default().resolve(&name()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
}

#[test]
fn test_default_expiry_bounds() {
    for accepted in [0, 216_000] {
        let config = CacheOptions::memory()
            .with_default_expiry(accepted)
            .resolve(&name())
            .unwrap();
        assert_eq!(config.default_expiry(), accepted as u64);
    }
    for rejected in [-1, 216_001] {
        let error = CacheOptions::memory()
            .with_default_expiry(rejected)
            .resolve(&name())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(
            error.metadata().unwrap().config_key.as_deref(),
            Some("default_expiry")
        );
    }
}

#[test]
fn test_network_engines_require_host() {
    for engine in ["REDIS", "MEMCACHED"] {
        let error = CacheOptions::new(engine).resolve(&name()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.metadata().unwrap().config_key.as_deref(), Some("host"));

        let error = CacheOptions::new(engine)
            .with_host("   ")
            .resolve(&name())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}

#[test]
fn test_default_ports() {
    let redis = CacheOptions::redis("r").resolve(&name()).unwrap();
    let memcached = CacheOptions::memcached("m").resolve(&name()).unwrap();

    match redis.engine() {
        EngineConfig::Redis(cfg) => {
            assert_eq!(cfg.port, 6379);
            assert_eq!(cfg.db, 0);
            assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        }
        other => panic!("Expected Redis config, got {other:?}"),
    }
    match memcached.engine() {
        EngineConfig::Memcached(cfg) => assert_eq!(cfg.port, 11211),
        other => panic!("Expected Memcached config, got {other:?}"),
    }
}

#[test]
fn test_zero_port_is_rejected() {
    let error = CacheOptions::redis("r")
        .with_port(0)
        .resolve(&name())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
}

#[test]
fn test_redis_options() {
    let config = CacheOptions::redis(" cache.internal ")
        .with_port(6380)
        .with_credentials("app", "s3cret")
        .with_db(2)
        .with_tls_cert_path("/etc/ca.pem")
        .resolve(&name())
        .unwrap();

    match config.engine() {
        EngineConfig::Redis(cfg) => {
            assert_eq!(cfg.host, "cache.internal");
            assert_eq!(cfg.port, 6380);
            assert_eq!(cfg.username.as_deref(), Some("app"));
            assert_eq!(cfg.password.as_ref().map(|p| p.expose()), Some("s3cret"));
            assert_eq!(cfg.db, 2);
            assert!(cfg.tls, "a certificate path implies TLS");
        }
        other => panic!("Expected Redis config, got {other:?}"),
    }
}

#[test]
fn test_negative_db_is_rejected() {
    let error = CacheOptions::redis("r")
        .with_db(-1)
        .resolve(&name())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
}

#[test]
fn test_memcached_rejects_redis_only_options() {
    let cases = [
        CacheOptions::memcached("m").with_db(1),
        CacheOptions::memcached("m").with_tls(true),
        CacheOptions::memcached("m").with_password("x"),
    ];
    for options in cases {
        let error = options.resolve(&name()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}

#[test]
fn test_password_is_redacted_in_debug() {
    let options = CacheOptions::redis("r").with_password("hunter2");
    let config = options.resolve(&name()).unwrap();
    assert!(!format!("{options:?}").contains("hunter2"));
    assert!(!format!("{config:?}").contains("hunter2"));
}

#[test]
fn test_structural_equality() {
    let a = CacheOptions::redis("r").with_db(1).resolve(&name()).unwrap();
    let b = CacheOptions::new("Redis")
        .with_host("r")
        .with_port(6379)
        .with_db(1)
        .resolve(&name())
        .unwrap();
    let c = CacheOptions::redis("r").with_db(2).resolve(&name()).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_set_options_and_bounds() {
    let options = SetOptions::new().with_expiry(5).with_window(true);
    assert_eq!(options.expiry, Some(5));
    assert!(options.effective_window());
    assert!(!SetOptions::new().effective_window());

    assert_eq!(expiry_in_bounds(0), Some(0));
    assert_eq!(expiry_in_bounds(216_000), Some(216_000));
    assert_eq!(expiry_in_bounds(-1), None);
    assert_eq!(expiry_in_bounds(216_001), None);
}
