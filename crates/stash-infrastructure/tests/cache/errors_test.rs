//! Error attribution at the contract boundary

use async_trait::async_trait;
use stash_domain::{
    CacheEngine, CacheName, CacheOptions, EngineKind, EngineState, Error, ErrorKind,
    ErrorMetadata, Operation, Result, SetOptions,
};
use stash_infrastructure::Cache;
use std::sync::Arc;

/// Engine that is always open and fails every primitive
#[derive(Debug)]
struct BrokenEngine {
    typed: bool,
}

impl BrokenEngine {
    fn fail<T>(&self) -> Result<T> {
        if self.typed {
            Err(Error::connection(
                "link dropped",
                ErrorMetadata::new().engine(EngineKind::Redis).instance("broken"),
            ))
        } else {
            Err(Error::backend("socket closed"))
        }
    }
}

#[async_trait]
impl CacheEngine for BrokenEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Redis
    }

    fn state(&self) -> EngineState {
        EngineState::Open
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        self.fail()
    }

    async fn read(&self, _key: &str) -> Result<Option<String>> {
        self.fail()
    }

    async fn write(&self, _key: &str, _payload: &str, _expiry: u64) -> Result<()> {
        self.fail()
    }

    async fn renew(&self, _key: &str, _payload: &str, _expiry: u64) -> Result<()> {
        self.fail()
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        self.fail()
    }

    async fn clear(&self, _prefix: &str) -> Result<u64> {
        self.fail()
    }
}

fn broken_cache(typed: bool) -> Cache {
    let name = CacheName::new("broken").unwrap();
    let config = CacheOptions::redis("localhost").resolve(&name).unwrap();
    Cache::with_engine(name, config, Arc::new(BrokenEngine { typed }))
}

#[tokio::test]
async fn test_raw_failures_become_operation_errors() {
    let cache = broken_cache(false);

    let cases = [
        (cache.has(" Key ").await.map(|_| ()), Operation::Has),
        (cache.get::<i32>(" Key ").await.map(|_| ()), Operation::Get),
        (cache.set(" Key ", &1, SetOptions::new()).await, Operation::Set),
        (cache.delete(" Key ").await, Operation::Delete),
    ];
    for (result, operation) in cases {
        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Operation);
        let metadata = error.metadata().unwrap();
        assert_eq!(metadata.engine, Some(EngineKind::Redis));
        assert_eq!(metadata.instance.as_deref(), Some("broken"));
        assert_eq!(metadata.operation, Some(operation));
        assert_eq!(metadata.key.as_deref(), Some("key"));
        assert!(error.to_string().contains("socket closed"));
    }

    let error = cache.clear().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Operation);
    assert_eq!(error.metadata().unwrap().operation, Some(Operation::Clear));
    assert_eq!(error.metadata().unwrap().key, None);
}

#[tokio::test]
async fn test_typed_failures_pass_through() {
    let cache = broken_cache(true);

    let error = cache.get::<i32>("k").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Connection);
    assert_eq!(error.message(), "link dropped");
    assert_eq!(error.metadata().unwrap().operation, None);
}
