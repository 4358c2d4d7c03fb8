//! Shared connection lifecycle
//!
//! Tracks the `Closed -> Open | Failed` state machine every engine follows.
//! The connect closure runs under an async mutex, so concurrent first callers
//! share a single attempt. A failed attempt is memoized: later calls get a
//! connection error straight away until the engine is finalized.

use stash_domain::{CacheName, EngineKind, EngineState, Error, ErrorMetadata, Operation, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Mutex;

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const FAILED: u8 = 2;

enum Link<C> {
    Closed,
    Open(C),
    Failed(String),
}

/// Connection state plus the handle `C` an open engine works with
pub(crate) struct Lifecycle<C> {
    kind: EngineKind,
    name: CacheName,
    link: Mutex<Link<C>>,
    state: AtomicU8,
}

impl<C: Clone + Send> Lifecycle<C> {
    pub(crate) fn new(kind: EngineKind, name: CacheName) -> Self {
        Self {
            kind,
            name,
            link: Mutex::new(Link::Closed),
            state: AtomicU8::new(CLOSED),
        }
    }

    pub(crate) fn name(&self) -> &CacheName {
        &self.name
    }

    /// Metadata naming this engine and its instance
    pub(crate) fn metadata(&self) -> ErrorMetadata {
        ErrorMetadata::new()
            .engine(self.kind)
            .instance(self.name.as_str())
    }

    pub(crate) fn state(&self) -> EngineState {
        match self.state.load(Ordering::Acquire) {
            OPEN => EngineState::Open,
            FAILED => EngineState::Failed,
            _ => EngineState::Closed,
        }
    }

    /// Return the open handle, connecting with `connect` if still closed
    pub(crate) async fn connect<F, Fut>(&self, connect: F) -> Result<C>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C>>,
    {
        let mut link = self.link.lock().await;
        match &*link {
            Link::Open(handle) => Ok(handle.clone()),
            Link::Failed(reason) => {
                tracing::warn!(
                    engine = %self.kind,
                    instance = %self.name,
                    "rejecting call, engine failed to connect earlier"
                );
                Err(Error::connection(
                    format!("engine unavailable after failed connect ({reason}); finalize to retry"),
                    self.metadata().operation(Operation::Init),
                ))
            }
            Link::Closed => match connect().await {
                Ok(handle) => {
                    *link = Link::Open(handle.clone());
                    self.state.store(OPEN, Ordering::Release);
                    tracing::info!(
                        engine = %self.kind,
                        instance = %self.name,
                        "cache engine connected"
                    );
                    Ok(handle)
                }
                Err(e) => {
                    *link = Link::Failed(e.message().to_string());
                    self.state.store(FAILED, Ordering::Release);
                    tracing::error!(
                        engine = %self.kind,
                        instance = %self.name,
                        error = %e,
                        "cache engine connect failed"
                    );
                    Err(e)
                }
            },
        }
    }

    /// Drop the handle and return to `Closed`, clearing a memoized failure
    pub(crate) async fn disconnect(&self) -> Option<C> {
        let mut link = self.link.lock().await;
        let previous = std::mem::replace(&mut *link, Link::Closed);
        self.state.store(CLOSED, Ordering::Release);
        match previous {
            Link::Open(handle) => {
                tracing::info!(
                    engine = %self.kind,
                    instance = %self.name,
                    "cache engine disconnected"
                );
                Some(handle)
            }
            Link::Closed | Link::Failed(_) => None,
        }
    }

    /// Return to `Closed` after the open handle broke mid-operation.
    ///
    /// `is_broken` sees the current handle; a handle another caller already
    /// replaced is left alone. Returns whether the link was dropped.
    #[cfg_attr(not(feature = "cache-memcached"), allow(dead_code))]
    pub(crate) async fn invalidate<P>(&self, is_broken: P) -> bool
    where
        P: FnOnce(&C) -> bool,
    {
        let mut link = self.link.lock().await;
        let broken = match &*link {
            Link::Open(handle) => is_broken(handle),
            Link::Closed | Link::Failed(_) => false,
        };
        if broken {
            *link = Link::Closed;
            self.state.store(CLOSED, Ordering::Release);
            tracing::warn!(
                engine = %self.kind,
                instance = %self.name,
                "cache engine connection lost, reconnecting on next call"
            );
        }
        broken
    }
}
