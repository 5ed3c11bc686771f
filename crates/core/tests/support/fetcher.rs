use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tidepool_core::{ResourceFetcher, WorkingSetSource};
use tidepool_domain::{FetchError, ResourceIdentity, WarmItem};

/// One scripted network outcome
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Vec<u8>),
    Fail(FetchError),
    /// Never settles
    Hang,
    /// Settles with the payload after a delay (tokio time)
    Delayed(Duration, Vec<u8>),
}

impl Reply {
    pub fn ok(payload: &str) -> Self {
        Self::Ok(payload.as_bytes().to_vec())
    }

    pub fn status(status: u16) -> Self {
        Self::Fail(FetchError::Status { status })
    }
}

/// `ResourceFetcher` that plays back scripted replies per key.
///
/// Replies queue up per key; the last one repeats once the queue is down to
/// it. Unscripted keys fail with a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: AtomicUsize,
    calls_by_key: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, reply: Reply) -> Self {
        self.push(key, reply);
        self
    }

    pub fn push(&self, key: &str, reply: Reply) {
        self.routes.lock().entry(key.to_string()).or_default().push_back(reply);
    }

    /// Replace the whole script for `key`
    pub fn set(&self, key: &str, reply: Reply) {
        self.routes.lock().insert(key.to_string(), VecDeque::from([reply]));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls_by_key.lock().get(key).copied().unwrap_or(0)
    }

    fn next_reply(&self, key: &str) -> Reply {
        let mut routes = self.routes.lock();
        match routes.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::status(404)),
            None => Reply::status(404),
        }
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, identity: &ResourceIdentity) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_key.lock().entry(identity.to_string()).or_default() += 1;

        match self.next_reply(identity.as_str()) {
            Reply::Ok(payload) => Ok(payload),
            Reply::Fail(err) => Err(err),
            Reply::Hang => std::future::pending().await,
            Reply::Delayed(delay, payload) => {
                tokio::time::sleep(delay).await;
                Ok(payload)
            }
        }
    }
}

/// `WorkingSetSource` returning a fixed list
#[derive(Default)]
pub struct StaticWorkingSet {
    items: Vec<WarmItem>,
    requested_limit: AtomicUsize,
}

impl StaticWorkingSet {
    pub fn new(items: Vec<WarmItem>) -> Self {
        Self { items, requested_limit: AtomicUsize::new(0) }
    }

    pub fn requested_limit(&self) -> usize {
        self.requested_limit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkingSetSource for StaticWorkingSet {
    async fn recent(&self, _scope_id: &str, limit: usize) -> Result<Vec<WarmItem>, FetchError> {
        self.requested_limit.store(limit, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

/// `WorkingSetSource` whose listing never settles
#[derive(Default)]
pub struct HangingWorkingSet;

#[async_trait]
impl WorkingSetSource for HangingWorkingSet {
    async fn recent(&self, _scope_id: &str, _limit: usize) -> Result<Vec<WarmItem>, FetchError> {
        std::future::pending().await
    }
}
