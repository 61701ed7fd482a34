use crate::domain::CacheKey;
use crate::error::ApiError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;

pub type SharedResponse = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

/// Reads currently on the wire, one per key.
#[derive(Default)]
pub struct InFlightTable {
    requests: DashMap<CacheKey, SharedResponse>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending read for `key`, or register the one `start` creates.
    /// The flag is true when this call started it. Lookup and insert happen
    /// under one shard lock, so two callers can never both start.
    pub fn join_or_start<F>(&self, key: CacheKey, start: F) -> (SharedResponse, bool)
    where
        F: FnOnce() -> SharedResponse,
    {
        match self.requests.entry(key) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let response = start();
                entry.insert(response.clone());
                (response, true)
            }
        }
    }

    pub fn remove(&self, key: &CacheKey) {
        self.requests.remove(key);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
