use std::collections::HashMap;
use std::sync::RwLock;

use crate::entry::CachedResponse;

/// Process-wide table of captured responses, keyed by resource.
///
/// One table-wide reader/writer lock: lookups share a read lock, mutations
/// take the write lock. Every operation holds the lock for a single map
/// access only. Constructed once and shared behind an `Arc`; there is no
/// expiry and no size bound.
#[derive(Debug, Default)]
pub struct ResponseStore {
    inner: RwLock<HashMap<String, CachedResponse>>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the entry for `resource`. `None` removes it.
    pub fn set(&self, resource: &str, response: Option<CachedResponse>) {
        let _ = self.inner.write().map(|mut map| match response {
            Some(resp) => {
                map.insert(resource.to_string(), resp);
            }
            None => {
                map.remove(resource);
            }
        });
    }

    /// Value copy of the stored entry, if any. Callers can mutate the copy
    /// freely without touching the table.
    pub fn get(&self, resource: &str) -> Option<CachedResponse> {
        self.inner.read().ok()?.get(resource).cloned()
    }

    /// Remove one entry. Removing an absent key is a no-op.
    pub fn remove(&self, resource: &str) {
        self.set(resource, None);
    }

    /// Discard all entries.
    pub fn clear(&self) {
        let _ = self.inner.write().map(|mut map| map.clear());
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
