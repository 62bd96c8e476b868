use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::slice::{Slice, SliceValue, SubscriptionId};

/// Callback type for state change notifications.
pub type ChangeHandler = Arc<dyn Fn(&str, &SliceValue) + Send + Sync>;

thread_local! {
    // True while this thread is delivering notifications. Writes made
    // from inside a handler are stored but not fanned out again, so a
    // handler that writes state can never loop the store.
    static DELIVERING: Cell<bool> = Cell::new(false);
}

/// Per-path state store with prefix-matched subscription routing.
///
/// - `put(slice)` / `set(path, value)` store a value and notify matching
///   subscribers synchronously.
/// - `read::<S>()` / `get(path)` read the current value.
/// - `subscribe(prefix, handler)` registers a change handler; an empty
///   prefix observes every path.
/// - `unsubscribe(id)` removes a handler.
///
/// Uses `BTreeMap` internally for ordered snapshots.
pub struct StateStore {
    /// Current state values, keyed by exact path.
    values: RwLock<BTreeMap<String, SliceValue>>,
    /// Registered subscribers, scanned in subscription order.
    subscribers: RwLock<Vec<Subscriber>>,
    /// Monotonic counter for subscription IDs.
    next_id: AtomicU64,
}

struct Subscriber {
    id: SubscriptionId,
    prefix: String,
    handler: ChangeHandler,
}

struct DeliveryReset;

impl Drop for DeliveryReset {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(false));
    }
}

/// Prefix match: exact path, subtree under `{prefix}/`, or everything
/// for the empty prefix.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if path == prefix {
        return true;
    }
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'/'
}

impl StateStore {
    /// Create a new empty StateStore.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a typed slice at its fixed path and notify subscribers.
    pub fn put<S: Slice>(&self, slice: S) {
        self.set(S::PATH, SliceValue::new(slice));
    }

    /// Read a typed slice, cloning it out of the store.
    ///
    /// Returns `None` if the path is empty or holds a different type.
    pub fn read<S: Slice>(&self) -> Option<S> {
        self.get(S::PATH)?.downcast_ref::<S>().cloned()
    }

    /// Set a value at the given path and notify matching subscribers.
    ///
    /// Handlers run synchronously on the calling thread, after the value
    /// is visible to readers. Writes made from inside a handler are
    /// stored without a second round of notifications.
    pub fn set(&self, path: &str, value: SliceValue) {
        {
            let mut values = self.values.write().unwrap();
            values.insert(path.to_string(), value.clone());
        }

        if DELIVERING.with(|d| d.get()) {
            trace!("StateStore: nested set {} stored without notification", path);
            return;
        }

        // Snapshot matching handlers so subscribers can be added or
        // removed from inside a callback without deadlocking.
        let matching: Vec<ChangeHandler> = {
            let subs = self.subscribers.read().unwrap();
            subs.iter()
                .filter(|s| prefix_matches(&s.prefix, path))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        trace!("StateStore: set {} ({} subscribers)", path, matching.len());
        DELIVERING.with(|d| d.set(true));
        // Reset even if a handler panics, or the store would go silent
        // on this thread.
        let _reset = DeliveryReset;
        for handler in matching {
            handler(path, &value);
        }
    }

    /// Get the current value at the given path (Arc clone, cheap).
    pub fn get(&self, path: &str) -> Option<SliceValue> {
        let values = self.values.read().unwrap();
        values.get(path).cloned()
    }

    /// Remove the value at the given path.
    ///
    /// Returns the old value if present. Does NOT notify subscribers.
    pub fn remove(&self, path: &str) -> Option<SliceValue> {
        let mut values = self.values.write().unwrap();
        values.remove(path)
    }

    /// Subscribe to changes on paths matching the given prefix.
    ///
    /// The handler is called synchronously for every `put`/`set` whose
    /// path equals the prefix or lives under `{prefix}/`. The empty
    /// prefix observes everything.
    pub fn subscribe<F>(&self, prefix: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &SliceValue) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().unwrap().push(Subscriber {
            id,
            prefix: prefix.to_string(),
            handler: Arc::new(handler),
        });
        id
    }

    /// Unsubscribe a handler by its subscription ID.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().unwrap().retain(|s| s.id != id);
    }

    /// Get a snapshot of all paths and values, ordered by path.
    pub fn snapshot(&self) -> Vec<(String, SliceValue)> {
        let values = self.values.read().unwrap();
        values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get the total number of stored paths.
    pub fn len(&self) -> usize {
        let values = self.values.read().unwrap();
        values.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
