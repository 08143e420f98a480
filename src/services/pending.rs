//! Correlates notifications with the requests that caused them.
//!
//! Every request registers the key it expects (a CREATE2 salt, a transaction
//! hash) and receives a one-shot handle. The listener resolves keys in
//! whatever order the chain reports them. A value that arrives before its key
//! is registered is held until someone asks for it.
//!
//! A key leaves the map as soon as its value is handed over. The same event is
//! usually reported twice (receipt logs and the poller), so finished keys are
//! remembered in a bounded history to reject the repeat instead of buffering
//! it as a new value.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::errors::{DaoError, Result};

/// Finished keys kept for duplicate detection.
pub const FINISHED_HISTORY: u64 = 1024;

enum Slot<V> {
    Waiting(oneshot::Sender<V>),
    Arrived(V),
}

/// Outcome of feeding one value into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A registered handle received the value.
    Delivered,
    /// Nobody asked yet; the value is kept for a later `register`.
    Buffered,
    /// The key already had a value.
    Duplicate,
    /// The handle was dropped before the value arrived.
    Abandoned,
}

pub struct PendingRegistry<K, V> {
    slots: DashMap<K, Slot<V>>,
    finished: DashMap<K, u64>,
    sequence: AtomicU64,
}

pub struct PendingHandle<V> {
    what: String,
    state: HandleState<V>,
}

enum HandleState<V> {
    Ready(V),
    Waiting(oneshot::Receiver<V>),
}

impl<K, V> PendingRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            finished: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Announce interest in `key`. Fails if the key was registered before.
    pub fn register(&self, key: K) -> Result<PendingHandle<V>> {
        let what = format!("{:?}", key);
        let duplicate = || DaoError::Internal(format!("{} is already registered", what));

        if self.finished.contains_key(&key) {
            return Err(duplicate());
        }

        match self.slots.entry(key.clone()) {
            Entry::Vacant(entry) => {
                let (sender, receiver) = oneshot::channel();
                entry.insert(Slot::Waiting(sender));
                Ok(PendingHandle {
                    what: what.clone(),
                    state: HandleState::Waiting(receiver),
                })
            }
            Entry::Occupied(entry) => {
                if !matches!(entry.get(), Slot::Arrived(_)) {
                    return Err(duplicate());
                }
                let slot = entry.remove();
                self.finish(key);
                match slot {
                    Slot::Arrived(value) => {
                        debug!("{} was already buffered", what);
                        Ok(PendingHandle {
                            what: what.clone(),
                            state: HandleState::Ready(value),
                        })
                    }
                    Slot::Waiting(_) => Err(duplicate()),
                }
            }
        }
    }

    pub fn resolve(&self, key: K, value: V) -> Resolution {
        if self.finished.contains_key(&key) {
            debug!("Ignoring repeated notification for {:?}", key);
            return Resolution::Duplicate;
        }

        match self.slots.entry(key.clone()) {
            Entry::Vacant(entry) => {
                debug!("Buffering unmatched notification for {:?}", entry.key());
                entry.insert(Slot::Arrived(value));
                Resolution::Buffered
            }
            Entry::Occupied(entry) => {
                if !matches!(entry.get(), Slot::Waiting(_)) {
                    debug!("Ignoring repeated notification for {:?}", entry.key());
                    return Resolution::Duplicate;
                }
                let slot = entry.remove();
                self.finish(key.clone());
                match slot {
                    Slot::Waiting(sender) => match sender.send(value) {
                        Ok(()) => Resolution::Delivered,
                        Err(_) => {
                            debug!("Handle for {:?} was dropped", key);
                            Resolution::Abandoned
                        }
                    },
                    Slot::Arrived(_) => Resolution::Duplicate,
                }
            }
        }
    }

    /// Remember `key` as finished and forget the oldest entries beyond
    /// `FINISHED_HISTORY`.
    fn finish(&self, key: K) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.finished.insert(key, seq);
        if self.finished.len() as u64 > FINISHED_HISTORY {
            let oldest_kept = seq.saturating_sub(FINISHED_HISTORY);
            self.finished.retain(|_, finished_at| *finished_at > oldest_kept);
        }
    }

    /// Keys registered and still waiting for their value.
    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Waiting(_)))
            .count()
    }

    /// Values that arrived without a registered key.
    pub fn buffered_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Arrived(_)))
            .count()
    }

    /// Keys currently held in the map, waiting or buffered.
    pub fn tracked_count(&self) -> usize {
        self.slots.len()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }
}

impl<K, V> Default for PendingRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PendingHandle<V> {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }

    /// Wait at most `timeout` for the value.
    pub async fn wait(self, timeout: Duration) -> Result<V> {
        let receiver = match self.state {
            HandleState::Ready(value) => return Ok(value),
            HandleState::Waiting(receiver) => receiver,
        };
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(DaoError::Internal(format!(
                "Registry dropped before {} resolved",
                self.what
            ))),
            Err(_) => Err(DaoError::EventTimeout {
                what: self.what,
                waited_secs: timeout.as_secs(),
            }),
        }
    }
}
