//! Handle-based subscriptions keyed by trip or station.
//!
//! Each subscriber owns a bounded channel. Publishing clones the sender list
//! under the lock and delivers outside it, so a subscriber may come or go
//! while an update is in flight.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Topics<K, T> {
    next_id: u64,
    senders: HashMap<K, Vec<(SubscriptionId, mpsc::Sender<T>)>>,
}

pub(crate) struct Registry<K, T> {
    topics: Mutex<Topics<K, T>>,
    capacity: usize,
}

impl<K, T> Registry<K, T>
where
    K: Clone + Eq + Hash + std::fmt::Display,
    T: Clone,
{
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            topics: Mutex::new(Topics {
                next_id: 0,
                senders: HashMap::new(),
            }),
            capacity: capacity.max(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Topics<K, T>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(self: &Arc<Self>, key: K) -> Subscription<K, T> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let mut topics = self.lock();
        let id = SubscriptionId(topics.next_id);
        topics.next_id += 1;
        topics.senders.entry(key.clone()).or_default().push((id, sender));

        Subscription {
            id,
            key,
            receiver,
            registry: Arc::downgrade(self),
        }
    }

    pub(crate) fn remove(&self, key: &K, id: SubscriptionId) {
        let mut topics = self.lock();
        if let Some(list) = topics.senders.get_mut(key) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                topics.senders.remove(key);
            }
        }
    }

    /// Deliver `value` to everyone watching `key`
    pub(crate) fn publish(&self, key: &K, value: &T) {
        let targets = match self.lock().senders.get(key) {
            Some(list) => list.clone(),
            None => return,
        };

        for (id, sender) in targets {
            match sender.try_send(value.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%key, ?id, "subscriber lagging, update dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(%key, ?id, "subscriber channel closed");
                    self.remove(key, id);
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().senders.values().map(Vec::len).sum()
    }
}

/// A live feed for one trip or station.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription<K, T>
where
    K: Clone + Eq + Hash + std::fmt::Display,
    T: Clone,
{
    id: SubscriptionId,
    key: K,
    receiver: mpsc::Receiver<T>,
    registry: Weak<Registry<K, T>>,
}

impl<K, T> Subscription<K, T>
where
    K: Clone + Eq + Hash + std::fmt::Display,
    T: Clone,
{
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Wait for the next update. `None` once the live task has stopped.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl<K, T> Drop for Subscription<K, T>
where
    K: Clone + Eq + Hash + std::fmt::Display,
    T: Clone,
{
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.key, self.id);
        }
    }
}
