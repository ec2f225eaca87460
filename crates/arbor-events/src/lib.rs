//! Change-notification channel between the editing layer and whatever
//! re-triggers semantic evaluation.
//!
//! Best-effort, non-blocking broadcast: each subscription owns a bounded
//! buffer, and publishing to a full buffer drops the newly published event
//! rather than blocking the publisher or evicting older events. Delivery is
//! by explicit drain; there is no dispatcher thread.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use smallvec::SmallVec;
use tracing::trace;

/// A broadcastable event with a kind tag subscribers can filter on.
pub trait Event: Clone {
    type Kind: Clone + Eq;

    fn kind(&self) -> Self::Kind;
}

struct Buffer<E> {
    queue: VecDeque<E>,
    capacity: usize,
    dropped: u64,
}

struct Entry<E: Event> {
    /// `None` subscribes to every kind.
    kinds: Option<SmallVec<[E::Kind; 4]>>,
    buffer: Weak<Mutex<Buffer<E>>>,
}

/// Broadcast hub. Publishing walks every live subscription.
pub struct EventBus<E: Event> {
    entries: Vec<Entry<E>>,
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        EventBus {
            entries: Vec::new(),
        }
    }

    /// Subscribes to the given kinds with a buffer of `capacity` events.
    pub fn subscribe(
        &mut self,
        capacity: usize,
        kinds: impl IntoIterator<Item = E::Kind>,
    ) -> Subscription<E> {
        self.add_entry(capacity, Some(kinds.into_iter().collect()))
    }

    /// Subscribes to every event kind.
    pub fn subscribe_all(&mut self, capacity: usize) -> Subscription<E> {
        self.add_entry(capacity, None)
    }

    fn add_entry(
        &mut self,
        capacity: usize,
        kinds: Option<SmallVec<[E::Kind; 4]>>,
    ) -> Subscription<E> {
        let buffer = Arc::new(Mutex::new(Buffer {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }));
        self.entries.push(Entry {
            kinds,
            buffer: Arc::downgrade(&buffer),
        });
        Subscription { buffer }
    }

    /// Publishes an event to every matching live subscription.
    ///
    /// Never blocks; full buffers drop this event and count it. Dead
    /// subscriptions are pruned as a side effect.
    pub fn publish(&mut self, event: E) {
        let kind = event.kind();
        self.entries.retain(|entry| {
            let buffer = match entry.buffer.upgrade() {
                Some(buffer) => buffer,
                None => return false,
            };
            if let Some(kinds) = &entry.kinds {
                if !kinds.contains(&kind) {
                    return true;
                }
            }
            let mut guard = lock(&buffer);
            if guard.queue.len() >= guard.capacity {
                guard.dropped += 1;
                trace!(dropped = guard.dropped, "event buffer full, shedding newest event");
            } else {
                guard.queue.push_back(event.clone());
            }
            true
        });
    }

    /// Number of live subscriptions (dead ones are pruned lazily).
    pub fn subscriber_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.buffer.strong_count() > 0)
            .count()
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<E>(buffer: &Arc<Mutex<Buffer<E>>>) -> MutexGuard<'_, Buffer<E>> {
    match buffer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Receiving side of one subscription. Dropping it unsubscribes.
pub struct Subscription<E> {
    buffer: Arc<Mutex<Buffer<E>>>,
}

impl<E> Subscription<E> {
    /// Takes all buffered events, in publish order.
    pub fn drain(&self) -> Vec<E> {
        lock(&self.buffer).queue.drain(..).collect()
    }

    /// Takes the oldest buffered event, if any.
    pub fn poll(&self) -> Option<E> {
        lock(&self.buffer).queue.pop_front()
    }

    /// Number of events shed because the buffer was full.
    pub fn dropped(&self) -> u64 {
        lock(&self.buffer).dropped
    }

    pub fn len(&self) -> usize {
        lock(&self.buffer).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.buffer).queue.is_empty()
    }
}
