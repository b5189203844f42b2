//! Deduplicating FIFO of addresses awaiting resolution
//!
//! An item sits in the pending set from the moment it is offered until the
//! consumer marks it completed, so at most one instance of an item is ever
//! queued or in flight. Paired with a single consumer this guarantees one
//! resolution attempt per address at a time without per-address locks.

use dashmap::DashSet;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

pub struct PendingWorkQueue<T> {
    /// Items offered and not yet marked completed
    pending: DashSet<T>,
    queue: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> PendingWorkQueue<T>
where
    T: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            pending: DashSet::new(),
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Queue `item` unless it is already pending
    ///
    /// Returns false (and does nothing) when the item was offered before and
    /// has not been marked completed yet.
    pub fn offer(&self, item: T) -> bool {
        if !self.pending.insert(item.clone()) {
            debug!(?item, "Item already pending");
            return false;
        }

        self.lock_queue().push_back(item);
        self.notify.notify_one();
        true
    }

    /// Offer each item, returning how many were newly queued
    pub fn offer_all<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .map(|item| self.offer(item))
            .filter(|added| *added)
            .count()
    }

    /// Wait until an item is available and remove it from the queue
    ///
    /// The item stays pending until [`mark_completed`](Self::mark_completed).
    /// Intended for a single consumer; dropping the future never loses an item.
    pub async fn take(&self) -> T {
        loop {
            let next = self.lock_queue().pop_front();
            if let Some(item) = next {
                return item;
            }
            self.notify.notified().await;
        }
    }

    /// Release `item` so it can be offered again
    pub fn mark_completed(&self, item: &T) {
        self.pending.remove(item);
        debug!(?item, "Item marked completed");
    }

    pub fn is_pending(&self, item: &T) -> bool {
        self.pending.contains(item)
    }

    /// Number of items waiting to be taken
    pub fn size(&self) -> usize {
        self.lock_queue().len()
    }

    /// Queued plus in-flight items
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for PendingWorkQueue<T>
where
    T: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
