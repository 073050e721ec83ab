//! MultiChannelQueue - central coordination for the multi-channel queue
//!
//! The coordinator owns the channel registry, the global order list, the
//! global admission pool and the wake notifier. Every structural operation
//! (registering channels, appending to the order list, the fairness scan,
//! explicit removal, clearing) runs under the registry/order locks; permit
//! pools are counting primitives acquired and released without holding
//! either lock.
//!
//! # Thread Safety
//!
//! `MultiChannelQueue` is fully thread-safe and is shared across tasks as
//! `Arc<MultiChannelQueue<ID, T>>`. Lock guards are never held across await
//! points; blocking waits are expressed through the admission semaphore, the
//! channels' space notifiers and the coordinator's wake notifier.
//!
//! # Delivery order
//!
//! `take` scans the global order list head to tail and hands off the first
//! entry whose channel still has spare per-channel concurrency. Among all
//! currently deliverable items the earliest-arrived wins, wherever it was
//! produced; entries of saturated channels are left in place and reconsidered
//! on every later scan. The scan is O(buffered items) in the worst case,
//! which is the accepted cost of cross-channel fairness.

use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use crate::queue::channel::Channel;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::{ChannelStats, QueueStats};
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::time::timeout;

/// Multi-channel rate-limited queue
///
/// Multiplexes many independent channels of pending items into a single
/// consumer pool while enforcing two concurrency caps at once: each channel's
/// own in-flight cap and a global cap across all channels. Producers are
/// slowed by per-channel buffer capacity; consumers receive items in global
/// insertion order among the channels that currently have spare concurrency.
///
/// Every item returned by [`take`](Self::take) must be matched by exactly one
/// [`consumed`](Self::consumed) call, which returns the permits the delivery
/// checked out.
///
/// # Example
///
/// ```rust,no_run
/// use ratequeue::queue::MultiChannelQueue;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(8);
/// queue.add_channel("tenant-a".to_string(), 16, 2)?;
///
/// queue.add(&"tenant-a".to_string(), "job-1".to_string()).await?;
///
/// let (id, job) = queue.take().await?;
/// // ... process job ...
/// queue.consumed(&id)?;
/// # Ok(())
/// # }
/// ```
pub struct MultiChannelQueue<ID, T> {
    /// Registry of all channels, keyed by caller-supplied identifier
    channels: RwLock<HashMap<ID, Arc<Channel<T>>>>,

    /// Global order list: one (id, item) pair per buffered item, in
    /// cross-channel insertion order
    order: Mutex<VecDeque<(ID, Arc<T>)>>,

    /// Global admission pool bounding total in-flight items
    admission: Arc<Semaphore>,

    /// Initial size of the admission pool
    max_concurrency: usize,

    /// Signalled when an entry is appended or a per-channel permit returns
    wake: Notify,
}

impl<ID, T> MultiChannelQueue<ID, T>
where
    ID: Clone + Eq + Hash + fmt::Debug,
    T: PartialEq,
{
    /// Create a queue with the given global in-flight cap
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrency` is zero.
    pub fn new(max_concurrency: usize) -> Self {
        assert!(max_concurrency > 0, "max_concurrency must be positive");
        Self {
            channels: RwLock::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            admission: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            wake: Notify::new(),
        }
    }

    /// Register a new channel
    ///
    /// Returns `Ok(true)` if the channel was installed, `Ok(false)` if the id
    /// already existed; an existing channel is left untouched, its capacity
    /// and concurrency are not updated.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `capacity` or `max_concurrency` is zero.
    pub fn add_channel(&self, id: ID, capacity: usize, max_concurrency: usize) -> QueueResult<bool> {
        if capacity == 0 {
            return Err(QueueError::InvalidConfiguration {
                message: "channel capacity must be positive".to_string(),
            });
        }
        if max_concurrency == 0 {
            return Err(QueueError::InvalidConfiguration {
                message: "channel max_concurrency must be positive".to_string(),
            });
        }

        let mut channels = handle_rwlock_write(self.channels.write(), |message| {
            QueueError::Synchronization { message }
        })?;
        if channels.contains_key(&id) {
            return Ok(false);
        }

        debug!(
            "registering channel {:?} (capacity {}, max concurrency {})",
            id, capacity, max_concurrency
        );
        channels.insert(id, Arc::new(Channel::new(capacity, max_concurrency)));
        Ok(true)
    }

    /// Unregister a channel and return whatever was still buffered in it
    ///
    /// Returns an empty list for an unknown id. The channel's entries are
    /// purged from the global order list in the same structural section, so
    /// later scans never see them.
    ///
    /// A `take` that had already selected one of this channel's items during
    /// its scan may still return that item after the channel is gone; this is
    /// accepted behaviour, and the matching `consumed` call releases only the
    /// global permit.
    pub fn remove_channel(&self, id: &ID) -> QueueResult<Vec<Arc<T>>> {
        let mut channels = handle_rwlock_write(self.channels.write(), |message| {
            QueueError::Synchronization { message }
        })?;
        let Some(channel) = channels.remove(id) else {
            return Ok(Vec::new());
        };

        let mut order = handle_mutex_poison(self.order.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        order.retain(|(queued_id, _)| queued_id != id);
        drop(order);
        drop(channels);

        debug!("removed channel {:?}", id);
        channel.drain()
    }

    /// Add an item to a channel, waiting while the channel's buffer is full
    ///
    /// # Errors
    ///
    /// `ChannelNotFound` if `id` was never registered or has been removed;
    /// targeting an unregistered channel is a usage error, not a timeout.
    pub async fn add(&self, id: &ID, item: T) -> QueueResult<()> {
        let channel = self.require_channel(id)?;
        let item = Arc::new(item);
        channel.enqueue(Arc::clone(&item)).await?;
        self.publish_entry(id.clone(), item)
    }

    /// Add an item, waiting at most `wait` for buffer space
    ///
    /// Returns `Ok(false)` if the buffer stayed full for the whole wait; the
    /// global order list is untouched in that case.
    pub async fn add_timeout(&self, id: &ID, item: T, wait: Duration) -> QueueResult<bool> {
        let channel = self.require_channel(id)?;
        let item = Arc::new(item);
        match timeout(wait, channel.enqueue(Arc::clone(&item))).await {
            Ok(enqueued) => {
                enqueued?;
                self.publish_entry(id.clone(), item)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Take the earliest deliverable item, waiting as long as it takes
    ///
    /// Acquires one global admission permit, then scans the order list for
    /// the earliest entry whose channel yields a per-channel permit. When no
    /// entry qualifies the call waits for the next structural change (item
    /// added, permit returned) and rescans.
    ///
    /// The returned item is in flight until [`consumed`](Self::consumed) is
    /// called with its channel id. If the future is dropped before an item is
    /// handed off, the admission permit goes back to the pool.
    pub async fn take(&self) -> QueueResult<(ID, Arc<T>)> {
        // Held as a guard until hand-off so any non-delivering exit,
        // cancellation included, returns the permit
        let permit = Arc::clone(&self.admission)
            .acquire_owned()
            .await
            .map_err(|_| QueueError::Synchronization {
                message: "admission pool closed".to_string(),
            })?;

        let notified = self.wake.notified();
        tokio::pin!(notified);
        loop {
            notified.as_mut().enable();
            if let Some((id, item)) = self.claim_earliest()? {
                permit.forget();
                trace!("delivered item from channel {:?}", id);
                return Ok((id, item));
            }
            notified.as_mut().await;
            notified.set(self.wake.notified());
        }
    }

    /// Take the earliest deliverable item, waiting at most `wait`
    ///
    /// Returns `Ok(None)` if nothing became deliverable in time. The bound
    /// covers the whole operation, the admission-pool wait included, and an
    /// expired wait always returns the admission permit to the pool.
    pub async fn take_timeout(&self, wait: Duration) -> QueueResult<Option<(ID, Arc<T>)>> {
        match timeout(wait, self.take()).await {
            Ok(taken) => taken.map(Some),
            // Dropping the inner future released the admission permit
            Err(_) => Ok(None),
        }
    }

    /// Remove a still-buffered item from a channel
    ///
    /// Removes the first occurrence equal to `item` from both the channel
    /// buffer and the global order list. Returns `Ok(false)` if the channel
    /// does not exist or the item is not buffered (already delivered, or
    /// never added).
    pub fn remove(&self, id: &ID, item: &T) -> QueueResult<bool> {
        let channels = handle_rwlock_read(self.channels.read(), |message| {
            QueueError::Synchronization { message }
        })?;
        let Some(channel) = channels.get(id).map(Arc::clone) else {
            return Ok(false);
        };

        // Both removals happen under the order lock so no scan observes one
        // without the other
        let mut order = handle_mutex_poison(self.order.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        if let Some(position) = order
            .iter()
            .position(|(queued_id, queued)| queued_id == id && **queued == *item)
        {
            order.remove(position);
        }
        channel.remove_item(item)
    }

    /// Report one previously taken item as consumed
    ///
    /// Always returns the global admission permit first. The per-channel
    /// permit is returned and waiters are woken only if the channel is still
    /// registered; after `remove_channel` there is nothing left to release
    /// into.
    pub fn consumed(&self, id: &ID) -> QueueResult<()> {
        self.admission.add_permits(1);

        let released = {
            let channels = handle_rwlock_read(self.channels.read(), |message| {
                QueueError::Synchronization { message }
            })?;
            match channels.get(id) {
                Some(channel) => {
                    channel.release_permit();
                    true
                }
                None => false,
            }
        };

        if released {
            self.wake.notify_waiters();
        }
        Ok(())
    }

    /// Empty every channel buffer, the registry and the global order list
    ///
    /// Permit pools are untouched: permits held by items already delivered
    /// stay checked out until their consumers call
    /// [`consumed`](Self::consumed).
    pub fn clear(&self) -> QueueResult<()> {
        let mut channels = handle_rwlock_write(self.channels.write(), |message| {
            QueueError::Synchronization { message }
        })?;
        let mut order = handle_mutex_poison(self.order.lock(), |message| {
            QueueError::Synchronization { message }
        })?;

        for channel in channels.values() {
            channel.clear()?;
        }
        channels.clear();
        order.clear();

        debug!("cleared all channels and buffered entries");
        Ok(())
    }

    /// Check whether a channel is currently registered
    pub fn contains_channel(&self, id: &ID) -> bool {
        self.channels
            .read()
            .map(|channels| channels.contains_key(id))
            .unwrap_or(false)
    }

    /// Ids of all currently registered channels, in no particular order
    pub fn channel_ids(&self) -> Vec<ID> {
        self.channels
            .read()
            .map(|channels| channels.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.channels
            .read()
            .map(|channels| channels.len())
            .unwrap_or(0)
    }

    /// Total buffered (undelivered) items across all channels
    pub fn buffered_len(&self) -> usize {
        self.order.lock().map(|order| order.len()).unwrap_or(0)
    }

    /// Snapshot of one channel, or `None` if it is not registered
    pub fn channel_stats(&self, id: &ID) -> Option<ChannelStats> {
        let channels = self.channels.read().ok()?;
        let channel = channels.get(id)?;
        Some(channel.stats())
    }

    /// Snapshot of the whole structure
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            channels: self.channel_count(),
            buffered_items: self.buffered_len(),
            in_flight: self
                .max_concurrency
                .saturating_sub(self.admission.available_permits()),
            max_concurrency: self.max_concurrency,
        }
    }

    /// Look up a channel, treating absence as a usage error
    fn require_channel(&self, id: &ID) -> QueueResult<Arc<Channel<T>>> {
        let channels = handle_rwlock_read(self.channels.read(), |message| {
            QueueError::Synchronization { message }
        })?;
        channels
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| QueueError::ChannelNotFound {
                id: format!("{:?}", id),
            })
    }

    /// Append a buffered item's entry to the order list and wake scanners
    fn publish_entry(&self, id: ID, item: Arc<T>) -> QueueResult<()> {
        let mut order = handle_mutex_poison(self.order.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        order.push_back((id, item));
        drop(order);
        self.wake.notify_waiters();
        Ok(())
    }

    /// One fairness scan: hand off the earliest deliverable entry, if any
    ///
    /// Entries of saturated channels are skipped in place. Entries whose
    /// channel is gone are dropped; `remove_channel` purges under the
    /// structural locks, but an `add` that raced it can still append one
    /// stale pair afterwards.
    fn claim_earliest(&self) -> QueueResult<Option<(ID, Arc<T>)>> {
        let channels = handle_rwlock_read(self.channels.read(), |message| {
            QueueError::Synchronization { message }
        })?;
        let mut order = handle_mutex_poison(self.order.lock(), |message| {
            QueueError::Synchronization { message }
        })?;

        let mut index = 0;
        while index < order.len() {
            let channel = channels.get(&order[index].0).map(Arc::clone);
            let Some(channel) = channel else {
                warn!(
                    "dropping orphaned entry for removed channel {:?}",
                    order[index].0
                );
                order.remove(index);
                continue;
            };

            if !channel.try_acquire_permit() {
                index += 1;
                continue;
            }

            match order.remove(index) {
                Some((id, item)) => {
                    if !channel.remove_entry(&item)? {
                        warn!("item missing from channel {:?} buffer during hand-off", id);
                    }
                    return Ok(Some((id, item)));
                }
                None => channel.release_permit(),
            }
        }

        Ok(None)
    }
}
