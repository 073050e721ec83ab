//! Per-channel state: bounded FIFO buffer plus concurrency permit pool
//!
//! A `Channel` owns the items buffered for one registered identifier and the
//! permit pool that caps how many of its items may be in flight at once.
//! Producers block (await) on the buffer when it is full; the space notifier
//! is signalled whenever an item leaves the buffer, via delivery or explicit
//! removal. All cross-channel coordination lives in the coordinator; a
//! channel only guards its own buffer, so producing into one channel never
//! contends with another channel's buffer lock.

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::ChannelStats;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// One registered channel: bounded buffer + per-channel permits
///
/// Items are `Arc`-wrapped so the buffer and the coordinator's global order
/// list share them without cloning payloads. A permit acquired at hand-off is
/// forgotten rather than held in a guard, so it stays checked out until the
/// consumer reports completion, regardless of what happens to the structures
/// that delivered it.
pub(crate) struct Channel<T> {
    /// Buffered, not-yet-delivered items in insertion order
    buffer: Mutex<VecDeque<Arc<T>>>,

    /// Maximum buffer length; producers wait while at capacity
    capacity: usize,

    /// Per-channel in-flight cap (the permit pool's initial size)
    max_concurrency: usize,

    /// Signalled whenever an item leaves the buffer
    space: Notify,

    /// One permit per allowed in-flight item from this channel
    permits: Semaphore,
}

impl<T> Channel<T> {
    pub(crate) fn new(capacity: usize, max_concurrency: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            capacity,
            max_concurrency,
            space: Notify::new(),
            permits: Semaphore::new(max_concurrency),
        }
    }

    /// Append an item to the buffer, waiting while the buffer is full
    ///
    /// Waits indefinitely; callers bound the wait with `tokio::time::timeout`.
    /// The notification is registered before the capacity check so a removal
    /// that lands between the check and the await is not missed.
    pub(crate) async fn enqueue(&self, item: Arc<T>) -> QueueResult<()> {
        let notified = self.space.notified();
        tokio::pin!(notified);
        loop {
            notified.as_mut().enable();
            {
                let mut buffer = handle_mutex_poison(self.buffer.lock(), |message| {
                    QueueError::Synchronization { message }
                })?;
                if buffer.len() < self.capacity {
                    buffer.push_back(item);
                    return Ok(());
                }
            }
            notified.as_mut().await;
            notified.set(self.space.notified());
        }
    }

    /// Remove the exact buffered entry handed over by the fairness scan
    ///
    /// Matches by `Arc` identity, not value equality, so duplicate payloads in
    /// the buffer cannot make the scan and the buffer disagree about which
    /// entry was delivered.
    pub(crate) fn remove_entry(&self, item: &Arc<T>) -> QueueResult<bool> {
        let mut buffer = handle_mutex_poison(self.buffer.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        let Some(position) = buffer.iter().position(|queued| Arc::ptr_eq(queued, item)) else {
            return Ok(false);
        };
        buffer.remove(position);
        drop(buffer);
        self.space.notify_waiters();
        Ok(true)
    }

    /// Remove the first buffered item equal to `item`
    pub(crate) fn remove_item(&self, item: &T) -> QueueResult<bool>
    where
        T: PartialEq,
    {
        let mut buffer = handle_mutex_poison(self.buffer.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        let Some(position) = buffer.iter().position(|queued| **queued == *item) else {
            return Ok(false);
        };
        buffer.remove(position);
        drop(buffer);
        self.space.notify_waiters();
        Ok(true)
    }

    /// Take all buffered items out of the channel
    pub(crate) fn drain(&self) -> QueueResult<Vec<Arc<T>>> {
        let mut buffer = handle_mutex_poison(self.buffer.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        Ok(buffer.drain(..).collect())
    }

    /// Discard all buffered items without waking blocked producers
    pub(crate) fn clear(&self) -> QueueResult<()> {
        let mut buffer = handle_mutex_poison(self.buffer.lock(), |message| {
            QueueError::Synchronization { message }
        })?;
        buffer.clear();
        Ok(())
    }

    /// Check out one in-flight permit without waiting
    ///
    /// The permit is forgotten on success; `release_permit` returns it once
    /// the consumer reports the item consumed.
    pub(crate) fn try_acquire_permit(&self) -> bool {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Return one in-flight permit to the pool
    pub(crate) fn release_permit(&self) {
        self.permits.add_permits(1);
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.lock().map(|buffer| buffer.len()).unwrap_or(0)
    }

    pub(crate) fn stats(&self) -> ChannelStats {
        ChannelStats {
            buffered: self.len(),
            capacity: self.capacity,
            in_flight: self
                .max_concurrency
                .saturating_sub(self.permits.available_permits()),
            max_concurrency: self.max_concurrency,
        }
    }
}
