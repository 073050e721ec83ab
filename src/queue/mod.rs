//! Multi-Channel Rate-Limited Queue
//!
//! A concurrent data structure that multiplexes many independent channels of
//! pending work into a single consumer pool while enforcing two simultaneous
//! concurrency caps (per channel and global), bounding producer buffering,
//! and preserving cross-channel delivery fairness.
//!
//! # Overview
//!
//! Each channel is a bounded FIFO buffer with its own in-flight cap; the
//! coordinator additionally caps total in-flight items across all channels.
//! Key properties:
//!
//! - **Backpressure**: `add` waits while the target channel's buffer is full
//! - **Admission control**: `take` waits while the global in-flight cap is
//!   exhausted, then while every buffered item's channel is saturated
//! - **Fairness**: among deliverable items, the earliest-arrived anywhere in
//!   the structure is delivered first
//! - **At-most-once in flight**: no item is handed to two concurrent `take`
//!   calls; each delivery is closed out by exactly one `consumed` call
//! - **Zero-copy sharing**: items are `Arc`-wrapped and never cloned between
//!   the internal structures
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │ Producer A │   │ Producer B │   │ Producer C │
//! └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!       │ add            │ add            │ add
//!       ▼                ▼                ▼
//! ┌─────────────────────────────────────────────────────┐
//! │              MultiChannelQueue (coordinator)        │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐             │
//! │  │Channel a │ │Channel b │ │Channel c │  (bounded   │
//! │  │▓▓▓░░     │ │▓░░░░     │ │▓▓░░░     │   buffers + │
//! │  └──────────┘ └──────────┘ └──────────┘   permits)  │
//! │  ┌─────────────────────────────────────┐            │
//! │  │ global order list (insertion order) │            │
//! │  └─────────────────────────────────────┘            │
//! │  ┌─────────────────────────────────────┐            │
//! │  │ global admission pool (in-flight)   │            │
//! │  └─────────────────────────────────────┘            │
//! └──────────┬──────────────────┬───────────────────────┘
//!            │ take/consumed    │ take/consumed
//!     ┌──────┴─────┐     ┌──────┴─────┐
//!     │ Consumer 1 │     │ Consumer 2 │   (shared pool)
//!     └────────────┘     └────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ratequeue::queue::MultiChannelQueue;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Global cap of 8 in-flight items
//! let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(8);
//!
//! // Each tenant gets a buffer of 16 and at most 2 in-flight items
//! queue.add_channel("tenant-a".to_string(), 16, 2)?;
//! queue.add_channel("tenant-b".to_string(), 16, 2)?;
//!
//! // Producers block when a tenant's buffer is full
//! queue.add(&"tenant-a".to_string(), "job-1".to_string()).await?;
//!
//! // Consumers pull the earliest deliverable item from any tenant
//! if let Some((id, job)) = queue.take_timeout(Duration::from_millis(100)).await? {
//!     // ... process job ...
//!     queue.consumed(&id)?;
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
mod manager;
mod types;

pub mod api;

pub use error::{QueueError, QueueResult};
pub use manager::MultiChannelQueue;
pub use types::{ChannelStats, QueueStats};

#[cfg(test)]
mod tests;
