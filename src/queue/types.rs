//! Type definitions for the queue system
//!
//! Introspection values reported by the coordinator and by individual
//! channels. Counters are sampled without holding the structural locks, so
//! they are point-in-time snapshots, not a consistent cut.

/// Snapshot of the whole queue structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of registered channels
    pub channels: usize,
    /// Total buffered (undelivered) items across all channels
    pub buffered_items: usize,
    /// Items delivered but not yet reported consumed
    pub in_flight: usize,
    /// Global in-flight cap
    pub max_concurrency: usize,
}

/// Snapshot of one registered channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    /// Buffered (undelivered) items in this channel
    pub buffered: usize,
    /// Maximum buffer length before producers block
    pub capacity: usize,
    /// This channel's delivered-but-not-consumed count
    pub in_flight: usize,
    /// This channel's in-flight cap
    pub max_concurrency: usize,
}
