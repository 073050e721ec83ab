//! Public API for the queue system
//!
//! This module provides the complete public API for the multi-channel queue.
//! External modules should import from here rather than directly from
//! internal modules. See the module documentation for usage examples and
//! architecture details.

// Core queue coordinator
pub use crate::queue::manager::MultiChannelQueue;

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Introspection types
pub use crate::queue::types::{ChannelStats, QueueStats};
