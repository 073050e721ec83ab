//! Queue Error Types
//!
//! Usage errors (invalid configuration, unregistered channel) surface as
//! synchronous `Err` values. Timeouts are not errors: bounded waits that
//! elapse return `Ok(None)` / `Ok(false)` from the operation itself.

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Channel not found: {id}")]
    ChannelNotFound { id: String },

    #[error("Invalid channel configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Synchronisation failure: {message}")]
    Synchronization { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
