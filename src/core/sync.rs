//! Synchronization utilities for robust lock handling
//!
//! Lock guards in this crate are only ever held for short, non-awaiting
//! critical sections, but a panic inside one still poisons the lock. These
//! helpers convert poison errors into application errors so callers can
//! propagate them instead of unwrapping.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

/// Handle poisoned mutex cases with consistent error handling
///
/// Converts a mutex poison error into an application-specific error using the
/// provided error constructor. A poisoned lock means a panic occurred while
/// the lock was held, so the guarded state may be inconsistent.
pub fn handle_mutex_poison<T, E>(
    result: LockResult<MutexGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). A panic occurred while the lock was held. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Handle poisoned RwLock read operations with consistent error handling
///
/// An RwLock becomes poisoned for readers when a writer panics while holding
/// the write lock.
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock read poisoned). A panic occurred while the write lock was held. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Handle poisoned RwLock write operations with consistent error handling
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (RwLock write poisoned). A panic occurred while the lock was held. PoisonError: {:?}",
            poison_err
        ))
    })
}
