use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a read-write lock that can be stored and reused
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    /// Creates a new lock handle.
    pub fn new() -> Self {
        LockHandle {
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// Acquires a read lock
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Acquires a write lock
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

impl Default for LockHandle {
    fn default() -> Self {
        LockHandle::new()
    }
}

/// Registry for managing named read-write locks.
///
/// Provides a way to create and look up named read-write locks used to
/// synchronize access to resources. The schema synchronizer holds the
/// write lock for a table name for the duration of reconciliation so
/// that two concurrent reconcile calls against the same missing table
/// cannot both attempt creation.
///
/// This implementation uses `parking_lot`'s poison-free locks.
///
/// # Examples
///
/// ```
/// use reldoc::common::LockRegistry;
/// let lock_registry = LockRegistry::new();
/// let lock = lock_registry.get_lock("books");
/// {
///     let _write_guard = lock.write();
/// } // Write lock is held while _write_guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the named lock, creating it on first use.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        {
            let locks = self.locks.read();
            if let Some(lock) = locks.get(name) {
                return LockHandle { lock: lock.clone() };
            }
        }

        let mut locks = self.locks.write();
        let lock = locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())));
        LockHandle { lock: lock.clone() }
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        LockRegistry::new()
    }
}
