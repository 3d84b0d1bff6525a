//! This module provides the storage capability consumed by the request router.
//! [`KvsEngine`] is the only thing the router knows about storage, so any implementation
//! (the in-memory [`KvStore`] or a test double) can be put behind it.
use crate::{Result, Value};

/// A trait for the basic functionality of a key/value storage engine
pub trait KvsEngine: Clone + Send + Sync + 'static {
    /// Returns a snapshot of every key currently in the store, in no particular order.
    ///
    /// An empty store yields an empty `Vec`.
    fn list_keys(&self) -> Result<Vec<String>>;

    /// Gets the value associated with the given `key`
    ///
    /// Returns `None` if the given `key` does not exist.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// sets a `key` and `value`
    ///
    /// If the given `key` already exists the previous `value` will be overwritten.
    fn set(&self, key: String, value: Value) -> Result<()>;

    /// Removes the given `key` (and associated value) from the store
    ///
    /// Removing a key that does not exist is a no-op.
    fn delete(&self, key: &str) -> Result<()>;
}

mod memory;

pub use self::memory::KvStore;
