use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, instrument};

use super::KvsEngine;
use crate::error::{KvsError, Result};
use crate::Value;

type Entries = HashMap<String, Value>;

/// The in-memory [`KvsEngine`].
///
/// A single reader/writer lock guards the whole map: `list_keys` and `get` take it in
/// shared mode and may run alongside each other, `set` and `delete` take it exclusively
/// and block every other operation for their duration, whatever key they touch.
///
/// Cloning a `KvStore` is cheap and every clone refers to the same map, which is how each
/// request worker gets its handle to the store.
#[derive(Debug, Clone)]
pub struct KvStore {
    // `None` only for a store that bypassed `new`
    data: Arc<RwLock<Option<Entries>>>,
}

impl KvStore {
    /// creates an empty [`KvStore`]
    pub fn new() -> KvStore {
        KvStore {
            data: Arc::new(RwLock::new(Some(HashMap::new()))),
        }
    }

    /// a store with no backing map, every operation on it fails with
    /// [`KvsError::Uninitialized`]
    #[cfg(test)]
    pub(crate) fn uninitialized() -> KvStore {
        KvStore {
            data: Arc::new(RwLock::new(None)),
        }
    }

    /// number of entries currently in the store
    pub fn len(&self) -> Result<usize> {
        let guard = self.read()?;
        Ok(entries(&guard)?.len())
    }

    /// returns `true` if the store holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<Entries>>> {
        self.data.read().map_err(|_| KvsError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<Entries>>> {
        self.data.write().map_err(|_| KvsError::LockPoisoned)
    }
}

impl Default for KvStore {
    fn default() -> Self {
        KvStore::new()
    }
}

fn entries(data: &Option<Entries>) -> Result<&Entries> {
    data.as_ref().ok_or(KvsError::Uninitialized)
}

fn entries_mut(data: &mut Option<Entries>) -> Result<&mut Entries> {
    data.as_mut().ok_or(KvsError::Uninitialized)
}

impl KvsEngine for KvStore {
    fn list_keys(&self) -> Result<Vec<String>> {
        let guard = self.read()?;
        Ok(entries(&guard)?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let guard = self.read()?;
        Ok(entries(&guard)?.get(key).cloned())
    }

    #[instrument(level = "trace", skip(self, value))]
    fn set(&self, key: String, value: Value) -> Result<()> {
        let mut guard = self.write()?;
        let previous = entries_mut(&mut guard)?.insert(key, value);
        debug!(overwrote = previous.is_some(), "set");
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.write()?;
        let removed = entries_mut(&mut guard)?.remove(key);
        debug!(existed = removed.is_some(), "delete");
        Ok(())
    }
}
