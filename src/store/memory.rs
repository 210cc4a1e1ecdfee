//! In-process shared store, for simulations and tests
use super::{validate_name, SharedStore};
use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A map of blobs behind one mutex. Clones share the same blobs, so every participant thread of
/// a simulation can hold its own handle.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Names of every blob currently present, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names = self.lock().keys().cloned().collect::<Vec<String>>();
        names.sort();
        return names;
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // a panicking holder cannot leave a blob half-written, so the map stays usable
        return self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }
}

impl SharedStore for MemoryStore {
    fn create(&self, name: &str, size: usize) -> Result<(), StoreError> {
        validate_name(name)?;
        let mut blobs = self.lock();
        if blobs.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        blobs.insert(name.to_string(), vec![0u8; size]);
        return Ok(());
    }

    fn open(&self, name: &str) -> Result<usize, StoreError> {
        validate_name(name)?;
        return self
            .lock()
            .get(name)
            .map(|blob| blob.len())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            });
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        return self
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            });
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        let mut blobs = self.lock();
        let blob = blobs.get_mut(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        if blob.len() != data.len() {
            return Err(StoreError::SizeMismatch {
                name: name.to_string(),
                expected: blob.len(),
                actual: data.len(),
            });
        }
        blob.copy_from_slice(data);
        return Ok(());
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        self.lock().remove(name);
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_lifecycle() {
        let store = MemoryStore::new();
        store.create("blob", 4).unwrap();
        assert_eq!(store.open("blob").unwrap(), 4);
        assert_eq!(store.read("blob").unwrap(), vec![0u8; 4]);
        store.write("blob", &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read("blob").unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(
            store.create("blob", 4),
            Err(StoreError::AlreadyExists { .. })
        ));
        assert!(matches!(
            store.write("blob", &[1, 2]),
            Err(StoreError::SizeMismatch {
                expected: 4,
                actual: 2,
                ..
            })
        ));
        store.remove("blob").unwrap();
        store.remove("blob").unwrap();
        assert!(store.open("blob").unwrap_err().is_not_found());
        assert!(store.write("blob", &[0; 4]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_clones_share_blobs() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.create("b", 1).unwrap();
        handle.create("a", 1).unwrap();
        assert_eq!(store.names(), vec!["a".to_string(), "b".to_string()]);
    }
}
