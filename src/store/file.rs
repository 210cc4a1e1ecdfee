//! File-backed shared store: one file per blob inside a root directory.
//!
//! On Linux the default root lives under `/dev/shm`, so blobs are memory-backed and visible to
//! every process on the host. Exclusive creation (`O_CREAT | O_EXCL`) makes `create` atomic
//! across processes, which the barrier relies on for its lock.
use super::{validate_name, SharedStore};
use crate::error::StoreError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// `/dev/shm/avp` where shared memory is mounted, otherwise `avp` in the temp directory
pub fn default_root() -> PathBuf {
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        return shm.join("avp");
    }
    return std::env::temp_dir().join("avp");
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::from_io(&root.display().to_string(), e))?;
        return Ok(Self { root });
    }

    pub fn get_root(&self) -> &Path {
        return &self.root;
    }

    fn path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        return Ok(self.root.join(name));
    }

    /// Remove every blob under the root. Returns the number of blobs removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let root = self.root.display().to_string();
        let mut removed = 0;
        for entry in fs::read_dir(&self.root).map_err(|e| StoreError::from_io(&root, e))? {
            let entry = entry.map_err(|e| StoreError::from_io(&root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if validate_name(&name).is_err() {
                continue;
            }
            self.remove(&name)?;
            removed += 1;
        }
        return Ok(removed);
    }
}

impl SharedStore for FileStore {
    fn create(&self, name: &str, size: usize) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StoreError::from_io(name, e))?;
        file.set_len(size as u64)
            .map_err(|e| StoreError::from_io(name, e))?;
        return Ok(());
    }

    fn open(&self, name: &str) -> Result<usize, StoreError> {
        let path = self.path(name)?;
        let metadata = fs::metadata(&path).map_err(|e| StoreError::from_io(name, e))?;
        return Ok(metadata.len() as usize);
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path(name)?;
        return fs::read(&path).map_err(|e| StoreError::from_io(name, e));
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::from_io(name, e))?;
        let size = file
            .metadata()
            .map_err(|e| StoreError::from_io(name, e))?
            .len() as usize;
        if size != data.len() {
            return Err(StoreError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual: data.len(),
            });
        }
        file.write_all(data)
            .map_err(|e| StoreError::from_io(name, e))?;
        file.sync_data()
            .map_err(|e| StoreError::from_io(name, e))?;
        return Ok(());
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        return match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from_io(name, e)),
        };
    }
}

/// A fresh store in a unique scratch directory
#[cfg(test)]
pub(crate) fn scratch_store(tag: &str) -> FileStore {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let root = std::env::temp_dir().join(format!(
        "avp-test-{tag}-{}-{nanos}",
        std::process::id()
    ));
    return FileStore::new(root).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_lifecycle() {
        let store = scratch_store("lifecycle");
        store.create("Share_0_1", 8).unwrap();
        assert_eq!(store.open("Share_0_1").unwrap(), 8);
        assert_eq!(store.read("Share_0_1").unwrap(), vec![0u8; 8]);
        store.write("Share_0_1", &[5u8; 8]).unwrap();
        assert_eq!(store.read("Share_0_1").unwrap(), vec![5u8; 8]);
        assert!(matches!(
            store.create("Share_0_1", 8),
            Err(StoreError::AlreadyExists { .. })
        ));
        assert!(matches!(
            store.write("Share_0_1", &[5u8; 3]),
            Err(StoreError::SizeMismatch { .. })
        ));
        store.remove("Share_0_1").unwrap();
        store.remove("Share_0_1").unwrap();
        assert!(store.read("Share_0_1").unwrap_err().is_not_found());
        assert!(store.write("Share_0_1", &[0u8; 8]).unwrap_err().is_not_found());
        fs::remove_dir_all(store.get_root()).unwrap();
    }

    #[test]
    fn test_rejects_path_names() {
        let store = scratch_store("names");
        assert!(matches!(
            store.create("../escape", 1),
            Err(StoreError::InvalidName { .. })
        ));
        fs::remove_dir_all(store.get_root()).unwrap();
    }

    #[test]
    fn test_clear() {
        let store = scratch_store("clear");
        store.create("PartyVote_0", 4).unwrap();
        store.create("PartyVote_1", 4).unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.open("PartyVote_0").unwrap_err().is_not_found());
        fs::remove_dir_all(store.get_root()).unwrap();
    }
}
