//! The shared store: named, fixed-size binary blobs visible to every participant of a run.
//!
//! Blobs are created once with a fixed size, written whole and read whole. Protocol values are
//! published with "remove, create, write" and never edited afterwards; only the barrier state
//! block is rewritten in place, and always under the barrier's lock.
use crate::{
    arithmetics::{Polynomial, Ring},
    error::StoreError,
    AvpError, Result,
};
use std::fmt;
use tracing::debug;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Transport for named blobs. Implementations must make `create` exclusive: when several
/// callers race to create the same name, exactly one succeeds.
pub trait SharedStore: Send + Sync {
    /// Create a zero-filled blob; fails with `AlreadyExists` if the name is taken
    fn create(&self, name: &str, size: usize) -> std::result::Result<(), StoreError>;

    /// Return the size of an existing blob; fails with `NotFound` if it is absent
    fn open(&self, name: &str) -> std::result::Result<usize, StoreError>;

    fn read(&self, name: &str) -> std::result::Result<Vec<u8>, StoreError>;

    /// Overwrite an existing blob; the data must match the blob size exactly
    fn write(&self, name: &str, data: &[u8]) -> std::result::Result<(), StoreError>;

    /// Remove a blob. Removing an absent blob is not an error.
    fn remove(&self, name: &str) -> std::result::Result<(), StoreError>;
}

/// Names of the blobs used by one protocol run
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum Key {
    /// The public ring element `a`
    PublicPoly,
    /// The share participant `from` sends to participant `to`
    Share { from: usize, to: usize },
    /// Participant `id`'s ballot
    PartyVote(usize),
    /// The barrier state block
    SharedSync,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Key::PublicPoly => write!(f, "shared_poly_a"),
            Key::Share { from, to } => write!(f, "Share_{from}_{to}"),
            Key::PartyVote(id) => write!(f, "PartyVote_{id}"),
            Key::SharedSync => write!(f, "SharedSync"),
        };
    }
}

/// Names are restricted so that every backend can use them verbatim
pub fn validate_name(name: &str) -> std::result::Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        return Ok(());
    }
    return Err(StoreError::InvalidName {
        name: name.to_string(),
    });
}

/// Publish a ring element under a key, replacing any leftover from an earlier run
pub fn publish<S: SharedStore + ?Sized>(
    store: &S,
    key: Key,
    ring: &Ring,
    poly: &Polynomial,
) -> Result<()> {
    let name = key.to_string();
    let bytes = ring.to_bytes(poly)?;
    store.remove(&name)?;
    store.create(&name, bytes.len())?;
    store.write(&name, &bytes)?;
    debug!(blob = %name, bytes = bytes.len(), "published");
    return Ok(());
}

/// Read back a ring element published under a key. A blob that exists but does not decode is
/// reported as an unreadable blob of that name.
pub fn fetch<S: SharedStore + ?Sized>(store: &S, key: Key, ring: &Ring) -> Result<Polynomial> {
    let name = key.to_string();
    let bytes = store.read(&name)?;
    return ring.from_bytes(&bytes).map_err(|e| match e {
        AvpError::Codec { message } => StoreError::Unreadable { name, message }.into(),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::PublicPoly.to_string(), "shared_poly_a");
        assert_eq!(Key::Share { from: 2, to: 0 }.to_string(), "Share_2_0");
        assert_eq!(Key::PartyVote(7).to_string(), "PartyVote_7");
        assert_eq!(Key::SharedSync.to_string(), "SharedSync");
        for key in [
            Key::PublicPoly,
            Key::Share { from: 1, to: 1 },
            Key::PartyVote(0),
            Key::SharedSync,
        ] {
            assert!(validate_name(&key.to_string()).is_ok());
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("a b").is_err());
    }

    #[test]
    fn test_publish_replaces_leftovers() {
        let store = MemoryStore::new();
        let ring = Ring::new(4, 12289).unwrap();
        let stale = ring.from_signed(&[9, 9, 9, 9]);
        let fresh = ring.from_signed(&[1, -2, 3, -4]);
        publish(&store, Key::PartyVote(0), &ring, &stale).unwrap();
        publish(&store, Key::PartyVote(0), &ring, &fresh).unwrap();
        assert_eq!(fetch(&store, Key::PartyVote(0), &ring).unwrap(), fresh);
    }

    #[test]
    fn test_fetch_missing() {
        let store = MemoryStore::new();
        let ring = Ring::default();
        let err = fetch(&store, Key::PublicPoly, &ring).unwrap_err();
        assert!(matches!(
            err,
            AvpError::Store(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_fetch_truncated() {
        let store = MemoryStore::new();
        let ring = Ring::default();
        store.create("shared_poly_a", 3).unwrap();
        let err = fetch(&store, Key::PublicPoly, &ring).unwrap_err();
        assert!(matches!(
            &err,
            AvpError::Store(StoreError::Unreadable { name, .. }) if name == "shared_poly_a"
        ));
        assert!(err.to_string().contains("expected 256 bytes, got 3"));
    }
}
