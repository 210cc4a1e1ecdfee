//! Counting rendezvous between the share-exchange and the ballot phases
//!
//! Every one of the `n` participants arrives exactly once. The `n`-th arrival releases all of
//! them, so that every share is published before any share is read. There is no timeout: a
//! participant that never arrives leaves the others blocked forever.
use crate::{
    error::StoreError,
    store::{Key, SharedStore},
    AvpError, Result,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub trait Barrier: Send + Sync {
    /// Count this caller in and block until `total` callers have arrived. A block that is
    /// already released, or already full, refuses the arrival without counting it.
    fn arrive_and_wait(&self, total: usize) -> Result<()>;

    /// Clear the counter for another run. Must not be called while anyone is blocked.
    fn reset(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct LocalState {
    arrived: usize,
    released: bool,
}

/// Barrier for participants that live in one process, e.g. threads of a simulation
#[derive(Debug, Default)]
pub struct LocalBarrier {
    state: Mutex<LocalState>,
    release: Condvar,
}

impl LocalBarrier {
    pub fn new() -> Self {
        return Self::default();
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        return self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }
}

impl Barrier for LocalBarrier {
    fn arrive_and_wait(&self, total: usize) -> Result<()> {
        let mut state = self.lock();
        if state.released || state.arrived >= total {
            return Err(AvpError::BarrierOverrun {
                arrived: state.arrived,
                total,
                released: state.released,
            });
        }
        state.arrived += 1;
        if state.arrived == total {
            state.released = true;
            self.release.notify_all();
        }
        while !state.released {
            state = self
                .release
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        return Ok(());
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.lock();
        state.arrived = 0;
        state.released = false;
        return Ok(());
    }
}

/// Name of the blob whose existence means "the barrier state is locked"
pub const LOCK_NAME: &str = "SharedSync_lock";

/// Create a fresh, unlocked barrier state block, discarding whatever an earlier run left behind
pub fn install_state<S: SharedStore + ?Sized>(store: &S) -> Result<()> {
    let state = Key::SharedSync.to_string();
    store.remove(LOCK_NAME)?;
    store.remove(&state)?;
    store.create(&state, BarrierState::SIZE)?;
    store.write(&state, &BarrierState::default().to_bytes()?)?;
    debug!(blob = %state, "barrier installed");
    return Ok(());
}

/// The state block stored under `SharedSync`: two little-endian u32 words
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone)]
pub struct BarrierState {
    pub arrived: u32,
    pub released: bool,
}

impl BarrierState {
    pub const SIZE: usize = 8;

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.write_u32::<LittleEndian>(self.arrived)
            .and_then(|_| buf.write_u32::<LittleEndian>(self.released as u32))
            .map_err(|e| AvpError::codec(e.to_string()))?;
        return Ok(buf);
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(AvpError::codec(format!(
                "barrier state holds {} bytes, expected {}",
                bytes.len(),
                Self::SIZE
            )));
        }
        let mut reader = bytes;
        let arrived = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| AvpError::codec(e.to_string()))?;
        let released = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| AvpError::codec(e.to_string()))?;
        return Ok(Self {
            arrived,
            released: released != 0,
        });
    }
}

/// Cross-process barrier kept in a shared store.
///
/// Mutual exclusion comes from a lock blob that is taken by exclusive `create` and given back by
/// `remove`. Waiters poll the release flag, taking the lock for every look so that they never
/// observe a half-written state block.
#[derive(Debug, Clone)]
pub struct StoreBarrier<S> {
    store: S,
    poll_interval: Duration,
}

impl<S: SharedStore> StoreBarrier<S> {
    pub fn new(store: S, poll_interval: Duration) -> Self {
        return Self {
            store,
            poll_interval,
        };
    }

    fn state_name() -> String {
        return Key::SharedSync.to_string();
    }

    pub fn install(&self) -> Result<()> {
        return install_state(&self.store);
    }

    fn acquire(&self) -> Result<()> {
        loop {
            match self.store.create(LOCK_NAME, 0) {
                Ok(()) => return Ok(()),
                Err(StoreError::AlreadyExists { .. }) => thread::sleep(self.poll_interval),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run `f` on the state block under the lock, saving it back when `f` asks to
    fn locked<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BarrierState) -> (T, bool),
    {
        self.acquire()?;
        let outcome = self.load().and_then(|mut state| {
            let (value, dirty) = f(&mut state);
            if dirty {
                self.save(&state)?;
            }
            return Ok(value);
        });
        let released = self.store.remove(LOCK_NAME);
        let value = outcome?;
        released?;
        return Ok(value);
    }

    fn load(&self) -> Result<BarrierState> {
        let bytes = self.store.read(&Self::state_name())?;
        return BarrierState::from_bytes(&bytes);
    }

    fn save(&self, state: &BarrierState) -> Result<()> {
        self.store.write(&Self::state_name(), &state.to_bytes()?)?;
        return Ok(());
    }
}

impl<S: SharedStore> Barrier for StoreBarrier<S> {
    fn arrive_and_wait(&self, total: usize) -> Result<()> {
        let arrived = self.locked(|state| {
            if state.released || state.arrived as usize >= total {
                let overrun = AvpError::BarrierOverrun {
                    arrived: state.arrived as usize,
                    total,
                    released: state.released,
                };
                return (Err(overrun), false);
            }
            state.arrived += 1;
            if state.arrived as usize == total {
                state.released = true;
            }
            return (Ok(state.arrived), true);
        })??;
        debug!(arrived, total, "arrived at barrier");
        if arrived as usize == total {
            info!(total, "barrier released");
        }
        loop {
            if self.locked(|state| (state.released, false))? {
                return Ok(());
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn reset(&self) -> Result<()> {
        return self.locked(|state| {
            *state = BarrierState::default();
            return ((), true);
        });
    }
}
