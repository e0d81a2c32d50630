use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::{CResult, Error};

pub type TxnId = u64;

/// The mode a `KeyLock` is currently held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    None,
    Read,
    Write,
}

/// A read/write lock on a single key, tracking which transactions hold it.
///
/// This is the engine's only concurrency control primitive. It never blocks:
/// it fails fast on the one conflict class it detects (a `WRITE` acquire by a
/// transaction that isn't already a holder of a `READ`-held key). Every other
/// interleaving is accepted, and callers serialize higher-level operations
/// through the `TransactionManager`'s mutex. This is a minimal pessimistic
/// scheme, not strict two-phase locking.
#[derive(Debug, Default)]
pub struct KeyLock {
    mode: LockMode,
    holders: HashSet<TxnId>,
}

impl KeyLock {
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn holders(&self) -> &HashSet<TxnId> {
        &self.holders
    }

    /// `key` is only used to build an error message; it plays no role in the
    /// locking decision itself.
    pub fn acquire(&mut self, mode: LockMode, tid: TxnId, key: &str) -> CResult<()> {
        match mode {
            LockMode::Read => {
                self.holders.insert(tid);
                if self.mode == LockMode::None {
                    self.mode = LockMode::Read;
                }
                // If already Write, the caller retains the write lock.
            }
            LockMode::Write => {
                if self.mode == LockMode::Read && !self.holders.contains(&tid) {
                    return Err(Error::LockUpgradeDenied(key.to_string()));
                }
                self.mode = LockMode::Write;
                self.holders.insert(tid);
            }
            LockMode::None => {}
        }
        Ok(())
    }

    pub fn release(&mut self, tid: TxnId) {
        self.holders.remove(&tid);
        if self.holders.is_empty() {
            self.mode = LockMode::None;
        }
    }
}

/// A lazily allocated `key -> KeyLock` registry. Entries are never evicted
/// during the process lifetime; the table is bounded by the active key set.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: HashMap<String, KeyLock>,
}

impl LockTable {
    pub fn new() -> Self {
        Self { locks: HashMap::new() }
    }

    pub fn acquire(&mut self, key: &str, mode: LockMode, tid: TxnId) -> CResult<()> {
        let lock = self.locks.entry(key.to_string()).or_default();
        lock.acquire(mode, tid, key)
    }

    /// Releasing a lock the transaction never held is a no-op, since
    /// `release` just discards `tid` from a set.
    pub fn release_all(&mut self, tid: TxnId) {
        for lock in self.locks.values_mut() {
            lock.release(tid);
        }
    }
}
