use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_derive::{Deserialize, Serialize};

use crate::cache::CacheHook;
use crate::error::CResult;
use crate::lock::{LockMode, TxnId};
use crate::router::{ShardRouter, DEFAULT_SHARD_COUNT};
use crate::txn_manager::TransactionManager;

/// A row returned by `show_all`: the key's current committed value and, if
/// some live transaction has touched it, that transaction's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowAllEntry {
    pub value: String,
    pub transaction_id: Option<TxnId>,
}

/// Public facade over the sharded, transactional engine: `begin`, `put`,
/// `get`, `delete`, `commit`, `rollback`, `commit_all`, `show_all`.
///
/// Every operation takes the manager's mutex for its duration, serializing
/// buffer mutation and lock acquisition across all connections that share
/// this `Engine`.
pub struct Engine {
    router: Mutex<ShardRouter>,
    txn_manager: TransactionManager,
    cache: Option<Arc<dyn CacheHook>>,
}

impl Engine {
    pub fn new(shard_count: usize) -> Self {
        Self {
            router: Mutex::new(ShardRouter::new(shard_count)),
            txn_manager: TransactionManager::new(),
            cache: None,
        }
    }

    pub fn with_cache(shard_count: usize, cache: Arc<dyn CacheHook>) -> Self {
        Self {
            router: Mutex::new(ShardRouter::new(shard_count)),
            txn_manager: TransactionManager::new(),
            cache: Some(cache),
        }
    }

    pub fn begin(&self) -> TxnId {
        self.txn_manager.begin()
    }

    pub fn put(&self, key: &str, value: String, tid: TxnId) -> CResult<()> {
        if !self.txn_manager.is_live(tid) {
            return Err(crate::error::Error::UnknownTransaction(tid));
        }
        self.txn_manager.acquire(key, LockMode::Write, tid)?;
        let router = self.router.lock().unwrap();
        let current = router.shard_of(key).read(key);
        self.txn_manager.with_transaction(tid, |txn| txn.put(key, value.clone(), current))?;
        drop(router);
        if let Some(cache) = &self.cache {
            cache.add(key, &value);
        }
        Ok(())
    }

    pub fn get(&self, key: &str, tid: TxnId) -> CResult<Option<String>> {
        if !self.txn_manager.is_live(tid) {
            return Err(crate::error::Error::UnknownTransaction(tid));
        }
        self.txn_manager.acquire(key, LockMode::Read, tid)?;
        let router = self.router.lock().unwrap();
        let committed = router.shard_of(key).read(key);
        drop(router);
        self.txn_manager.with_transaction(tid, |txn| txn.read_own(key, committed))
    }

    pub fn delete(&self, key: &str, tid: TxnId) -> CResult<()> {
        if !self.txn_manager.is_live(tid) {
            return Err(crate::error::Error::UnknownTransaction(tid));
        }
        self.txn_manager.acquire(key, LockMode::Write, tid)?;
        let router = self.router.lock().unwrap();
        let current = router.shard_of(key).read(key);
        self.txn_manager.with_transaction(tid, |txn| txn.delete(key, current))?;
        drop(router);
        if let Some(cache) = &self.cache {
            cache.remove(key);
        }
        Ok(())
    }

    pub fn commit(&self, tid: TxnId) {
        let mut router = self.router.lock().unwrap();
        self.txn_manager.commit(tid, &mut router);
    }

    pub fn rollback(&self, tid: TxnId) {
        let mut router = self.router.lock().unwrap();
        self.txn_manager.rollback(tid, &mut router);
    }

    pub fn commit_all(&self) {
        let mut router = self.router.lock().unwrap();
        self.txn_manager.commit_all(&mut router);
    }

    /// Best-effort committed snapshot: no isolation guarantee versus
    /// concurrent commits from other connections.
    pub fn show_all(&self) -> BTreeMap<String, ShowAllEntry> {
        let router = self.router.lock().unwrap();
        let mut out = BTreeMap::new();
        for shard in router.shards() {
            for (key, value) in shard.iter() {
                let transaction_id = self.txn_manager.get_transaction_id_for_key(key);
                out.insert(key.clone(), ShowAllEntry { value: value.clone(), transaction_id });
            }
        }
        out
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_COUNT)
    }
}
