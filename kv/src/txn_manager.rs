use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{CResult, Error};
use crate::lock::{LockMode, LockTable, TxnId};
use crate::router::ShardRouter;
use crate::transaction::Transaction;

/// Allocates transaction IDs, tracks live transactions, drives commit and
/// rollback, and brokers lock acquisition.
///
/// Everything here runs under one flat mutex rather than a reentrant one: the
/// call graph never re-enters from within a held section, so a plain
/// `std::sync::Mutex` is enough (see design notes on pattern translations).
pub struct TransactionManager {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: TxnId,
    // A BTreeMap keeps `live` iterable in ascending TxnId order, which makes
    // `get_transaction_id_for_key` and `commit_all` deterministic.
    live: BTreeMap<TxnId, Transaction>,
    lock_table: LockTable,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                live: BTreeMap::new(),
                lock_table: LockTable::new(),
            }),
        }
    }

    pub fn begin(&self) -> TxnId {
        let mut inner = self.inner.lock().unwrap();
        let tid = inner.next_id;
        inner.next_id += 1;
        inner.live.insert(tid, Transaction::new());
        tid
    }

    pub fn is_live(&self, tid: TxnId) -> bool {
        self.inner.lock().unwrap().live.contains_key(&tid)
    }

    pub fn acquire(&self, key: &str, mode: LockMode, tid: TxnId) -> CResult<()> {
        self.inner.lock().unwrap().lock_table.acquire(key, mode, tid)
    }

    /// Runs `f` with exclusive access to the live transaction named by `tid`.
    /// Fails with `UnknownTransaction` if `tid` does not name a live one.
    pub fn with_transaction<R>(
        &self,
        tid: TxnId,
        f: impl FnOnce(&mut Transaction) -> R,
    ) -> CResult<R> {
        let mut inner = self.inner.lock().unwrap();
        let txn = inner.live.get_mut(&tid).ok_or(Error::UnknownTransaction(tid))?;
        Ok(f(txn))
    }

    /// Returns the first live transaction (in ascending TxnId order) that has
    /// touched `key`, if any. Used only by `show_all`.
    pub fn get_transaction_id_for_key(&self, key: &str) -> Option<TxnId> {
        let inner = self.inner.lock().unwrap();
        inner.live.iter().find(|(_, txn)| txn.touches(key)).map(|(tid, _)| *tid)
    }

    pub fn commit(&self, tid: TxnId, router: &mut ShardRouter) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(mut txn) = inner.live.remove(&tid) {
            txn.commit(router);
            inner.lock_table.release_all(tid);
        }
    }

    pub fn rollback(&self, tid: TxnId, router: &mut ShardRouter) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(mut txn) = inner.live.remove(&tid) {
            txn.undo_to_shards(router);
            txn.rollback_buffer();
            inner.lock_table.release_all(tid);
        }
    }

    /// Commits every live transaction, in ascending TxnId order. Not atomic
    /// across transactions: each transaction's own commit is atomic, but a
    /// crash or panic partway through leaves the rest uncommitted.
    pub fn commit_all(&self, router: &mut ShardRouter) {
        let tids: Vec<TxnId> = {
            let inner = self.inner.lock().unwrap();
            inner.live.keys().copied().collect()
        };
        for tid in tids {
            self.commit(tid, router);
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_allocates_strictly_increasing_ids() {
        let mgr = TransactionManager::new();
        let a = mgr.begin();
        let b = mgr.begin();
        let c = mgr.begin();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn unknown_transaction_is_reported() {
        let mgr = TransactionManager::new();
        let err = mgr.with_transaction(999, |_| ()).unwrap_err();
        assert_eq!(err, Error::UnknownTransaction(999));
    }

    #[test]
    fn commit_removes_transaction_from_live_set() {
        let mgr = TransactionManager::new();
        let mut router = ShardRouter::new(4);
        let tid = mgr.begin();
        assert!(mgr.is_live(tid));
        mgr.commit(tid, &mut router);
        assert!(!mgr.is_live(tid));
    }

    #[test]
    fn commit_of_unknown_transaction_is_noop() {
        let mgr = TransactionManager::new();
        let mut router = ShardRouter::new(4);
        mgr.commit(999, &mut router); // must not panic
    }

    #[test]
    fn rollback_removes_transaction_from_live_set() {
        let mgr = TransactionManager::new();
        let mut router = ShardRouter::new(4);
        let tid = mgr.begin();
        mgr.rollback(tid, &mut router);
        assert!(!mgr.is_live(tid));
    }

    #[test]
    fn get_transaction_id_for_key_picks_lowest_tid_touching_it() {
        let mgr = TransactionManager::new();
        let t1 = mgr.begin();
        let t2 = mgr.begin();
        mgr.with_transaction(t2, |txn| txn.put("k", "v".into(), None)).unwrap();
        mgr.with_transaction(t1, |txn| txn.put("k", "v1".into(), None)).unwrap();
        assert_eq!(mgr.get_transaction_id_for_key("k"), Some(t1));
    }

    #[test]
    fn commit_all_clears_every_live_transaction() {
        let mgr = TransactionManager::new();
        let mut router = ShardRouter::new(4);
        let t1 = mgr.begin();
        let t2 = mgr.begin();
        mgr.with_transaction(t1, |txn| txn.put("a", "1".into(), None)).unwrap();
        mgr.with_transaction(t2, |txn| txn.put("b", "2".into(), None)).unwrap();
        mgr.commit_all(&mut router);
        assert!(!mgr.is_live(t1));
        assert!(!mgr.is_live(t2));
        assert_eq!(router.shard_of("a").read("a"), Some("1".to_string()));
        assert_eq!(router.shard_of("b").read("b"), Some("2".to_string()));
    }
}
