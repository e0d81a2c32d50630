use std::collections::{HashMap, HashSet};

use crate::router::ShardRouter;

/// A transaction's write buffer, tombstone set, and undo log.
///
/// Invariants maintained by every method below: `changes.keys()` and
/// `tombstones` never overlap, and every key in either one has a
/// corresponding entry in `undo`, captured once at first touch.
#[derive(Debug, Default)]
pub struct Transaction {
    changes: HashMap<String, String>,
    tombstones: HashSet<String>,
    undo: HashMap<String, Option<String>>,
}

impl Transaction {
    pub fn new() -> Self {
        Self { changes: HashMap::new(), tombstones: HashSet::new(), undo: HashMap::new() }
    }

    pub fn put(&mut self, key: &str, value: String, current_committed: Option<String>) {
        if !self.undo.contains_key(key) {
            self.undo.insert(key.to_string(), current_committed);
        }
        self.changes.insert(key.to_string(), value);
        self.tombstones.remove(key);
    }

    pub fn delete(&mut self, key: &str, current_committed: Option<String>) {
        if !self.undo.contains_key(key) {
            self.undo.insert(key.to_string(), current_committed);
        }
        self.tombstones.insert(key.to_string());
        self.changes.remove(key);
    }

    pub fn read_own(&self, key: &str, committed_value: Option<String>) -> Option<String> {
        if self.tombstones.contains(key) {
            None
        } else if let Some(v) = self.changes.get(key) {
            Some(v.clone())
        } else {
            committed_value
        }
    }

    /// Drains the buffer into the shards, routing each key to its owning
    /// shard rather than fanning every change out to every shard.
    pub fn commit(&mut self, router: &mut ShardRouter) {
        for (key, value) in self.changes.drain() {
            router.shard_of_mut(&key).write(key, value);
        }
        for key in self.tombstones.drain() {
            router.shard_of_mut(&key).erase(&key);
        }
        self.undo.clear();
    }

    pub fn rollback_buffer(&mut self) {
        self.changes.clear();
        self.tombstones.clear();
        self.undo.clear();
    }

    /// Restores shard state from the undo log. A no-op unless this
    /// transaction's writes were already materialized into shards by a
    /// prior `commit` within the same transaction's lifetime.
    pub fn undo_to_shards(&self, router: &mut ShardRouter) {
        for (key, value) in &self.undo {
            match value {
                Some(v) => router.shard_of_mut(key).write(key.clone(), v.clone()),
                None => router.shard_of_mut(key).erase(key),
            }
        }
    }

    pub fn touches(&self, key: &str) -> bool {
        self.changes.contains_key(key) || self.tombstones.contains(key)
    }
}
