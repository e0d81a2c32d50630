use crate::shard::Shard;

/// Default number of shards when a caller doesn't specify one.
pub const DEFAULT_SHARD_COUNT: usize = 10;

/// A fixed 64-bit FNV-1a seed pair, used instead of `std`'s process-randomized
/// `DefaultHasher` so that `shard_of` is reproducible across runs and in
/// tests, not merely stable within one process lifetime.
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn stable_hash(key: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Owns the ordered set of shards and maps keys to their owning shard via a
/// stable hash. `shard_of` is pure, total, and fixed for the router's
/// lifetime: a key always resolves to the same shard index.
pub struct ShardRouter {
    shards: Vec<Shard>,
}

impl ShardRouter {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count).map(|_| Shard::new()).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn index_of(&self, key: &str) -> usize {
        (stable_hash(key) % self.shards.len() as u64) as usize
    }

    pub fn shard_of(&self, key: &str) -> &Shard {
        &self.shards[self.index_of(key)]
    }

    pub fn shard_of_mut(&mut self, key: &str) -> &mut Shard {
        let idx = self.index_of(key);
        &mut self.shards[idx]
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_of_is_deterministic() {
        let router = ShardRouter::new(DEFAULT_SHARD_COUNT);
        let a = router.index_of("some-key");
        let b = router.index_of("some-key");
        assert_eq!(a, b);
    }

    #[test]
    fn get_after_put_lands_on_same_shard() {
        let mut router = ShardRouter::new(DEFAULT_SHARD_COUNT);
        router.shard_of_mut("k1").write("k1".into(), "v1".into());
        assert_eq!(router.shard_of("k1").read("k1"), Some("v1".to_string()));
    }

    #[test]
    fn single_shard_router_routes_every_key_to_it() {
        let router = ShardRouter::new(1);
        assert_eq!(router.index_of("anything"), 0);
        assert_eq!(router.index_of(""), 0);
    }

    #[test]
    fn every_key_lives_in_at_most_one_shard() {
        let mut router = ShardRouter::new(DEFAULT_SHARD_COUNT);
        for i in 0..200 {
            let key = format!("key-{i}");
            router.shard_of_mut(&key).write(key.clone(), "v".into());
        }
        for i in 0..200 {
            let key = format!("key-{i}");
            let count = router.shards().iter().filter(|s| s.read(&key).is_some()).count();
            assert_eq!(count, 1);
        }
    }
}
