//! Hash collections used throughout Vellum.
//!
//! In-memory tables (interned paths, loaded assets, attribute registries) are keyed
//! by values that are already well distributed, so they use AHash instead of SipHash.
//! Anything that must be stable across processes goes through [`crate::hash`] instead.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

/// Create a `HashMap` with room for at least `capacity` entries.
pub fn map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V> {
    HashMap::with_capacity(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert(7u64, "seven");
        assert_eq!(map.get(&7), Some(&"seven"));
    }

    #[test]
    fn test_map_with_capacity() {
        let map: HashMap<u64, u64> = map_with_capacity(64);
        assert!(map.capacity() >= 64);
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        set.insert("a");
        set.insert("a");
        assert_eq!(set.len(), 1);
    }
}
