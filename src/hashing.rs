//! This module provides a deterministic hasher and `HashMap` and `HashSet` variants that use
//! it. The hashing data structures in the standard library are randomly seeded per process,
//! which would make any iteration over them differ between two runs with the same seed.
//!
//! `HashMap<K, V, S>` has no `new` method for a non-default hasher. Use `HashMap::default()`
//! or bring the `HashMapExt` / `HashSetExt` trait extensions into scope.
//!
//! The `hash_str` free function is used to derive the seed of each random stream from its
//! name. It uses XXH3, whose output does not depend on platform or version, so stream seeds are the
//! same on every platform and toolchain.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Provides `HashMap::new()` for the deterministic map.
pub trait HashMapExt {
    fn new() -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }
}

/// Provides `HashSet::new()` for the deterministic set.
pub trait HashSetExt {
    fn new() -> Self;
}

impl<T> HashSetExt for HashSet<T> {
    fn new() -> Self {
        HashSet::default()
    }
}

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("hello");
        let b = hash_str("hello");
        let c = hash_str("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn map_ext_new() {
        let mut map: HashMap<u32, &str> = HashMap::new();
        map.insert(1, "one");
        assert_eq!(map.get(&1), Some(&"one"));
        let set: HashSet<u32> = HashSet::new();
        assert!(set.is_empty());
    }
}
