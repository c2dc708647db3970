use std::cell::Cell;
use std::marker::PhantomData;

use crate::utils::MyHash;

struct Entry<V> {
    key: u64,
    value: V,
}

/// Direct-mapped, lossy operation cache ("computed table").
///
/// Each slot holds one entry; a colliding insert simply overwrites. The cache
/// is cleared whenever the garbage collector runs, because entries may refer
/// to reclaimed nodes.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
    _phantom: PhantomData<K>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
            _phantom: PhantomData,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn slot(&self, key: u64) -> usize {
        (key & self.bitmask) as usize
    }

    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: MyHash,
    {
        let key = key.hash();
        match &self.data[self.slot(key)] {
            Some(entry) if entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    pub fn insert(&mut self, key: &K, value: V)
    where
        K: MyHash,
    {
        let key = key.hash();
        let slot = self.slot(key);
        self.data[slot] = Some(Entry { key, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let mut cache = Cache::<(u64, u64), i32>::new(4);

        cache.insert(&(1, 2), 3);
        cache.insert(&(2, 3), 1);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = Cache::<(u64, u64), i32>::new(4);
        cache.insert(&(1, 2), 3);
        cache.clear();
        assert_eq!(cache.get(&(1, 2)), None);
    }
}
