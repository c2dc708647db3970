use std::cmp::min;

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
    occupied: bool,
    refs: u32,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            next: 0,
            occupied: false,
            refs: 0,
        }
    }
}

impl<T: Default> Default for Entry<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Fixed-capacity hash-consing table with intrusive bucket chains.
///
/// Cell 0 is a sentinel and is never handed out. The table does not resize;
/// running out of cells after a collection is fatal for the caller.
///
/// Each occupied cell carries a reference count. The count says how many
/// times the caller has asserted interest in the node; the garbage collector
/// treats every cell with a nonzero count as a root.
pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the first *possibly* free (non-occupied) cell.
    min_free: usize,
    /// Index of the last occupied cell.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
    /// Outstanding references, summed over all cells.
    total_refs: u64,
}

impl<T: Default> Table<T> {
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);
        data[0].occupied = true; // sentinel

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;

        Self {
            data,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            min_free: 1,
            last_index: 0,
            real_size: 0,
            total_refs: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Index of the last occupied cell.
    pub fn size(&self) -> usize {
        self.last_index
    }
    /// Number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }
    pub fn value_mut(&mut self, index: usize) -> &mut T {
        assert_ne!(index, 0, "Index is 0");
        &mut self.data[index].value
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].occupied
    }

    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }
    pub fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next = next;
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
    pub fn bucket(&self, bucket_index: usize) -> usize {
        self.buckets[bucket_index]
    }
    pub fn set_bucket(&mut self, bucket_index: usize, index: usize) {
        self.buckets[bucket_index] = index;
    }

    /// Increment the reference count of the cell.
    pub fn inc_ref(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        let entry = &mut self.data[index];
        assert!(entry.occupied, "Referencing a dead node");
        entry.refs = entry.refs.checked_add(1).expect("Reference count overflow");
        self.total_refs += 1;
    }

    /// Decrement the reference count of the cell.
    ///
    /// Panics if the count is already zero: an unbalanced dereference is a
    /// programmer error, not a runtime condition.
    pub fn dec_ref(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        let entry = &mut self.data[index];
        assert!(entry.occupied, "Dereferencing a dead node");
        assert!(
            entry.refs > 0,
            "Dereferencing a node with zero references (unbalanced deref of cell {})",
            index
        );
        entry.refs -= 1;
        self.total_refs -= 1;
    }

    pub fn refs(&self, index: usize) -> u32 {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].refs
    }

    /// Outstanding references, summed over all cells.
    pub fn total_refs(&self) -> u64 {
        self.total_refs
    }

    /// Indices of all occupied cells with a nonzero reference count.
    pub fn referenced_indices(&self) -> Vec<usize> {
        (1..=self.last_index)
            .filter(|&i| self.data[i].occupied && self.data[i].refs > 0)
            .collect()
    }

    /// Allocate a new cell in the table and return its index.
    pub(crate) fn alloc(&mut self) -> usize {
        let index = (self.min_free..=self.last_index)
            .find(|&i| !self.data[i].occupied)
            .unwrap_or_else(|| {
                self.last_index += 1;
                self.last_index
            });

        if index >= self.capacity() {
            panic!("Node table is full");
        }

        self.data[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;

        index
    }

    /// Drop the cell at the given index.
    ///
    /// Only unreferenced cells may be dropped; the collector never sweeps a
    /// cell the caller still holds.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert_eq!(self.data[index].refs, 0, "Dropping a referenced node");

        self.data[index].occupied = false;
        self.min_free = min(self.min_free, index);
        self.real_size -= 1;
    }

    /// Add a new value to the table and return its index.
    pub fn add(&mut self, value: T) -> usize {
        let index = self.alloc();

        self.data[index].value = value;
        self.data[index].next = 0;
        self.data[index].refs = 0;

        index
    }
}

impl<T: MyHash> Table<T> {
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table, reusing an existing cell if an equal value
    /// is already present (hash consing). Returns the cell index.
    pub fn put(&mut self, value: T) -> usize
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            let i = self.add(value);
            self.buckets[bucket_index] = i;
            return i;
        }

        loop {
            assert!(index > 0);

            if &value == self.value(index) {
                return index;
            }

            let next = self.next(index);
            if next == 0 {
                let i = self.add(value);
                self.set_next(index, i);
                return i;
            }
            index = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc() {
        let mut table = Table::<()>::new(2);
        assert_eq!(table.alloc(), 1);
        assert_eq!(table.alloc(), 2);
        assert_eq!(table.alloc(), 3);
    }

    #[test]
    #[should_panic(expected = "Node table is full")]
    fn test_alloc_too_much() {
        let mut table = Table::<()>::new(2);
        assert_eq!(table.alloc(), 1);
        assert_eq!(table.alloc(), 2);
        assert_eq!(table.alloc(), 3);
        table.alloc();
    }

    #[test]
    fn test_add_and_drop() {
        let mut table = Table::new(2);
        let index = table.add(42);
        assert_eq!(*table.value(index), 42);
        assert!(table.is_occupied(index));
        table.drop(index);
        assert!(!table.is_occupied(index));
    }

    #[test]
    fn test_put_hash_consing() {
        #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
        struct Item(i32);

        impl MyHash for Item {
            fn hash(&self) -> u64 {
                self.0.unsigned_abs() as u64
            }
        }

        let mut table = Table::new(2);
        let index1 = table.put(Item(5));
        let index2 = table.put(Item(-5)); // same bucket, different value
        let index3 = table.put(Item(5)); // existing value
        assert_ne!(index1, index2);
        assert_eq!(index1, index3);
        assert_eq!(table.next(index1), index2);
    }

    #[test]
    fn test_refcount_balance() {
        let mut table = Table::new(2);
        let index = table.add(1);
        table.inc_ref(index);
        table.inc_ref(index);
        assert_eq!(table.refs(index), 2);
        assert_eq!(table.total_refs(), 2);
        assert_eq!(table.referenced_indices(), vec![index]);

        table.dec_ref(index);
        table.dec_ref(index);
        assert_eq!(table.refs(index), 0);
        assert_eq!(table.total_refs(), 0);
        assert!(table.referenced_indices().is_empty());
    }

    #[test]
    #[should_panic(expected = "zero references")]
    fn test_unbalanced_deref_rejected() {
        let mut table = Table::new(2);
        let index = table.add(1);
        table.inc_ref(index);
        table.dec_ref(index);
        table.dec_ref(index);
    }

    #[test]
    #[should_panic(expected = "Dropping a referenced node")]
    fn test_drop_referenced_rejected() {
        let mut table = Table::new(2);
        let index = table.add(1);
        table.inc_ref(index);
        table.drop(index);
    }
}
