// Sparse set over instruction pointers
// O(1) insert, membership and clear; iteration in insertion order, which is
// what gives matcher threads their priority.

use crate::compiler::InstPtr;

#[derive(Debug, Clone)]
pub(crate) struct SparseSet {
    dense: Vec<InstPtr>,
    sparse: Vec<usize>,
    len: usize,
}

impl SparseSet {
    pub fn new(capacity: usize) -> Self {
        SparseSet {
            dense: vec![0; capacity],
            sparse: vec![0; capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    pub fn resize(&mut self, capacity: usize) {
        self.dense.resize(capacity, 0);
        self.sparse.resize(capacity, 0);
        self.len = 0;
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, pc: InstPtr) -> bool {
        let i = self.sparse[pc];
        i < self.len && self.dense[i] == pc
    }

    /// Insert `pc`; returns false if it was already present.
    #[inline]
    pub fn insert(&mut self, pc: InstPtr) -> bool {
        if self.contains(pc) {
            return false;
        }
        self.dense[self.len] = pc;
        self.sparse[pc] = self.len;
        self.len += 1;
        true
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = InstPtr> + '_ {
        self.dense[..self.len].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_dedups() {
        let mut set = SparseSet::new(8);
        assert!(set.insert(5));
        assert!(set.insert(2));
        assert!(!set.insert(5));
        assert!(set.insert(7));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5, 2, 7]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut set = SparseSet::new(4);
        set.insert(1);
        set.insert(3);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(1));
        assert!(set.insert(3));
    }

    #[test]
    fn test_resize() {
        let mut set = SparseSet::new(2);
        set.insert(1);
        set.resize(10);
        assert_eq!(set.capacity(), 10);
        assert!(set.is_empty());
        assert!(set.insert(9));
    }
}
