//! Growable, typed storage for things registered at runtime.
//!
//! Scripts register extra text objects, registers and actions while the
//! editor runs. Each kind lives in its own `DynArray<T>`, and the handle a
//! caller gets back is simply the index.
//!
//! Growth is fallible: capacity is reserved with `try_reserve` (at least 16
//! slots, doubling afterwards) so that running out of memory surfaces as
//! [`CoreError::OutOfMemory`] instead of aborting the process.

use crate::{CoreError, CoreResult};

const MIN_CAPACITY: usize = 16;

/// A typed growable array with fallible growth.
#[derive(Debug, Clone)]
pub struct DynArray<T> {
    items: Vec<T>,
}

impl<T> DynArray<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Makes sure at least `count` elements fit without reallocating.
    pub fn reserve(&mut self, count: usize) -> CoreResult<()> {
        let count = count.max(MIN_CAPACITY);
        if self.items.capacity() < count {
            let target = count.max(self.items.capacity() * 2);
            self.items.try_reserve_exact(target - self.items.len())?;
        }
        Ok(())
    }

    /// Appends an element and returns its index.
    pub fn push(&mut self, item: T) -> CoreResult<usize> {
        self.reserve(self.items.len() + 1)?;
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    /// Replaces the element at `idx`.
    pub fn set(&mut self, idx: usize, item: T) -> CoreResult<()> {
        let slot = self
            .items
            .get_mut(idx)
            .ok_or(CoreError::IndexOutOfBounds(idx))?;
        *slot = item;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_index() {
        let mut arr = DynArray::new();
        assert_eq!(arr.push("a").unwrap(), 0);
        assert_eq!(arr.push("b").unwrap(), 1);
        assert_eq!(arr.get(1), Some(&"b"));
        assert_eq!(arr.get(2), None);
    }

    #[test]
    fn test_growth_policy() {
        let mut arr = DynArray::new();
        arr.push(0u8).unwrap();
        assert!(arr.capacity() >= MIN_CAPACITY);
        for i in 1..=MIN_CAPACITY as u8 {
            arr.push(i).unwrap();
        }
        assert!(arr.capacity() >= 2 * MIN_CAPACITY);
        assert_eq!(arr.len(), MIN_CAPACITY + 1);
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut arr: DynArray<u32> = DynArray::new();
        assert!(matches!(arr.set(0, 1), Err(CoreError::IndexOutOfBounds(0))));
        arr.push(1).unwrap();
        arr.set(0, 7).unwrap();
        assert_eq!(arr.iter().copied().collect::<Vec<_>>(), vec![7]);
        assert_eq!(arr.pop(), Some(7));
        assert!(arr.is_empty());
    }
}
