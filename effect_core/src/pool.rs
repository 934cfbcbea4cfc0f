//! Object pool for hot-path gameplay objects

/// A type that can be reset and reused
pub trait Poolable {
    /// Reset every field to its default and drop owned children
    fn clear(&mut self);
}

/// A free list of reusable values
///
/// Released values are always cleared before they become available again,
/// so `acquire` never hands out stale state.
#[derive(Debug)]
pub struct Pool<T: Poolable + Default> {
    free: Vec<T>,
    lists: Vec<Vec<T>>,
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Pool {
            free: Vec::new(),
            lists: Vec::new(),
        }
    }
}

impl<T: Poolable + Default> Pool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a cleared value from the pool, or make a fresh one
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Clear a value and make it available for reuse
    pub fn release(&mut self, mut value: T) {
        value.clear();
        self.free.push(value);
    }

    /// Take an empty list from the pool
    pub fn acquire_list(&mut self) -> Vec<T> {
        self.lists.pop().unwrap_or_default()
    }

    /// Return a list; its elements are released too
    pub fn release_list(&mut self, mut list: Vec<T>) {
        for value in list.drain(..) {
            self.release(value);
        }
        self.lists.push(list);
    }

    /// Number of values waiting for reuse
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}
