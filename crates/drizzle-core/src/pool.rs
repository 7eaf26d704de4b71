//! LIFO free-list pool for small reusable value objects

use crate::error::{DrizzleError, Result};
use std::fmt;

/// Factory used when the free list is empty
pub type Factory<T> = Box<dyn Fn() -> T>;

/// A stack-backed pool: `put` pushes onto the free list, `get` pops the most
/// recently returned item or falls back to the factory.
///
/// Backing capacity starts at `initial_capacity` and doubles whenever a `put`
/// finds the stack full. Single-threaded only.
pub struct StackPool<T> {
    initial_capacity: usize,
    storage: Vec<T>,
    /// Logical size of the backing store (doubles on overflow)
    size: usize,
    factory: Option<Factory<T>>,
}

impl<T> StackPool<T> {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            storage: Vec::with_capacity(initial_capacity),
            size: initial_capacity,
            factory: None,
        }
    }

    pub fn with_factory(initial_capacity: usize, factory: impl Fn() -> T + 'static) -> Self {
        let mut pool = Self::new(initial_capacity);
        pool.factory = Some(Box::new(factory));
        pool
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of idle items on the free list
    pub fn available(&self) -> usize {
        self.storage.len()
    }

    /// Current backing capacity
    pub fn size(&self) -> usize {
        self.size
    }

    /// Pop an idle item, or build one with the factory.
    ///
    /// An empty pool without a factory is a programming error and yields
    /// `DrizzleError::PoolExhausted`.
    pub fn get(&mut self) -> Result<T> {
        if let Some(item) = self.storage.pop() {
            return Ok(item);
        }
        match &self.factory {
            Some(factory) => Ok(factory()),
            None => Err(DrizzleError::PoolExhausted(std::any::type_name::<T>())),
        }
    }

    /// Return an item for reuse. Ownership moves into the pool.
    pub fn put(&mut self, item: T) {
        if self.storage.len() == self.size {
            self.grow();
        }
        self.storage.push(item);
    }

    /// Fill the free list up to `count` items using the factory.
    pub fn prewarm(&mut self, count: usize) -> Result<()> {
        let Some(factory) = &self.factory else {
            return Err(DrizzleError::PoolExhausted(std::any::type_name::<T>()));
        };
        let missing = count.saturating_sub(self.storage.len());
        let fresh: Vec<T> = (0..missing).map(|_| factory()).collect();
        for item in fresh {
            self.put(item);
        }
        Ok(())
    }

    /// Drop every pooled item and shrink back to the initial capacity.
    pub fn clear(&mut self) {
        self.storage = Vec::with_capacity(self.initial_capacity);
        self.size = self.initial_capacity;
    }

    fn grow(&mut self) {
        self.size = if self.size == 0 { 2 } else { self.size * 2 };
        self.storage.reserve_exact(self.size - self.storage.len());
    }
}

impl<T> fmt::Debug for StackPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Size: {}, Available: {}", self.size, self.available())
    }
}
