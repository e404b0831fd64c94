//! Fixed-capacity FIFO ring indexed with a power-of-two mask.

use uel_core::{UelError, UelResult};

/// Circular FIFO queue of `N` copyable items.
///
/// `N` must be a power of two so positions can be wrapped with `& (N - 1)`.
/// Unlike a two-index ring, the element count is tracked explicitly and all
/// `N` slots are usable.
pub struct CircularQueue<T: Copy, const N: usize> {
    buffer: [Option<T>; N],
    tail: usize,
    count: usize,
}

impl<T: Copy, const N: usize> CircularQueue<T, N> {
    const MASK: usize = N - 1;

    /// Create a new empty queue
    ///
    /// # Panics
    ///
    /// If `N` is not a power of two. In a `const` context this is a
    /// compile-time error.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "queue capacity must be a power of two");
        Self {
            buffer: [None; N],
            tail: 0,
            count: 0,
        }
    }

    /// Append an item at the tail
    pub fn push(&mut self, item: T) -> UelResult<()> {
        if self.is_full() {
            return Err(UelError::QueueFull);
        }
        self.buffer[self.tail] = Some(item);
        self.tail = (self.tail + 1) & Self::MASK;
        self.count += 1;
        Ok(())
    }

    /// Remove the item at the head
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let head = self.head_index();
        self.count -= 1;
        self.buffer[head].take()
    }

    /// Item at the head, without removing it
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.buffer[self.head_index()].as_ref()
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Maximum number of items
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop every queued item
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.tail = 0;
    }

    /// Iterate from head to tail without dequeuing
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let head = self.head_index();
        (0..self.count).filter_map(move |offset| self.buffer[(head + offset) & Self::MASK].as_ref())
    }

    fn head_index(&self) -> usize {
        self.tail.wrapping_sub(self.count) & Self::MASK
    }
}

impl<T: Copy, const N: usize> Default for CircularQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + core::fmt::Debug, const N: usize> core::fmt::Debug for CircularQueue<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
