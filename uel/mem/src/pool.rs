//! Typed object pools with generational handles.

use core::fmt;
use core::marker::PhantomData;

use uel_core::{UelError, UelResult};

use crate::cqueue::CircularQueue;
use crate::PoolStats;

/// Opaque reference to an object acquired from an [`ObjectPool`].
///
/// A handle is an index plus the generation of the slot at the time it was
/// acquired. Releasing a slot bumps its generation, so handles kept past
/// release are detected instead of aliasing whatever reuses the slot.
pub struct PoolHandle<T> {
    index: u16,
    generation: u16,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolHandle<T> {
    const fn new(index: u16, generation: u16) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index within the pool
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation captured at acquire time
    pub const fn generation(self) -> u16 {
        self.generation
    }
}

impl<T> Clone for PoolHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolHandle<T> {}

impl<T> PartialEq for PoolHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for PoolHandle<T> {}

impl<T> fmt::Debug for PoolHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolHandle({}#{})", self.index, self.generation)
    }
}

#[cfg(feature = "defmt")]
impl<T> defmt::Format for PoolHandle<T> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "PoolHandle({}#{})", self.index, self.generation);
    }
}

struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

/// Preallocated array of `N` uniform objects.
///
/// Free slots are tracked by a [`CircularQueue`] of indices populated with
/// every slot at construction: acquiring dequeues an index, releasing enqueues
/// it back. `N` must be a power of two and fit a 16-bit index.
///
/// The pool never resets a slot on its own; [`acquire`](Self::acquire) takes
/// the value the slot starts with.
pub struct ObjectPool<T, const N: usize> {
    slots: heapless::Vec<Slot<T>, N>,
    free: CircularQueue<u16, N>,
    stats: PoolStats,
}

impl<T, const N: usize> ObjectPool<T, N> {
    /// Create a pool with every slot free
    ///
    /// # Panics
    ///
    /// If `N` is not a power of two or exceeds 65536.
    pub fn new() -> Self {
        assert!(N <= u16::MAX as usize + 1, "pool capacity exceeds 16-bit indices");

        let mut slots = heapless::Vec::new();
        let mut free = CircularQueue::new();
        for index in 0..N {
            // Both containers hold exactly N items.
            let _ = slots.push(Slot {
                generation: 0,
                value: None,
            });
            let _ = free.push(index as u16);
        }

        Self {
            slots,
            free,
            stats: PoolStats::new(N),
        }
    }

    /// Take a free slot and move `value` into it
    pub fn acquire(&mut self, value: T) -> UelResult<PoolHandle<T>> {
        let index = self.free.pop().ok_or(UelError::PoolDepleted)?;
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.stats.on_acquire();
        Ok(PoolHandle::new(index, slot.generation))
    }

    /// Return a slot to the pool, handing back the value it held.
    ///
    /// Fails with [`UelError::PoolOverflow`] when the handle does not name a
    /// live slot of this pool: out of range, stale or already released.
    /// Handles carry no pool identity, so a live handle from another pool of
    /// the same type with a matching index and generation is accepted.
    pub fn release(&mut self, handle: PoolHandle<T>) -> UelResult<T> {
        if self.free.is_full() || !self.contains(handle) {
            return Err(UelError::PoolOverflow);
        }

        let slot = &mut self.slots[handle.index()];
        let value = slot.value.take().ok_or(UelError::PoolOverflow)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index)?;
        self.stats.on_release();
        Ok(value)
    }

    /// Whether the handle names a live slot of this pool
    pub fn contains(&self, handle: PoolHandle<T>) -> bool {
        self.slots
            .get(handle.index())
            .map_or(false, |slot| slot.generation == handle.generation && slot.value.is_some())
    }

    pub fn get(&self, handle: PoolHandle<T>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: PoolHandle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Whether every slot has been given out
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T, const N: usize> Default for ObjectPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for ObjectPool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &N)
            .field("available", &self.available())
            .finish()
    }
}
