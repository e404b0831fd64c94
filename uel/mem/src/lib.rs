#![no_std]
#![forbid(unsafe_code)]

//! # uel-mem
//!
//! Deterministic storage for the event loop. Everything here has a capacity
//! fixed at construction and never touches a heap:
//!
//! - [`CircularQueue`]: power-of-two FIFO ring.
//! - [`ObjectPool`]: typed slab handing out generational [`PoolHandle`]s.
//! - [`LinkedList`]: doubly-linked list whose nodes live in an object pool.

pub mod cqueue;
pub mod llist;
pub mod pool;

pub use cqueue::*;
pub use llist::*;
pub use pool::*;

/// Object pool statistics for budgeting and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of slots in the pool
    pub total_slots: usize,
    /// Number of slots currently free
    pub free_slots: usize,
    /// Number of slots currently acquired
    pub used_slots: usize,
    /// Lowest number of free slots ever observed
    pub min_free_slots: usize,
}

impl PoolStats {
    /// Statistics of a pool with every slot free
    pub const fn new(total_slots: usize) -> Self {
        Self {
            total_slots,
            free_slots: total_slots,
            used_slots: 0,
            min_free_slots: total_slots,
        }
    }

    /// Update statistics after an acquire
    pub fn on_acquire(&mut self) {
        self.used_slots += 1;
        self.free_slots -= 1;
        if self.free_slots < self.min_free_slots {
            self.min_free_slots = self.free_slots;
        }
    }

    /// Update statistics after a release
    pub fn on_release(&mut self) {
        if self.used_slots > 0 {
            self.used_slots -= 1;
            self.free_slots += 1;
        }
    }

    /// Whether every slot is acquired
    pub const fn is_depleted(&self) -> bool {
        self.free_slots == 0
    }

    /// Peak number of simultaneously acquired slots
    pub const fn high_watermark(&self) -> usize {
        self.total_slots - self.min_free_slots
    }

    /// Utilization as a percentage (0-100)
    pub fn utilization(&self) -> u8 {
        if self.total_slots == 0 {
            0
        } else {
            ((self.used_slots * 100) / self.total_slots) as u8
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PoolStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "PoolStats{{ total: {}, free: {}, used: {}, min_free: {} }}",
            self.total_slots,
            self.free_slots,
            self.used_slots,
            self.min_free_slots
        );
    }
}
