//! Millisecond timekeeping for the scheduler.
//!
//! Time is a free-running 32-bit millisecond counter. Comparisons are done on
//! the signed difference of two instants so that the counter may wrap around
//! every ~49.7 days without disturbing the ordering of timers that are less
//! than 2^31 ms apart.

#[cfg(not(feature = "critical-section"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(feature = "critical-section")]
use core::cell::Cell;
#[cfg(feature = "critical-section")]
use critical_section::Mutex;

/// Instant at which `delay_ms` elapses after `now_ms`.
#[inline]
pub const fn deadline(now_ms: u32, delay_ms: u32) -> u32 {
    now_ms.wrapping_add(delay_ms)
}

/// Whether a timer due at `due_ms` has expired at `now_ms`.
#[inline]
pub const fn is_due(due_ms: u32, now_ms: u32) -> bool {
    (due_ms.wrapping_sub(now_ms) as i32) <= 0
}

/// Whether instant `a` comes strictly before instant `b`.
#[inline]
pub const fn precedes(a_ms: u32, b_ms: u32) -> bool {
    (a_ms.wrapping_sub(b_ms) as i32) < 0
}

/// Milliseconds remaining until `due_ms`, zero once it is due.
#[inline]
pub const fn remaining(due_ms: u32, now_ms: u32) -> u32 {
    if is_due(due_ms, now_ms) {
        0
    } else {
        due_ms.wrapping_sub(now_ms)
    }
}

/// The application timer shared between the main loop and the time source.
///
/// [`update_timer`](Self::update_timer) is the only operation meant to be
/// called from an asynchronous context such as a timer interrupt. It performs
/// exactly two stores: the 32-bit timer word, then the scheduler flag. The main
/// loop clears the flag *before* reading the timer, so an update that races
/// with a tick is picked up by the next one.
///
/// By default both fields are atomics using plain loads and stores, which only
/// requires native word-sized atomic access (no compare-and-swap). Targets
/// lacking it enable the `critical-section` feature, which guards both fields
/// with a [`critical_section::Mutex`] instead.
pub struct SystemClock {
    #[cfg(not(feature = "critical-section"))]
    timer_ms: AtomicU32,
    #[cfg(not(feature = "critical-section"))]
    run_scheduler: AtomicBool,

    #[cfg(feature = "critical-section")]
    timer_ms: Mutex<Cell<u32>>,
    #[cfg(feature = "critical-section")]
    run_scheduler: Mutex<Cell<bool>>,
}

#[cfg(not(feature = "critical-section"))]
impl SystemClock {
    /// Create a clock at t = 0 with no pending scheduler run
    pub const fn new() -> Self {
        Self {
            timer_ms: AtomicU32::new(0),
            run_scheduler: AtomicBool::new(false),
        }
    }

    /// Set the current time and request a scheduler run
    #[inline]
    pub fn update_timer(&self, now_ms: u32) {
        self.timer_ms.store(now_ms, Ordering::Release);
        self.run_scheduler.store(true, Ordering::Release);
    }

    /// Current time in milliseconds
    #[inline]
    pub fn now(&self) -> u32 {
        self.timer_ms.load(Ordering::Acquire)
    }

    /// Whether a scheduler run is pending
    #[inline]
    pub fn run_scheduler(&self) -> bool {
        self.run_scheduler.load(Ordering::Acquire)
    }

    /// Request a scheduler run on the next tick without touching the time
    #[inline]
    pub fn request_scheduler_run(&self) {
        self.run_scheduler.store(true, Ordering::Release);
    }

    /// Consume a pending scheduler run request.
    ///
    /// Load followed by store, never a read-modify-write: the only concurrent
    /// writer stores `true`, and losing that store is harmless because the
    /// timer word it guards is read after the flag is cleared.
    #[inline]
    pub fn take_run_scheduler(&self) -> bool {
        if self.run_scheduler.load(Ordering::Acquire) {
            self.run_scheduler.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }
}

#[cfg(feature = "critical-section")]
impl SystemClock {
    /// Create a clock at t = 0 with no pending scheduler run
    pub const fn new() -> Self {
        Self {
            timer_ms: Mutex::new(Cell::new(0)),
            run_scheduler: Mutex::new(Cell::new(false)),
        }
    }

    /// Set the current time and request a scheduler run
    pub fn update_timer(&self, now_ms: u32) {
        critical_section::with(|cs| {
            self.timer_ms.borrow(cs).set(now_ms);
            self.run_scheduler.borrow(cs).set(true);
        })
    }

    /// Current time in milliseconds
    pub fn now(&self) -> u32 {
        critical_section::with(|cs| self.timer_ms.borrow(cs).get())
    }

    /// Whether a scheduler run is pending
    pub fn run_scheduler(&self) -> bool {
        critical_section::with(|cs| self.run_scheduler.borrow(cs).get())
    }

    /// Request a scheduler run on the next tick without touching the time
    pub fn request_scheduler_run(&self) {
        critical_section::with(|cs| self.run_scheduler.borrow(cs).set(true))
    }

    /// Consume a pending scheduler run request
    pub fn take_run_scheduler(&self) -> bool {
        critical_section::with(|cs| self.run_scheduler.borrow(cs).replace(false))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SystemClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemClock")
            .field("timer_ms", &self.now())
            .field("run_scheduler", &self.run_scheduler())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_comparison_wraps() {
        assert!(is_due(100, 100));
        assert!(is_due(100, 150));
        assert!(!is_due(100, 99));

        let due = deadline(u32::MAX - 10, 20);
        assert_eq!(due, 9);
        assert!(!is_due(due, u32::MAX - 5));
        assert!(is_due(due, 9));
        assert!(is_due(due, 30));
    }

    #[test]
    fn precedence_wraps() {
        assert!(precedes(1, 2));
        assert!(!precedes(2, 2));
        assert!(precedes(u32::MAX, 0));
    }

    #[test]
    fn remaining_saturates_at_zero() {
        assert_eq!(remaining(100, 40), 60);
        assert_eq!(remaining(100, 100), 0);
        assert_eq!(remaining(100, 500), 0);
    }

    #[test]
    fn clock_flag_roundtrip() {
        let clock = SystemClock::new();
        assert_eq!(clock.now(), 0);
        assert!(!clock.run_scheduler());

        clock.update_timer(42);
        assert_eq!(clock.now(), 42);
        assert!(clock.take_run_scheduler());
        assert!(!clock.take_run_scheduler());

        clock.request_scheduler_run();
        assert!(clock.run_scheduler());
        assert_eq!(clock.now(), 42);
    }
}
