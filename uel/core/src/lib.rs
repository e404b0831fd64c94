#![no_std]
#![forbid(unsafe_code)]

//! # uel-core
//!
//! Core types shared by every layer of the event loop: the error type, the
//! wrap-aware millisecond arithmetic, the [`SystemClock`] written by the timer
//! interrupt, and the compile-time sizing constants.

pub mod config;
pub mod time;

pub use time::*;

/// Result type used throughout the event loop
pub type UelResult<T> = Result<T, UelError>;

/// Error kinds reported by pools, queues, the scheduler and the signal relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UelError {
    /// An object pool has no free slots left
    #[error("object pool depleted")]
    PoolDepleted,
    /// A slot was released to a pool it does not belong to, or twice
    #[error("object pool overflow")]
    PoolOverflow,
    /// A queue is at capacity
    #[error("queue is full")]
    QueueFull,
    /// A queue has nothing left to dequeue
    #[error("queue is empty")]
    QueueEmpty,
    /// A signal already has the maximum number of listeners
    #[error("signal listeners exhausted")]
    RelayListenersExhausted,
    /// The signal id is outside of the relay width
    #[error("invalid signal id")]
    InvalidSignalId,
    /// The handle refers to an object that has since been released
    #[error("stale handle")]
    StaleHandle,
}

impl UelError {
    /// Whether the error is a resource budgeting fault rather than an
    /// expected condition
    pub const fn is_budget_fault(self) -> bool {
        matches!(
            self,
            UelError::PoolDepleted
                | UelError::PoolOverflow
                | UelError::QueueFull
                | UelError::RelayListenersExhausted
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UelError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            UelError::PoolDepleted => defmt::write!(fmt, "PoolDepleted"),
            UelError::PoolOverflow => defmt::write!(fmt, "PoolOverflow"),
            UelError::QueueFull => defmt::write!(fmt, "QueueFull"),
            UelError::QueueEmpty => defmt::write!(fmt, "QueueEmpty"),
            UelError::RelayListenersExhausted => defmt::write!(fmt, "RelayListenersExhausted"),
            UelError::InvalidSignalId => defmt::write!(fmt, "InvalidSignalId"),
            UelError::StaleHandle => defmt::write!(fmt, "StaleHandle"),
        }
    }
}

/// Callback receiving faults that cannot be returned to a caller, such as a
/// repeating timer that could not be re-admitted during a tick.
pub type Diagnostic = fn(UelError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_faults() {
        assert!(UelError::PoolDepleted.is_budget_fault());
        assert!(UelError::QueueFull.is_budget_fault());
        assert!(!UelError::QueueEmpty.is_budget_fault());
        assert!(!UelError::StaleHandle.is_budget_fault());
    }
}
