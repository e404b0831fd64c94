//! # uel-posix
//!
//! Host port of the event loop. A [`Ticker`] thread plays the part of the
//! timer interrupt: it periodically writes the milliseconds elapsed on a
//! monotonic clock into a [`SystemClock`](uel_core::SystemClock).

pub mod ticker;

pub use ticker::{Ticker, TickerConfig, DEFAULT_TICK_RATE_HZ, MAX_TICK_RATE_HZ};

/// Errors raised by the host port
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("tick rate {0} Hz outside of 1..=10000 Hz")]
    InvalidTickRate(u32),
    #[error("failed to spawn ticker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Install `env_logger`, honouring `RUST_LOG` over `default_level`.
///
/// Does nothing if a logger is already installed.
pub fn init_logging(default_level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
