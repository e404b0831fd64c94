//! Clock tick service.
//!
//! The ticker thread sleeps until absolute deadlines on a monotonic clock, so
//! ticks do not drift, and publishes the elapsed milliseconds through
//! [`SystemClock::update_timer`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use uel_core::SystemClock;

use crate::PortError;

/// Default tick rate in Hz
pub const DEFAULT_TICK_RATE_HZ: u32 = 1_000;

/// Highest supported tick rate in Hz
pub const MAX_TICK_RATE_HZ: u32 = 10_000;

const NSEC_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerConfig {
    pub rate_hz: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_TICK_RATE_HZ,
        }
    }
}

impl TickerConfig {
    pub fn new(rate_hz: u32) -> Self {
        Self { rate_hz }
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        Duration::from_nanos(NSEC_PER_SEC / u64::from(self.rate_hz.max(1)))
    }

    fn validate(&self) -> Result<(), PortError> {
        if self.rate_hz == 0 || self.rate_hz > MAX_TICK_RATE_HZ {
            return Err(PortError::InvalidTickRate(self.rate_hz));
        }
        Ok(())
    }
}

/// Running ticker thread. Stops when dropped.
pub struct Ticker {
    config: TickerConfig,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a ticker writing to `clock`.
    ///
    /// The clock time starts at zero when the thread starts.
    pub fn start(clock: &'static SystemClock, config: TickerConfig) -> Result<Self, PortError> {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let period = config.period();
        let thread = thread::Builder::new()
            .name("uel-ticker".into())
            .spawn(move || run(clock, period, &flag))?;

        log::debug!("ticker started at {} Hz", config.rate_hz);
        Ok(Self {
            config,
            running,
            thread: Some(thread),
        })
    }

    pub fn config(&self) -> TickerConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("ticker thread panicked");
            }
            log::debug!("ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("rate_hz", &self.config.rate_hz)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run(clock: &SystemClock, period: Duration, running: &AtomicBool) {
    let start = Instant::now();
    let mut next_tick = start;

    while running.load(Ordering::Acquire) {
        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        clock.update_timer(elapsed_ms(start));
    }
}

/// Milliseconds since `start`, wrapping like the hardware counter would.
fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis() as u32
}
