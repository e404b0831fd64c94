//! Application container.
//!
//! [`Application`] owns the system pools and queues together with the event
//! loop, the scheduler and the signal relay, and borrows the [`SystemClock`]
//! written by the platform timer. A typical main loop is:
//!
//! ```ignore
//! static CLOCK: SystemClock = SystemClock::new();
//!
//! let mut app: Application = Application::new(&CLOCK);
//! app.run_at_intervals(500, false, Closure::new(&blink))?;
//! loop {
//!     app.tick();
//! }
//! ```
//!
//! while the timer interrupt calls `CLOCK.update_timer(ms)`.

use uel_core::config::{
    EVENT_POOL_SIZE, EVENT_QUEUE_SIZE, LLIST_NODE_POOL_SIZE, SCHEDULE_QUEUE_SIZE, SIGNAL_MAX_LISTENERS,
};
use uel_core::{Diagnostic, SystemClock, UelError, UelResult};

use crate::closure::{Closure, Value};
use crate::event::{EventHandle, ListenerHandle, Signal, TimerHandle};
use crate::event_loop::EventLoop;
use crate::pools::SystemPools;
use crate::queues::SystemQueues;
use crate::runtime::{Context, Runtime};
use crate::scheduler::Scheduler;
use crate::signal::SignalRelay;

/// Application-level signals served by the default relay width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum AppEvent {
    Ready = 0,
    Crashed = 1,
    Idle = 2,
}

impl AppEvent {
    pub const COUNT: usize = 3;
}

/// Default relay width of an [`Application`].
pub const APP_SIGNAL_COUNT: usize = AppEvent::COUNT;

impl From<AppEvent> for Signal {
    fn from(event: AppEvent) -> Self {
        Signal(event as u16)
    }
}

/// Runtime options of an application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: &'static str,
    /// Listener cap per signal.
    pub max_listeners: usize,
    /// Receives faults raised inside a tick.
    pub diagnostic: Option<Diagnostic>,
    /// Called by ticks that ran nothing.
    pub idle_callback: Option<fn()>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "uel",
            max_listeners: SIGNAL_MAX_LISTENERS,
            diagnostic: None,
            idle_callback: None,
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    pub fn max_listeners(mut self, max: usize) -> Self {
        self.config.max_listeners = max;
        self
    }

    /// Sets the hook receiving faults raised inside a tick.
    pub fn diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.config.diagnostic = Some(diagnostic);
        self
    }

    /// Sets the callback run by ticks that found nothing to do.
    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// Top-level container of the event loop.
///
/// Capacities default to [`uel_core::config`]; the relay serves
/// [`APP_SIGNAL_COUNT`] signals unless `W` says otherwise.
pub struct Application<
    'a,
    const EP: usize = EVENT_POOL_SIZE,
    const NP: usize = LLIST_NODE_POOL_SIZE,
    const EQ: usize = EVENT_QUEUE_SIZE,
    const SQ: usize = SCHEDULE_QUEUE_SIZE,
    const W: usize = APP_SIGNAL_COUNT,
> {
    config: AppConfig,
    clock: &'a SystemClock,
    pools: SystemPools<'a, EP, NP>,
    queues: SystemQueues<'a, EQ, SQ>,
    event_loop: EventLoop<'a>,
    scheduler: Scheduler<'a>,
    relay: SignalRelay<'a, W>,
}

impl<'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize>
    Application<'a, EP, NP, EQ, SQ, W>
{
    pub fn new(clock: &'a SystemClock) -> Self {
        Self::with_config(clock, AppConfig::default())
    }

    pub fn with_config(clock: &'a SystemClock, config: AppConfig) -> Self {
        // Timers admitted before the first clock update are still checked.
        clock.request_scheduler_run();
        log::debug!(
            "{}: {} events, {} nodes, queues {}/{}, {} signals",
            config.name,
            EP,
            NP,
            EQ,
            SQ,
            W
        );

        Self {
            clock,
            pools: SystemPools::new(),
            queues: SystemQueues::new(),
            event_loop: EventLoop::new(clock).with_diagnostic(config.diagnostic),
            scheduler: Scheduler::new(clock),
            relay: SignalRelay::new(config.max_listeners),
            config,
        }
    }

    /// Run one iteration of the loop, returning how many closures ran.
    ///
    /// Due timers are promoted first if the clock was updated since the last
    /// promotion, then the events enqueued so far are dispatched. The idle
    /// callback runs when nothing was dispatched.
    pub fn tick(&mut self) -> usize {
        if self.clock.take_run_scheduler() {
            if let Err(err) = self.scheduler.manage_timers(&mut self.pools, &mut self.queues) {
                self.report(err);
            }
        }

        let mut ctx = Context::new(&mut self.pools, &mut self.queues, &self.scheduler, &mut self.relay);
        let invoked = self.event_loop.tick(&mut ctx);

        if invoked == 0 {
            if let Some(idle) = self.config.idle_callback {
                idle();
            }
        }
        invoked
    }

    /// Store the current time and request a scheduler run.
    pub fn update_timer(&self, now_ms: u32) {
        self.scheduler.update_timer(now_ms);
    }

    pub fn timer(&self) -> u32 {
        self.clock.now()
    }

    pub fn run_scheduler(&self) -> bool {
        self.clock.run_scheduler()
    }

    pub fn enqueue_closure(&mut self, closure: Closure<'a>) -> UelResult<EventHandle<'a>> {
        self.context().enqueue_closure(closure)
    }

    pub fn run_later(&mut self, delay_ms: u32, closure: Closure<'a>) -> UelResult<TimerHandle<'a>> {
        self.context().run_later(delay_ms, closure)
    }

    pub fn run_at_intervals(
        &mut self,
        period_ms: u32,
        immediate: bool,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>> {
        self.context().run_at_intervals(period_ms, immediate, closure)
    }

    pub fn cancel(&mut self, event: EventHandle<'a>) -> UelResult<()> {
        self.context().cancel(event)
    }

    pub fn listen(
        &mut self,
        signal: impl Into<Signal>,
        closure: Closure<'a>,
        once: bool,
    ) -> UelResult<ListenerHandle<'a>> {
        self.context().listen(signal.into(), closure, once)
    }

    pub fn unlisten(&mut self, listener: ListenerHandle<'a>) -> UelResult<()> {
        self.context().unlisten(listener)
    }

    pub fn emit(&mut self, signal: impl Into<Signal>, params: Value<'a>) -> UelResult<usize> {
        self.context().emit(signal.into(), params)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn clock(&self) -> &'a SystemClock {
        self.clock
    }

    pub fn pools(&self) -> &SystemPools<'a, EP, NP> {
        &self.pools
    }

    pub fn queues(&self) -> &SystemQueues<'a, EQ, SQ> {
        &self.queues
    }

    pub fn event_loop(&self) -> &EventLoop<'a> {
        &self.event_loop
    }

    pub fn scheduler(&self) -> &Scheduler<'a> {
        &self.scheduler
    }

    pub fn relay(&self) -> &SignalRelay<'a, W> {
        &self.relay
    }

    fn context(&mut self) -> Context<'_, 'a, EP, NP, EQ, SQ, W> {
        Context::new(&mut self.pools, &mut self.queues, &self.scheduler, &mut self.relay)
    }

    fn report(&self, err: UelError) {
        log::warn!("{}: {}", self.config.name, err);
        if let Some(diagnostic) = self.config.diagnostic {
            diagnostic(err);
        }
    }
}

impl<'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize> Runtime<'a>
    for Application<'a, EP, NP, EQ, SQ, W>
{
    fn now(&self) -> u32 {
        self.timer()
    }

    fn enqueue_closure(&mut self, closure: Closure<'a>) -> UelResult<EventHandle<'a>> {
        self.context().enqueue_closure(closure)
    }

    fn run_later(&mut self, delay_ms: u32, closure: Closure<'a>) -> UelResult<TimerHandle<'a>> {
        self.context().run_later(delay_ms, closure)
    }

    fn run_at_intervals(
        &mut self,
        period_ms: u32,
        immediate: bool,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>> {
        self.context().run_at_intervals(period_ms, immediate, closure)
    }

    fn cancel(&mut self, event: EventHandle<'a>) -> UelResult<()> {
        self.context().cancel(event)
    }

    fn listen(&mut self, signal: Signal, closure: Closure<'a>, once: bool) -> UelResult<ListenerHandle<'a>> {
        self.context().listen(signal, closure, once)
    }

    fn unlisten(&mut self, listener: ListenerHandle<'a>) -> UelResult<()> {
        self.context().unlisten(listener)
    }

    fn emit(&mut self, signal: Signal, params: Value<'a>) -> UelResult<usize> {
        self.context().emit(signal, params)
    }
}

impl<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize> core::fmt::Debug
    for Application<'_, EP, NP, EQ, SQ, W>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.config.name)
            .field("clock", self.clock)
            .field("pools", &self.pools)
            .field("queues", &self.queues)
            .field("event_loop", &self.event_loop)
            .field("relay", &self.relay)
            .finish()
    }
}
