//! The handle closures run against.
//!
//! [`Runtime`] exposes everything a closure may do to the system while it
//! runs: post closures, schedule and cancel timers, listen to and emit
//! signals. It cannot tick, so a closure never re-enters the event loop.

use uel_core::UelResult;

use crate::closure::{Closure, Value};
use crate::event::{Event, EventHandle, ListenerHandle, Signal, TimerHandle};
use crate::event_loop::post_event;
use crate::pools::SystemPools;
use crate::queues::SystemQueues;
use crate::scheduler::Scheduler;
use crate::signal::SignalRelay;

pub trait Runtime<'a> {
    /// Last time written to the system clock, in milliseconds.
    fn now(&self) -> u32;

    /// Push a closure to the event queue.
    fn enqueue_closure(&mut self, closure: Closure<'a>) -> UelResult<EventHandle<'a>>;

    /// Run a closure once, `delay_ms` from now.
    fn run_later(&mut self, delay_ms: u32, closure: Closure<'a>) -> UelResult<TimerHandle<'a>>;

    /// Run a closure every `period_ms`, and right away if `immediate`.
    fn run_at_intervals(
        &mut self,
        period_ms: u32,
        immediate: bool,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>>;

    /// Cancel a pending timer or enqueued closure.
    fn cancel(&mut self, event: EventHandle<'a>) -> UelResult<()>;

    fn listen(&mut self, signal: Signal, closure: Closure<'a>, once: bool) -> UelResult<ListenerHandle<'a>>;

    fn unlisten(&mut self, listener: ListenerHandle<'a>) -> UelResult<()>;

    /// Enqueue every live listener of `signal`, returning how many were.
    fn emit(&mut self, signal: Signal, params: Value<'a>) -> UelResult<usize>;
}

/// Mutable view over the system handed to closures during a tick.
pub struct Context<'s, 'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize> {
    pub(crate) pools: &'s mut SystemPools<'a, EP, NP>,
    pub(crate) queues: &'s mut SystemQueues<'a, EQ, SQ>,
    pub(crate) scheduler: &'s Scheduler<'a>,
    pub(crate) relay: &'s mut SignalRelay<'a, W>,
}

impl<'s, 'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize>
    Context<'s, 'a, EP, NP, EQ, SQ, W>
{
    pub fn new(
        pools: &'s mut SystemPools<'a, EP, NP>,
        queues: &'s mut SystemQueues<'a, EQ, SQ>,
        scheduler: &'s Scheduler<'a>,
        relay: &'s mut SignalRelay<'a, W>,
    ) -> Self {
        Self {
            pools,
            queues,
            scheduler,
            relay,
        }
    }

    pub fn pools(&self) -> &SystemPools<'a, EP, NP> {
        self.pools
    }

    pub fn queues(&self) -> &SystemQueues<'a, EQ, SQ> {
        self.queues
    }
}

impl<'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize> Runtime<'a>
    for Context<'_, 'a, EP, NP, EQ, SQ, W>
{
    fn now(&self) -> u32 {
        self.scheduler.now()
    }

    fn enqueue_closure(&mut self, closure: Closure<'a>) -> UelResult<EventHandle<'a>> {
        post_event(self.pools, self.queues, Event::new_closure(closure, Value::None))
    }

    fn run_later(&mut self, delay_ms: u32, closure: Closure<'a>) -> UelResult<TimerHandle<'a>> {
        self.scheduler.run_later(self.pools, self.queues, delay_ms, closure)
    }

    fn run_at_intervals(
        &mut self,
        period_ms: u32,
        immediate: bool,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>> {
        self.scheduler
            .run_at_intervals(self.pools, self.queues, period_ms, immediate, closure)
    }

    fn cancel(&mut self, event: EventHandle<'a>) -> UelResult<()> {
        self.scheduler.cancel(self.pools, event)
    }

    fn listen(&mut self, signal: Signal, closure: Closure<'a>, once: bool) -> UelResult<ListenerHandle<'a>> {
        self.relay.listen(self.pools, signal, closure, once)
    }

    fn unlisten(&mut self, listener: ListenerHandle<'a>) -> UelResult<()> {
        self.relay.unlisten(self.pools, listener)
    }

    fn emit(&mut self, signal: Signal, params: Value<'a>) -> UelResult<usize> {
        self.relay.emit(self.pools, self.queues, signal, params)
    }
}
