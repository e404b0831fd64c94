//! The event loop.
//!
//! A tick drains at most the number of events that were enqueued when it
//! started. Work posted by the closures it runs waits for the next tick, so
//! a closure that keeps re-enqueueing itself cannot starve timers.

use uel_core::{deadline, Diagnostic, SystemClock, UelError, UelResult};

use crate::closure::{Closure, Value};
use crate::event::{Event, EventDetail, EventHandle};
use crate::pools::SystemPools;
use crate::queues::SystemQueues;
use crate::runtime::Context;

/// Acquire an event and push it to the event queue.
///
/// The event goes back to the pool if the queue is full, without destroying
/// its closure: ownership stays with the caller.
pub(crate) fn post_event<'a, const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
    pools: &mut SystemPools<'a, EP, NP>,
    queues: &mut SystemQueues<'a, EQ, SQ>,
    event: Event<'a>,
) -> UelResult<EventHandle<'a>> {
    let handle = pools.acquire_event(event)?;
    if let Err(err) = queues.push_event(handle) {
        log::warn!("event queue full ({} slots), dropping event", EQ);
        pools.release_event(handle)?;
        return Err(err);
    }
    Ok(handle)
}

pub struct EventLoop<'a> {
    clock: &'a SystemClock,
    current: Option<EventHandle<'a>>,
    dispatched: u32,
    diagnostic: Option<Diagnostic>,
}

impl<'a> EventLoop<'a> {
    pub const fn new(clock: &'a SystemClock) -> Self {
        Self {
            clock,
            current: None,
            dispatched: 0,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Option<Diagnostic>) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    /// Event being dispatched, if a tick is in progress.
    pub fn current(&self) -> Option<EventHandle<'a>> {
        self.current
    }

    /// Closures invoked since construction, wrapping.
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }

    pub fn enqueue_closure<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        closure: Closure<'a>,
    ) -> UelResult<EventHandle<'a>> {
        post_event(pools, queues, Event::new_closure(closure, Value::None))
    }

    /// Run the events enqueued before this call, returning how many closures
    /// were invoked.
    pub fn tick<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize, const W: usize>(
        &mut self,
        ctx: &mut Context<'_, 'a, EP, NP, EQ, SQ, W>,
    ) -> usize {
        let budget = ctx.queues.count_enqueued_events();
        let mut invoked = 0;

        for _ in 0..budget {
            let Some(handle) = ctx.queues.pop_event() else {
                break;
            };
            let Some(event) = ctx.pools.event(handle).copied() else {
                self.report(UelError::StaleHandle);
                continue;
            };

            if event.cancelled {
                log::trace!("skipping cancelled event {:?}", handle);
                self.retire(ctx.pools, handle);
                continue;
            }

            self.current = Some(handle);
            let mut closure = event.closure;
            closure.invoke(ctx, event.params);
            self.current = None;
            self.dispatched = self.dispatched.wrapping_add(1);
            invoked += 1;

            self.finish(ctx.pools, ctx.queues, handle, closure);
        }

        if invoked > 0 {
            log::trace!("tick ran {} of {} events", invoked, budget);
        }
        invoked
    }

    /// Re-admit a live repeating timer, or retire the event.
    fn finish<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        handle: EventHandle<'a>,
        closure: Closure<'a>,
    ) {
        let now = self.clock.now();
        let readmit = match pools.event_mut(handle) {
            Some(event) => {
                event.closure = closure;
                match &mut event.detail {
                    EventDetail::Timer(timer) if timer.repeating && !event.cancelled => {
                        timer.due_ms = deadline(now, timer.period_ms);
                        true
                    }
                    _ => false,
                }
            }
            None => {
                self.report(UelError::StaleHandle);
                return;
            }
        };

        if readmit {
            match queues.schedule_event(pools, handle) {
                Ok(()) => return,
                Err(err) => {
                    log::warn!("repeating timer {:?} dropped", handle);
                    self.report(err);
                }
            }
        }
        self.retire(pools, handle);
    }

    fn retire<const EP: usize, const NP: usize>(&self, pools: &mut SystemPools<'a, EP, NP>, handle: EventHandle<'a>) {
        if let Err(err) = pools.retire_event(handle) {
            self.report(err);
        }
    }

    fn report(&self, err: UelError) {
        log::warn!("event loop: {}", err);
        if let Some(diagnostic) = self.diagnostic {
            diagnostic(err);
        }
    }
}

impl core::fmt::Debug for EventLoop<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventLoop")
            .field("current", &self.current)
            .field("dispatched", &self.dispatched)
            .finish()
    }
}
