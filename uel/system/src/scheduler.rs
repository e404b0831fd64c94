//! Timer management.
//!
//! Timers wait in the schedule queue until the system clock passes their due
//! time, then [`Scheduler::manage_timers`] moves them to the event queue.
//! All comparisons are wrap-aware, so the 32-bit millisecond counter may roll
//! over freely as long as no delay exceeds half its range.

use uel_core::{deadline, is_due, SystemClock, UelError, UelResult};

use crate::closure::{Closure, Value};
use crate::event::{Event, EventHandle, TimerDetail, TimerHandle};
use crate::event_loop::post_event;
use crate::pools::SystemPools;
use crate::queues::SystemQueues;

pub struct Scheduler<'a> {
    clock: &'a SystemClock,
}

impl<'a> Scheduler<'a> {
    pub const fn new(clock: &'a SystemClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &'a SystemClock {
        self.clock
    }

    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    /// Store the current time and request a scheduler run.
    pub fn update_timer(&self, now_ms: u32) {
        self.clock.update_timer(now_ms);
    }

    pub fn run_later<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        delay_ms: u32,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>> {
        let timer = TimerDetail::once(deadline(self.now(), delay_ms));
        let handle = pools.acquire_event(Event::new_timer(closure, timer))?;
        self.admit(pools, queues, handle)?;
        log::debug!("timer {:?} due at {}ms", handle, timer.due_ms);
        Ok(handle)
    }

    /// Admit a repeating timer.
    ///
    /// With `immediate`, a separate one-shot copy of the closure is pushed to
    /// the event queue as well. It does not own the destructor, which stays
    /// with the repeating timer, and cancelling the timer before it runs
    /// cancels it too.
    pub fn run_at_intervals<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        period_ms: u32,
        immediate: bool,
        closure: Closure<'a>,
    ) -> UelResult<TimerHandle<'a>> {
        queues.check_schedule(pools)?;

        let timer = TimerDetail::every(deadline(self.now(), period_ms), period_ms, immediate);
        let handle = pools.acquire_event(Event::new_timer(closure, timer))?;

        if immediate {
            let first_run = Event::new_closure(closure.without_destructor(), Value::None);
            match post_event(pools, queues, first_run) {
                Ok(first_run) => {
                    if let Some(timer) = pools.event_mut(handle) {
                        timer.first_run = Some(first_run);
                    }
                }
                Err(err) => {
                    pools.release_event(handle)?;
                    return Err(err);
                }
            }
        }

        self.admit(pools, queues, handle)?;
        log::debug!("timer {:?} every {}ms, first due at {}ms", handle, period_ms, timer.due_ms);
        Ok(handle)
    }

    /// Move every due timer to the event queue, returning how many moved.
    ///
    /// When the event queue fills up, the remaining due timers stay scheduled
    /// and another scheduler run is requested.
    pub fn manage_timers<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
    ) -> UelResult<usize> {
        let now = self.now();
        let mut promoted = 0;

        while let Some(due) = queues.next_due(pools) {
            if !is_due(due, now) {
                break;
            }
            if queues.is_event_queue_full() {
                self.clock.request_scheduler_run();
                return Err(UelError::QueueFull);
            }
            let Some(handle) = queues.pop_due(pools, now) else {
                break;
            };
            queues.push_event(handle)?;
            promoted += 1;
        }

        if promoted > 0 {
            log::trace!("{} timers due at {}ms", promoted, now);
        }
        Ok(promoted)
    }

    /// Cancel a timer or enqueued closure.
    ///
    /// The event is only marked: it is released when it next reaches the
    /// event loop, without running. A pending first run of an immediate
    /// periodic timer is marked as well.
    pub fn cancel<const EP: usize, const NP: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        event: EventHandle<'a>,
    ) -> UelResult<()> {
        let event = pools.event_mut(event).ok_or(UelError::StaleHandle)?;
        if event.listener().is_some() {
            return Err(UelError::StaleHandle);
        }
        event.cancelled = true;

        // Stale once the first run was dispatched.
        if let Some(first_run) = event.first_run.take() {
            if let Some(first_run) = pools.event_mut(first_run) {
                first_run.cancelled = true;
            }
        }
        Ok(())
    }

    fn admit<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        handle: EventHandle<'a>,
    ) -> UelResult<()> {
        if let Err(err) = queues.schedule_event(pools, handle) {
            log::warn!("schedule queue: {}", err);
            pools.release_event(handle)?;
            return Err(err);
        }
        Ok(())
    }
}

impl core::fmt::Debug for Scheduler<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler").field("now", &self.now()).finish()
    }
}
