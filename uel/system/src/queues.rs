//! System queues.
//!
//! The event queue is a FIFO of events ready to run. The schedule queue keeps
//! timers sorted by due time, wrap-aware, with equal due times in admission
//! order.

use uel_core::config::{EVENT_QUEUE_SIZE, SCHEDULE_QUEUE_SIZE};
use uel_core::{is_due, precedes, UelError, UelResult};
use uel_mem::{CircularQueue, LinkedList};

use crate::event::{Event, EventHandle};
use crate::pools::SystemPools;

pub struct SystemQueues<'a, const EQ: usize = EVENT_QUEUE_SIZE, const SQ: usize = SCHEDULE_QUEUE_SIZE> {
    pub(crate) event_queue: CircularQueue<EventHandle<'a>, EQ>,
    pub(crate) schedule_queue: LinkedList<EventHandle<'a>>,
}

impl<'a, const EQ: usize, const SQ: usize> SystemQueues<'a, EQ, SQ> {
    pub const fn new() -> Self {
        Self {
            event_queue: CircularQueue::new(),
            schedule_queue: LinkedList::new(),
        }
    }

    pub fn push_event(&mut self, handle: EventHandle<'a>) -> UelResult<()> {
        self.event_queue.push(handle)
    }

    pub fn pop_event(&mut self) -> Option<EventHandle<'a>> {
        self.event_queue.pop()
    }

    pub fn count_enqueued_events(&self) -> usize {
        self.event_queue.len()
    }

    pub fn count_scheduled_events(&self) -> usize {
        self.schedule_queue.len()
    }

    pub fn is_event_queue_full(&self) -> bool {
        self.event_queue.is_full()
    }

    /// Handles waiting in the event queue, oldest first.
    pub fn enqueued(&self) -> impl Iterator<Item = EventHandle<'a>> + '_ {
        self.event_queue.iter().copied()
    }

    /// Handles waiting in the schedule queue, earliest first.
    pub fn scheduled<'p, const EP: usize, const NP: usize>(
        &self,
        pools: &'p SystemPools<'a, EP, NP>,
    ) -> impl Iterator<Item = EventHandle<'a>> + 'p
    where
        'a: 'p,
    {
        self.schedule_queue.iter(&pools.nodes).copied()
    }

    /// Check that one more timer fits, without committing anything.
    pub fn check_schedule<const EP: usize, const NP: usize>(
        &self,
        pools: &SystemPools<'a, EP, NP>,
    ) -> UelResult<()> {
        if self.schedule_queue.len() >= SQ {
            Err(UelError::QueueFull)
        } else if pools.nodes.is_empty() {
            Err(UelError::PoolDepleted)
        } else {
            Ok(())
        }
    }

    /// Insert a timer event by due time, after any timer due at the same time.
    pub fn schedule_event<const EP: usize, const NP: usize>(
        &mut self,
        pools: &mut SystemPools<'a, EP, NP>,
        handle: EventHandle<'a>,
    ) -> UelResult<()> {
        self.check_schedule(pools)?;
        let due = pools
            .events
            .get(handle)
            .and_then(Event::due_ms)
            .ok_or(UelError::StaleHandle)?;

        let events = &pools.events;
        self.schedule_queue
            .insert_sorted(&mut pools.nodes, handle, |_, existing| {
                events
                    .get(*existing)
                    .and_then(Event::due_ms)
                    .is_some_and(|existing_due| precedes(due, existing_due))
            })
            .map(|_| ())
    }

    /// Due time of the earliest scheduled timer.
    pub fn next_due<const EP: usize, const NP: usize>(&self, pools: &SystemPools<'a, EP, NP>) -> Option<u32> {
        self.schedule_queue
            .peek_head(&pools.nodes)
            .and_then(|handle| pools.events.get(*handle))
            .and_then(Event::due_ms)
    }

    /// Pop the earliest timer if it is due at `now_ms`.
    pub fn pop_due<const EP: usize, const NP: usize>(
        &mut self,
        pools: &mut SystemPools<'a, EP, NP>,
        now_ms: u32,
    ) -> Option<EventHandle<'a>> {
        let due = self.next_due(pools)?;
        if !is_due(due, now_ms) {
            return None;
        }
        self.schedule_queue.pop_head(&mut pools.nodes)
    }
}

impl<const EQ: usize, const SQ: usize> Default for SystemQueues<'_, EQ, SQ> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const EQ: usize, const SQ: usize> core::fmt::Debug for SystemQueues<'_, EQ, SQ> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemQueues")
            .field("enqueued", &self.event_queue.len())
            .field("scheduled", &self.schedule_queue.len())
            .finish()
    }
}
