//! System pools.
//!
//! The event pool backs every [`Event`]; the node pool backs the schedule
//! queue and the listener lists of the relay.

use uel_core::config::{EVENT_POOL_SIZE, LLIST_NODE_POOL_SIZE};
use uel_core::UelResult;
use uel_mem::{ListNode, ObjectPool, PoolStats};

use crate::event::{Event, EventHandle};

pub type EventPool<'a, const N: usize> = ObjectPool<Event<'a>, N>;
pub type NodePool<'a, const N: usize> = ObjectPool<ListNode<EventHandle<'a>>, N>;

pub struct SystemPools<'a, const EP: usize = EVENT_POOL_SIZE, const NP: usize = LLIST_NODE_POOL_SIZE> {
    pub(crate) events: EventPool<'a, EP>,
    pub(crate) nodes: NodePool<'a, NP>,
}

impl<'a, const EP: usize, const NP: usize> SystemPools<'a, EP, NP> {
    pub fn new() -> Self {
        Self {
            events: ObjectPool::new(),
            nodes: ObjectPool::new(),
        }
    }

    pub fn acquire_event(&mut self, event: Event<'a>) -> UelResult<EventHandle<'a>> {
        self.events.acquire(event).inspect_err(|err| {
            log::warn!("event pool: {} ({} slots)", err, EP);
        })
    }

    /// Return an event to the pool without running its destructor.
    pub fn release_event(&mut self, handle: EventHandle<'a>) -> UelResult<Event<'a>> {
        self.events.release(handle)
    }

    /// Release an event and destroy its closure.
    pub fn retire_event(&mut self, handle: EventHandle<'a>) -> UelResult<()> {
        let event = self.events.release(handle)?;
        event.closure.destroy();
        Ok(())
    }

    pub fn event(&self, handle: EventHandle<'a>) -> Option<&Event<'a>> {
        self.events.get(handle)
    }

    pub fn event_mut(&mut self, handle: EventHandle<'a>) -> Option<&mut Event<'a>> {
        self.events.get_mut(handle)
    }

    pub fn events(&self) -> &EventPool<'a, EP> {
        &self.events
    }

    pub fn nodes(&self) -> &NodePool<'a, NP> {
        &self.nodes
    }

    pub fn event_stats(&self) -> PoolStats {
        self.events.stats()
    }

    pub fn node_stats(&self) -> PoolStats {
        self.nodes.stats()
    }

    /// Whether every pooled object is back in its pool.
    pub fn is_quiescent(&self) -> bool {
        self.events.available() == EP && self.nodes.available() == NP
    }
}

impl<const EP: usize, const NP: usize> Default for SystemPools<'_, EP, NP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const EP: usize, const NP: usize> core::fmt::Debug for SystemPools<'_, EP, NP> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemPools")
            .field("events", &self.events.stats())
            .field("nodes", &self.nodes.stats())
            .finish()
    }
}
