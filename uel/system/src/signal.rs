//! Signal relay.
//!
//! A relay keeps one list of listener records per signal id. Emitting a
//! signal does not run listeners directly: each live listener is enqueued as
//! a closure event carrying the emission params, so listeners run in
//! registration order on the next tick.

use uel_core::config::SIGNAL_MAX_LISTENERS;
use uel_core::{UelError, UelResult};
use uel_mem::{LinkedList, ListNode};

use crate::closure::{Closure, Value};
use crate::event::{Event, EventHandle, ListenerHandle, Signal};
use crate::event_loop::post_event;
use crate::pools::SystemPools;
use crate::queues::SystemQueues;

pub struct SignalRelay<'a, const W: usize> {
    listeners: [LinkedList<EventHandle<'a>>; W],
    max_listeners: usize,
}

impl<'a, const W: usize> SignalRelay<'a, W> {
    pub fn new(max_listeners: usize) -> Self {
        Self {
            listeners: core::array::from_fn(|_| LinkedList::new()),
            max_listeners,
        }
    }

    /// Number of signals served.
    pub const fn width(&self) -> usize {
        W
    }

    pub fn max_listeners(&self) -> usize {
        self.max_listeners
    }

    /// Listener records attached to `signal`, including unlistened records
    /// not yet pruned.
    pub fn listener_count(&self, signal: Signal) -> usize {
        self.listeners.get(signal.index()).map_or(0, LinkedList::len)
    }

    pub fn listen<const EP: usize, const NP: usize>(
        &mut self,
        pools: &mut SystemPools<'a, EP, NP>,
        signal: Signal,
        closure: Closure<'a>,
        once: bool,
    ) -> UelResult<ListenerHandle<'a>> {
        let list = self
            .listeners
            .get_mut(signal.index())
            .ok_or(UelError::InvalidSignalId)?;

        prune(list, pools)?;
        if list.len() >= self.max_listeners {
            log::warn!("{}: {} listeners already attached", signal, list.len());
            return Err(UelError::RelayListenersExhausted);
        }

        let handle = pools.acquire_event(Event::new_listener(closure, signal, once))?;
        if let Err(err) = list.push_tail(&mut pools.nodes, handle) {
            pools.release_event(handle)?;
            return Err(err);
        }

        log::debug!("{}: listener {:?} attached (once: {})", signal, handle, once);
        Ok(ListenerHandle(handle))
    }

    /// Detach a listener. Its record is pruned on the next walk of its
    /// signal, and any invocation already enqueued still runs.
    pub fn unlisten<const EP: usize, const NP: usize>(
        &mut self,
        pools: &mut SystemPools<'a, EP, NP>,
        listener: ListenerHandle<'a>,
    ) -> UelResult<()> {
        let event = pools.event_mut(listener.0).ok_or(UelError::StaleHandle)?;
        if event.cancelled {
            return Err(UelError::StaleHandle);
        }
        event.cancelled = true;
        Ok(())
    }

    /// Enqueue an invocation of every live listener of `signal`.
    ///
    /// Stops at the first listener that cannot be enqueued and returns the
    /// error. Listeners enqueued before it still run, and listeners after it
    /// stay attached.
    pub fn emit<const EP: usize, const NP: usize, const EQ: usize, const SQ: usize>(
        &mut self,
        pools: &mut SystemPools<'a, EP, NP>,
        queues: &mut SystemQueues<'a, EQ, SQ>,
        signal: Signal,
        params: Value<'a>,
    ) -> UelResult<usize> {
        let list = self
            .listeners
            .get_mut(signal.index())
            .ok_or(UelError::InvalidSignalId)?;

        let mut enqueued = 0;
        let mut cursor = list.head();
        while let Some(node) = cursor {
            cursor = list.next_of(&pools.nodes, node);
            let Some(&handle) = pools.nodes.get(node).map(ListNode::value) else {
                break;
            };
            let Some(listener) = pools.event(handle).copied() else {
                list.remove(&mut pools.nodes, node)?;
                continue;
            };

            if listener.cancelled {
                list.remove(&mut pools.nodes, node)?;
                pools.retire_event(handle)?;
                continue;
            }

            let once = listener.listener().is_some_and(|detail| detail.once);
            // A once listener hands its closure, destructor included, over
            // to the invocation.
            let closure = if once {
                listener.closure
            } else {
                listener.closure.without_destructor()
            };
            post_event(pools, queues, Event::new_closure(closure, params)).inspect_err(|err| {
                log::warn!("{}: emission stopped after {} listeners: {}", signal, enqueued, err);
            })?;
            enqueued += 1;

            if once {
                list.remove(&mut pools.nodes, node)?;
                pools.release_event(handle)?;
            }
        }

        log::trace!("{}: {} listeners enqueued", signal, enqueued);
        Ok(enqueued)
    }
}

impl<const W: usize> Default for SignalRelay<'_, W> {
    fn default() -> Self {
        Self::new(SIGNAL_MAX_LISTENERS)
    }
}

impl<const W: usize> core::fmt::Debug for SignalRelay<'_, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalRelay")
            .field("width", &W)
            .field("max_listeners", &self.max_listeners)
            .finish()
    }
}

/// Drop unlistened records from a listener list, destroying their closures.
fn prune<'a, const EP: usize, const NP: usize>(
    list: &mut LinkedList<EventHandle<'a>>,
    pools: &mut SystemPools<'a, EP, NP>,
) -> UelResult<()> {
    let mut cursor = list.head();
    while let Some(node) = cursor {
        cursor = list.next_of(&pools.nodes, node);
        let Some(&handle) = pools.nodes.get(node).map(ListNode::value) else {
            break;
        };
        match pools.event(handle) {
            Some(event) if !event.cancelled => {}
            Some(_) => {
                list.remove(&mut pools.nodes, node)?;
                pools.retire_event(handle)?;
            }
            None => {
                list.remove(&mut pools.nodes, node)?;
            }
        }
    }
    Ok(())
}
