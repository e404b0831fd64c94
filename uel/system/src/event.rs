//! Events and signals.
//!
//! Every unit of pending work lives in the event pool as an [`Event`]: a
//! closure waiting in the event queue, a timer waiting in the schedule queue,
//! or a listener record registered on the signal relay.

use core::fmt;

use uel_mem::PoolHandle;

use crate::closure::{Closure, Value};

/// Identifier of a signal on a relay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal(pub u16);

impl Signal {
    /// Slot of this signal in a relay.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for Signal {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG({:#06x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signal {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SIG({=u16:#x})", self.0)
    }
}

/// Kind tag of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    Closure,
    Timer,
    Signal,
}

/// Timing of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerDetail {
    /// Absolute due time in milliseconds, compared wrap-aware.
    pub due_ms: u32,
    pub period_ms: u32,
    pub repeating: bool,
    /// Whether a first run was enqueued at admission.
    pub immediate: bool,
}

impl TimerDetail {
    pub const fn once(due_ms: u32) -> Self {
        Self {
            due_ms,
            period_ms: 0,
            repeating: false,
            immediate: false,
        }
    }

    pub const fn every(due_ms: u32, period_ms: u32, immediate: bool) -> Self {
        Self {
            due_ms,
            period_ms,
            repeating: true,
            immediate,
        }
    }
}

/// Registration of a listener on a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListenerDetail {
    pub signal: Signal,
    /// Drop the listener after its first invocation.
    pub once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventDetail {
    Closure,
    Timer(TimerDetail),
    Listener(ListenerDetail),
}

/// Pool-managed unit of work.
///
/// For listener records `cancelled` means the listener was removed; the record
/// itself is pruned lazily on the next walk of its signal.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    pub closure: Closure<'a>,
    pub params: Value<'a>,
    pub detail: EventDetail,
    pub cancelled: bool,
    /// Separate first run of an immediate periodic timer, cancelled along
    /// with the timer.
    pub first_run: Option<EventHandle<'a>>,
}

impl<'a> Event<'a> {
    pub fn new_closure(closure: Closure<'a>, params: Value<'a>) -> Self {
        Self {
            closure,
            params,
            detail: EventDetail::Closure,
            cancelled: false,
            first_run: None,
        }
    }

    pub fn new_timer(closure: Closure<'a>, timer: TimerDetail) -> Self {
        Self {
            closure,
            params: Value::None,
            detail: EventDetail::Timer(timer),
            cancelled: false,
            first_run: None,
        }
    }

    pub fn new_listener(closure: Closure<'a>, signal: Signal, once: bool) -> Self {
        Self {
            closure,
            params: Value::None,
            detail: EventDetail::Listener(ListenerDetail { signal, once }),
            cancelled: false,
            first_run: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.detail {
            EventDetail::Closure => EventKind::Closure,
            EventDetail::Timer(_) => EventKind::Timer,
            EventDetail::Listener(_) => EventKind::Signal,
        }
    }

    pub fn timer(&self) -> Option<&TimerDetail> {
        match &self.detail {
            EventDetail::Timer(timer) => Some(timer),
            _ => None,
        }
    }

    pub fn listener(&self) -> Option<&ListenerDetail> {
        match &self.detail {
            EventDetail::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    /// Due time, for timers.
    pub fn due_ms(&self) -> Option<u32> {
        self.timer().map(|timer| timer.due_ms)
    }

    pub fn is_repeating(&self) -> bool {
        self.timer().is_some_and(|timer| timer.repeating)
    }
}

/// Handle to a pooled event.
pub type EventHandle<'a> = PoolHandle<Event<'a>>;

/// Handle returned when a timer is admitted; cancel it with
/// [`Runtime::cancel`](crate::Runtime::cancel).
pub type TimerHandle<'a> = EventHandle<'a>;

/// Handle to a listener registered on a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle<'a>(pub(crate) EventHandle<'a>);

impl<'a> ListenerHandle<'a> {
    pub fn event(self) -> EventHandle<'a> {
        self.0
    }
}
