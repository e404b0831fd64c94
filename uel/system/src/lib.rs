#![no_std]
#![forbid(unsafe_code)]

//! # uel-system
//!
//! The runtime of the event loop: closures and events, the system pools and
//! queues, and the three services that operate on them.
//!
//! ## Module Overview
//! - [`closure`]     – Invocable closure values and their parameter word.
//! - [`event`]       – Pool-managed events: closures, timers, listeners.
//! - [`pools`]       – Event and list-node pools shared by every service.
//! - [`queues`]      – FIFO event queue and due-time ordered schedule queue.
//! - [`event_loop`]  – Bounded drain of the event queue.
//! - [`scheduler`]   – Timer admission and promotion of due timers.
//! - [`signal`]      – Signal relay: listen, unlisten, emit.
//! - [`runtime`]     – The handle closures receive to post more work.
//! - [`application`] – Top-level container wiring everything together.
//!
//! Nothing in this crate allocates: every object comes out of a pool sized by
//! the const generics of [`Application`], defaulting to [`uel_core::config`].

pub mod application;
pub mod closure;
pub mod event;
pub mod event_loop;
pub mod pools;
pub mod queues;
pub mod runtime;
pub mod scheduler;
pub mod signal;

pub use application::{AppConfig, AppConfigBuilder, AppEvent, Application, APP_SIGNAL_COUNT};
pub use closure::{handler, Closure, ClosureFn, Destructor, Value};
pub use event::{
    Event, EventDetail, EventHandle, EventKind, ListenerDetail, ListenerHandle, Signal, TimerDetail, TimerHandle,
};
pub use event_loop::EventLoop;
pub use pools::{EventPool, NodePool, SystemPools};
pub use queues::SystemQueues;
pub use runtime::{Context, Runtime};
pub use scheduler::Scheduler;
pub use signal::SignalRelay;
pub use uel_core::{config, Diagnostic, SystemClock, UelError, UelResult};

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests;
