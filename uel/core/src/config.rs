//! Compile-time sizing of the runtime.
//!
//! Capacities are given in log2 form and must describe powers of two. They are
//! the defaults of the const-generic capacities of the system containers, so
//! an application that needs different sizes overrides them on its own type
//! instead of editing this file.
//!
//! Total pooled objects must be strictly greater than the peak number of
//! simultaneously in-flight events (enqueued + scheduled + listeners +
//! listener invocations).

/// Event pool size in log2 form. Defaults to 128 events.
pub const EVENT_POOL_SIZE_LOG2N: usize = 7;

/// Linked list node pool size in log2 form. Defaults to 128 nodes.
pub const LLIST_NODE_POOL_SIZE_LOG2N: usize = 7;

/// Event queue size in log2 form. Defaults to 32 events.
pub const EVENT_QUEUE_SIZE_LOG2N: usize = 5;

/// Schedule queue size in log2 form. Defaults to 16 timers.
pub const SCHEDULE_QUEUE_SIZE_LOG2N: usize = 4;

/// Maximum number of listeners attached to a single signal of a relay.
pub const SIGNAL_MAX_LISTENERS: usize = 5;

pub const EVENT_POOL_SIZE: usize = 1 << EVENT_POOL_SIZE_LOG2N;
pub const LLIST_NODE_POOL_SIZE: usize = 1 << LLIST_NODE_POOL_SIZE_LOG2N;
pub const EVENT_QUEUE_SIZE: usize = 1 << EVENT_QUEUE_SIZE_LOG2N;
pub const SCHEDULE_QUEUE_SIZE: usize = 1 << SCHEDULE_QUEUE_SIZE_LOG2N;

const _: () = assert!(EVENT_QUEUE_SIZE <= EVENT_POOL_SIZE);
const _: () = assert!(SCHEDULE_QUEUE_SIZE <= LLIST_NODE_POOL_SIZE);
