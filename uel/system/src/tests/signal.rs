use core::cell::{Cell, RefCell};
use std::vec::Vec;

use crate::{handler, AppConfig, Application, Closure, Signal, SystemClock, UelError, Value};

#[test]
fn emit_runs_listeners_in_registration_order() {
    let clock = SystemClock::new();
    let trace = RefCell::new(Vec::new());
    let (first, second) = (record!(&trace, "first"), record!(&trace, "second"));
    let mut app: Application = Application::new(&clock);

    app.listen(Signal(0), Closure::new(&first), false).unwrap();
    app.listen(Signal(0), Closure::new(&second), true).unwrap();
    assert_eq!(app.relay().listener_count(Signal(0)), 2);

    assert_eq!(app.emit(Signal(0), Value::None), Ok(2));
    assert_eq!(app.relay().listener_count(Signal(0)), 1);
    app.tick();
    assert_eq!(*trace.borrow(), ["first", "second"]);

    assert_eq!(app.emit(Signal(0), Value::None), Ok(1));
    app.tick();
    assert_eq!(*trace.borrow(), ["first", "second", "first"]);
}

#[test]
fn listeners_receive_emission_params() {
    let clock = SystemClock::new();
    let total = Cell::new(0);
    let add = handler(|_, params| {
        total.set(total.get() + params.as_uint().unwrap_or(0));
        Value::None
    });
    let mut app: Application = Application::new(&clock);

    app.listen(Signal(1), Closure::new(&add), false).unwrap();
    app.emit(Signal(1), Value::Uint(7)).unwrap();
    app.emit(Signal(1), Value::Uint(5)).unwrap();
    app.tick();
    assert_eq!(total.get(), 12);
}

#[test]
fn unlistened_records_are_pruned() {
    let clock = SystemClock::new();
    let (hits, destroyed) = (Cell::new(0), Cell::new(0));
    let count = bump!(&hits);
    let destructor = on_destroy!(&destroyed);
    let mut app: Application = Application::new(&clock);

    let listener = app
        .listen(Signal(2), Closure::new(&count).with_destructor(&destructor), false)
        .unwrap();
    app.emit(Signal(2), Value::None).unwrap();
    app.tick();
    assert_eq!((hits.get(), destroyed.get()), (1, 0));

    app.unlisten(listener).unwrap();
    assert_eq!(app.unlisten(listener), Err(UelError::StaleHandle));
    assert_eq!(app.emit(Signal(2), Value::None), Ok(0));
    assert_eq!(app.relay().listener_count(Signal(2)), 0);
    assert_eq!(destroyed.get(), 1);
    assert!(app.pools().is_quiescent());
    assert_eq!(app.unlisten(listener), Err(UelError::StaleHandle));
}

#[test]
fn invocation_enqueued_before_unlisten_still_runs() {
    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let mut app: Application = Application::new(&clock);

    let listener = app.listen(Signal(0), Closure::new(&count), false).unwrap();
    app.emit(Signal(0), Value::None).unwrap();
    app.unlisten(listener).unwrap();
    app.tick();
    assert_eq!(hits.get(), 1);
}

#[test]
fn signal_ids_are_bounded_by_relay_width() {
    let clock = SystemClock::new();
    let noop = handler(|_, _| Value::None);
    let mut app: Application = Application::new(&clock);

    assert_eq!(
        app.listen(Signal(3), Closure::new(&noop), false),
        Err(UelError::InvalidSignalId)
    );
    assert_eq!(app.emit(Signal(3), Value::None), Err(UelError::InvalidSignalId));
    assert_eq!(app.relay().listener_count(Signal(3)), 0);
    assert!(app.pools().is_quiescent());
}

#[test]
fn listener_cap_counts_live_records() {
    let clock = SystemClock::new();
    let noop = handler(|_, _| Value::None);
    let config = AppConfig::builder().max_listeners(2).build();
    let mut app: Application = Application::with_config(&clock, config);

    let first = app.listen(Signal(0), Closure::new(&noop), false).unwrap();
    app.listen(Signal(0), Closure::new(&noop), false).unwrap();
    assert_eq!(
        app.listen(Signal(0), Closure::new(&noop), false),
        Err(UelError::RelayListenersExhausted)
    );
    // Other signals have their own budget.
    app.listen(Signal(1), Closure::new(&noop), false).unwrap();

    app.unlisten(first).unwrap();
    app.listen(Signal(0), Closure::new(&noop), false).unwrap();
    assert_eq!(app.relay().listener_count(Signal(0)), 2);
}

#[test]
fn emit_stops_at_depletion() {
    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let mut app: Application<'_, 4> = Application::new(&clock);

    for _ in 0..3 {
        app.listen(Signal(0), Closure::new(&count), false).unwrap();
    }
    // One free event left for three invocations.
    assert_eq!(app.emit(Signal(0), Value::None), Err(UelError::PoolDepleted));
    assert_eq!(app.queues().count_enqueued_events(), 1);
    assert_eq!(app.relay().listener_count(Signal(0)), 3);

    assert_eq!(app.tick(), 1);
    assert_eq!(hits.get(), 1);
}

#[test]
fn once_listener_hands_its_destructor_to_the_invocation() {
    let clock = SystemClock::new();
    let destroyed = Cell::new(0);
    let noop = handler(|_, _| Value::None);
    let destructor = on_destroy!(&destroyed);
    let mut app: Application = Application::new(&clock);

    app.listen(Signal(0), Closure::new(&noop).with_destructor(&destructor), true)
        .unwrap();
    app.emit(Signal(0), Value::None).unwrap();
    assert_eq!(destroyed.get(), 0);
    assert_eq!(app.relay().listener_count(Signal(0)), 0);

    app.tick();
    assert_eq!(destroyed.get(), 1);
    assert!(app.pools().is_quiescent());
}

#[test]
fn listeners_can_emit() {
    let clock = SystemClock::new();
    let trace = RefCell::new(Vec::new());
    let pong = record!(&trace, "pong");
    let ping = handler(|rt, _| {
        trace.borrow_mut().push("ping");
        rt.emit(Signal(1), Value::None).unwrap();
        Value::None
    });
    let mut app: Application = Application::new(&clock);

    app.listen(Signal(0), Closure::new(&ping), false).unwrap();
    app.listen(Signal(1), Closure::new(&pong), true).unwrap();
    app.emit(Signal(0), Value::None).unwrap();

    app.tick();
    assert_eq!(*trace.borrow(), ["ping"]);
    app.tick();
    assert_eq!(*trace.borrow(), ["ping", "pong"]);
}
