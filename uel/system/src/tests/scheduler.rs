use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::vec::Vec;

use crate::{handler, AppConfig, Application, Closure, EventHandle, SystemClock, UelError, Value};

#[test]
fn equal_due_times_fire_in_admission_order() {
    let clock = SystemClock::new();
    let trace = RefCell::new(Vec::new());
    let (x, y) = (record!(&trace, "x"), record!(&trace, "y"));
    let mut app: Application = Application::new(&clock);

    app.run_later(100, Closure::new(&x)).unwrap();
    app.run_later(100, Closure::new(&y)).unwrap();
    app.update_timer(100);
    assert_eq!(app.tick(), 2);
    assert_eq!(*trace.borrow(), ["x", "y"]);
}

#[test]
fn one_shots_fire_by_due_time() {
    let clock = SystemClock::new();
    let trace = RefCell::new(Vec::new());
    let (slow, fast, mid) = (record!(&trace, "slow"), record!(&trace, "fast"), record!(&trace, "mid"));
    let mut app: Application = Application::new(&clock);

    app.run_later(30, Closure::new(&slow)).unwrap();
    app.update_timer(5);
    app.tick();
    // Admitted later but due earlier than `slow` (30).
    app.run_later(10, Closure::new(&fast)).unwrap();
    app.run_later(20, Closure::new(&mid)).unwrap();

    for now in 6..=30 {
        app.update_timer(now);
        app.tick();
    }
    assert_eq!(*trace.borrow(), ["fast", "mid", "slow"]);
}

#[test]
fn timers_wait_for_their_due_time() {
    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let mut app: Application = Application::new(&clock);

    app.run_later(10, Closure::new(&count)).unwrap();
    app.update_timer(9);
    app.tick();
    assert_eq!(hits.get(), 0);

    // Late clock updates still fire the timer.
    app.update_timer(25);
    app.tick();
    assert_eq!(hits.get(), 1);
}

fn periodic_runs(immediate: bool) -> u32 {
    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let mut app: Application = Application::new(&clock);

    app.run_at_intervals(10, immediate, Closure::new(&count)).unwrap();
    app.tick();
    for now in 1..=50 {
        app.update_timer(now);
        app.tick();
    }
    hits.get()
}

#[test]
fn periodic_timer_fires_once_per_period() {
    assert_eq!(periodic_runs(false), 5);
    assert_eq!(periodic_runs(true), 6);
}

#[test]
fn immediate_run_is_a_separate_event() {
    let clock = SystemClock::new();
    let destroyed = Cell::new(0);
    let noop = handler(|_, _| Value::None);
    let destructor = on_destroy!(&destroyed);
    let mut app: Application = Application::new(&clock);

    let timer = app
        .run_at_intervals(10, true, Closure::new(&noop).with_destructor(&destructor))
        .unwrap();
    assert_eq!(app.queues().count_enqueued_events(), 1);
    assert_eq!(app.queues().count_scheduled_events(), 1);
    assert_eq!(app.pools().event_stats().used_slots, 2);

    app.tick();
    assert_eq!(destroyed.get(), 0);
    assert!(app.pools().event(timer).is_some_and(|event| event.is_repeating()));
}

#[test]
fn cancelling_an_immediate_timer_skips_its_first_run() {
    let clock = SystemClock::new();
    let (hits, destroyed) = (Cell::new(0), Cell::new(0));
    let count = bump!(&hits);
    let destructor = on_destroy!(&destroyed);
    let mut app: Application = Application::new(&clock);

    let timer = app
        .run_at_intervals(100, true, Closure::new(&count).with_destructor(&destructor))
        .unwrap();
    app.cancel(timer).unwrap();

    assert_eq!(app.tick(), 0);
    assert_eq!(hits.get(), 0);
    assert_eq!(app.queues().count_enqueued_events(), 0);

    app.update_timer(100);
    assert_eq!(app.tick(), 0);
    assert_eq!((hits.get(), destroyed.get()), (0, 1));
    assert!(app.pools().is_quiescent());
}

#[test]
fn cancel_after_the_first_run_leaves_other_events_alone() {
    let clock = SystemClock::new();
    let (ticks, others) = (Cell::new(0), Cell::new(0));
    let periodic = bump!(&ticks);
    let other = bump!(&others);
    let mut app: Application<'_, 2> = Application::new(&clock);

    let timer = app.run_at_intervals(100, true, Closure::new(&periodic)).unwrap();
    assert_eq!(app.tick(), 1);
    // Reuses the slot of the first run.
    let reused = app.enqueue_closure(Closure::new(&other)).unwrap();
    assert!(app.pools().events().is_empty());
    assert_ne!(Some(reused), app.pools().event(timer).and_then(|event| event.first_run));
    app.cancel(timer).unwrap();

    assert_eq!(app.tick(), 1);
    assert_eq!((ticks.get(), others.get()), (1, 1));
}

#[test]
fn rejected_interval_commits_nothing() {
    let clock = SystemClock::new();
    let noop = handler(|_, _| Value::None);
    let mut app: Application<'_, 16, 16, 4, 2> = Application::new(&clock);

    app.run_later(10, Closure::new(&noop)).unwrap();
    app.run_later(20, Closure::new(&noop)).unwrap();
    assert_eq!(
        app.run_at_intervals(5, true, Closure::new(&noop)),
        Err(UelError::QueueFull)
    );
    assert_eq!(app.queues().count_enqueued_events(), 0);
    assert_eq!(app.pools().event_stats().used_slots, 2);
}

#[test]
fn timer_survives_wraparound() {
    let clock = SystemClock::new();
    let trace = RefCell::new(Vec::new());
    let (early, wrapped) = (record!(&trace, "early"), record!(&trace, "wrapped"));
    let mut app: Application = Application::new(&clock);

    app.update_timer(u32::MAX - 5);
    app.tick();
    app.run_later(10, Closure::new(&wrapped)).unwrap();
    app.run_later(3, Closure::new(&early)).unwrap();
    assert_eq!(app.queues().next_due(app.pools()), Some(u32::MAX - 2));

    app.update_timer(u32::MAX);
    app.tick();
    assert_eq!(*trace.borrow(), ["early"]);

    app.update_timer(3);
    app.tick();
    assert_eq!(*trace.borrow(), ["early"]);

    app.update_timer(4);
    app.tick();
    assert_eq!(*trace.borrow(), ["early", "wrapped"]);
}

#[test]
fn periodic_timer_cancels_itself() {
    let clock = SystemClock::new();
    let (hits, destroyed) = (Cell::new(0), Cell::new(0));
    let handle: Cell<Option<EventHandle<'_>>> = Cell::new(None);
    let twice = handler(|rt, _| {
        hits.set(hits.get() + 1);
        if hits.get() == 2 {
            if let Some(timer) = handle.get() {
                rt.cancel(timer).unwrap();
            }
        }
        Value::None
    });
    let destructor = on_destroy!(&destroyed);
    let mut app: Application = Application::new(&clock);

    let timer = app
        .run_at_intervals(10, false, Closure::new(&twice).with_destructor(&destructor))
        .unwrap();
    handle.set(Some(timer));

    for now in (10..=50).step_by(10) {
        app.update_timer(now);
        app.tick();
    }
    assert_eq!(hits.get(), 2);
    assert_eq!(destroyed.get(), 1);
    assert_eq!(app.queues().count_scheduled_events(), 0);
    assert!(app.pools().is_quiescent());
    assert_eq!(app.cancel(timer), Err(UelError::StaleHandle));
}

#[test]
fn cancelled_timer_is_dropped_when_due() {
    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let mut app: Application = Application::new(&clock);

    let timer = app.run_later(10, Closure::new(&count)).unwrap();
    app.cancel(timer).unwrap();
    // Stays scheduled until it reaches the loop.
    assert_eq!(app.queues().count_scheduled_events(), 1);

    app.update_timer(10);
    assert_eq!(app.tick(), 0);
    assert_eq!(hits.get(), 0);
    assert!(app.pools().is_quiescent());
}

static PROMOTION_FAULTS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn full_event_queue_defers_promotion() {
    fn diagnostic(err: UelError) {
        assert_eq!(err, UelError::QueueFull);
        PROMOTION_FAULTS.fetch_add(1, Ordering::SeqCst);
    }

    let clock = SystemClock::new();
    let hits = Cell::new(0);
    let count = bump!(&hits);
    let config = AppConfig::builder().diagnostic(diagnostic).build();
    let mut app: Application<'_, 16, 16, 2, 8> = Application::with_config(&clock, config);

    for _ in 0..3 {
        app.run_later(0, Closure::new(&count)).unwrap();
    }
    assert_eq!(app.tick(), 2);
    assert_eq!(PROMOTION_FAULTS.load(Ordering::SeqCst), 1);
    assert_eq!(app.queues().count_scheduled_events(), 1);
    assert!(app.run_scheduler());

    assert_eq!(app.tick(), 1);
    assert_eq!(hits.get(), 3);
    assert!(!app.run_scheduler());
}

static READMISSION_FAULTS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn failed_readmission_is_reported() {
    fn diagnostic(_: UelError) {
        READMISSION_FAULTS.fetch_add(1, Ordering::SeqCst);
    }

    let clock = SystemClock::new();
    let (hits, destroyed) = (Cell::new(0), Cell::new(0));
    let noop = handler(|_, _| Value::None);
    let count = bump!(&hits);
    let destructor = on_destroy!(&destroyed);
    // Once promoted, the periodic timer frees its schedule slot; take it
    // before the timer runs and tries to come back.
    let steal = handler(|rt, _| {
        rt.run_later(100, Closure::new(&noop)).unwrap();
        Value::None
    });
    let config = AppConfig::builder().diagnostic(diagnostic).build();
    let mut app: Application<'_, 16, 16, 4, 1> = Application::with_config(&clock, config);

    app.run_at_intervals(10, false, Closure::new(&count).with_destructor(&destructor))
        .unwrap();
    app.update_timer(10);
    app.enqueue_closure(Closure::new(&steal)).unwrap();
    app.tick();

    assert_eq!(hits.get(), 1);
    assert_eq!(destroyed.get(), 1);
    assert_eq!(READMISSION_FAULTS.load(Ordering::SeqCst), 1);
    assert_eq!(app.queues().count_scheduled_events(), 1);
}
