//! Heartbeat on the host
//!
//! A periodic timer pulses every `PERIOD_MS` and emits a beat signal carrying
//! the beat number; a listener logs each beat and stops the demo once the
//! requested number of beats went by. The POSIX ticker stands in for the
//! timer interrupt.
//!
//! ```text
//! RUST_LOG=debug cargo run -p heartbeat -- 8
//! ```

use std::cell::Cell;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use uel_posix::{init_logging, Ticker, TickerConfig};
use uel_system::config::{EVENT_POOL_SIZE, EVENT_QUEUE_SIZE, LLIST_NODE_POOL_SIZE, SCHEDULE_QUEUE_SIZE};
use uel_system::{handler, AppConfig, AppEvent, Application, Closure, Signal, SystemClock, UelError, Value};

const PERIOD_MS: u32 = 250;
const DEFAULT_BEATS: u32 = 5;

/// Application signals plus the beat.
const BEAT: Signal = Signal(AppEvent::COUNT as u16);

type HeartbeatApp<'a> = Application<
    'a,
    EVENT_POOL_SIZE,
    LLIST_NODE_POOL_SIZE,
    EVENT_QUEUE_SIZE,
    SCHEDULE_QUEUE_SIZE,
    { AppEvent::COUNT + 1 },
>;

static CLOCK: SystemClock = SystemClock::new();

#[derive(Parser, Debug)]
#[command(author, version, about = "Periodic heartbeat relayed through signals")]
struct Args {
    /// Number of beats before the demo stops
    #[arg(default_value_t = DEFAULT_BEATS, value_parser = clap::value_parser!(u32).range(1..))]
    beats: u32,
}

fn report(err: UelError) {
    error!("runtime fault: {err}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(LevelFilter::Info);

    let limit = args.beats;

    let pulses = Cell::new(0u32);
    let done = Cell::new(false);

    let on_ready = handler(|rt, _| {
        info!("ready at {} ms, {} beats to go", rt.now(), limit);
        Value::None
    });
    let on_beat = handler(|rt, params| {
        let beat = params.as_uint().unwrap_or_default();
        info!("beat #{beat} at {} ms", rt.now());
        if beat >= limit {
            done.set(true);
        }
        Value::None
    });
    let pulse = handler(|rt, _| {
        pulses.set(pulses.get() + 1);
        if let Err(err) = rt.emit(BEAT, Value::Uint(pulses.get())) {
            warn!("beat #{} lost: {err}", pulses.get());
        }
        Value::Uint(pulses.get())
    });
    let on_pulse_retired = |closure: &Closure<'_>| {
        info!("pulse retired after {:?} beats", closure.result());
    };

    let config = AppConfig::builder().name("heartbeat").diagnostic(report).build();
    let mut app: HeartbeatApp = Application::with_config(&CLOCK, config);

    app.listen(AppEvent::Ready, Closure::new(&on_ready), true)?;
    app.listen(BEAT, Closure::new(&on_beat), false)?;
    let timer = app.run_at_intervals(
        PERIOD_MS,
        true,
        Closure::new(&pulse).with_destructor(&on_pulse_retired),
    )?;
    app.emit(AppEvent::Ready, Value::None)?;

    let ticker = Ticker::start(&CLOCK, TickerConfig::default())?;
    while !done.get() {
        if app.tick() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    // A cancelled timer is retired the next time it comes due.
    app.cancel(timer)?;
    while app.queues().count_scheduled_events() > 0 || app.queues().count_enqueued_events() > 0 {
        if app.tick() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    ticker.stop();

    let stats = app.pools().event_stats();
    info!(
        "{} beats in {} ms, event pool peak {}/{}",
        pulses.get(),
        app.timer(),
        stats.high_watermark(),
        stats.total_slots
    );
    Ok(())
}
