// Host run loop driving the tasklet scheduler
//
// Boot: install logger -> place long-lived state -> post initial work
// Main loop: wait for pending signal -> drain -> dispatch by TaskId -> repeat
//
// Stands in for a radio stack: a receive tasklet that reschedules itself
// while frames remain, a transmit-done tasklet, and an event multiplexer
// that coalesces notifications from both into one queue slot.

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{LevelFilter, Log, Metadata, Record, info, warn};
use static_cell::StaticCell;

use tasklet_sched::{CallbackTasklet, Defer, FixedPool, Scheduler, TaskId};

const RX_FRAME: TaskId = TaskId::new(0);
const TX_DONE: TaskId = TaskId::new(1);
const EVENTS: TaskId = TaskId::new(2);

const EVENT_POOL: usize = 4;

type EventTasklet = CallbackTasklet<u32, FixedPool<u32, EVENT_POOL>>;

static PENDING: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static EVENT_MUX: StaticCell<EventTasklet> = StaticCell::new();

struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

struct Radio {
    frames_left: u32,
    sent: u32,
}

impl Radio {
    fn receive(&mut self, sched: &mut Scheduler, events: &mut EventTasklet) {
        if self.frames_left == 0 {
            return;
        }
        self.frames_left -= 1;
        info!("rx frame, {} left", self.frames_left);

        events.post_callback(sched, on_frame, self.frames_left);
        sched.post(TX_DONE);
        if self.frames_left > 0 {
            // one frame per drain keeps other tasklets moving
            sched.post(RX_FRAME);
        }
    }

    fn tx_done(&mut self, sched: &mut Scheduler, events: &mut EventTasklet) {
        self.sent += 1;
        events.post_callback(sched, on_ack, self.sent);
    }
}

fn on_frame(defer: &mut dyn Defer<u32>, remaining: u32) {
    info!("event: frame handled ({} remaining)", remaining);
    if remaining == 0 {
        defer.post_callback(on_idle, 0);
    }
}

fn on_ack(_: &mut dyn Defer<u32>, seq: u32) {
    info!("event: ack #{}", seq);
}

fn on_idle(_: &mut dyn Defer<u32>, _: u32) {
    info!("event: radio idle");
}

fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }

    let mut sched: Scheduler = Scheduler::new(&PENDING);
    let events = EVENT_MUX.init(CallbackTasklet::new(EVENTS, FixedPool::new()));
    let mut radio = Radio {
        frames_left: 3,
        sent: 0,
    };

    sched.post(RX_FRAME);

    let mut cycles = 0u32;
    while sched.are_tasklets_pending() {
        block_on(PENDING.wait());
        cycles += 1;

        sched.drain(|sched, task| match task {
            RX_FRAME => radio.receive(sched, events),
            TX_DONE => radio.tx_done(sched, events),
            EVENTS => {
                events.run(sched);
            }
            other => warn!("no handler for {}", other),
        });
    }

    info!(
        "idle after {} cycles, {} frames acked, {} event records free",
        cycles,
        radio.sent,
        events.pool().available()
    );
}
