//! # actorlite Example Firmware
//!
//! A heartbeat actor on an STM32F4 board:
//!
//! | Actor | Wakes | Behavior |
//! |-------|-------|----------|
//! | `Heartbeat` | every 1 s | Counts beats, snapshots stats every 10 s |
//! | `NullActor` | never | Swallows whatever it is sent |
//!
//! After a minute the heartbeat switches the system into sleeping mode for
//! five minutes, then wakes it again. Between beats the scheduler puts the
//! core into `wfi` sleep.
//!
//! No log backend is installed; the latest stats snapshot sits in `REPORT`
//! for a debugger to read.
//!
//! Heap exhaustion, heap corruption and hard faults reset the board with a
//! reason code that is reported on the next boot.

#![no_std]
#![no_main]

use core::mem::MaybeUninit;
use core::ptr::addr_of_mut;

use cortex_m_rt::{entry, exception, ExceptionFrame};
use embedded_alloc::LlffHeap;
use panic_halt as _;

use actorlite::actors::{NullActor, PeriodicTrigger};
use actorlite::arch::cortex_m4::{system_reset, CortexM4};
use actorlite::config::HEAP_SIZE;
use actorlite::{kernel, Actor, ActorContext, Event, EventBox, EventId, Fault, GuardedAlloc};
use actorlite::sync::IsrCell;
use actorlite::{PowerPolicy, Stats, Time};

// ---------------------------------------------------------------------------
// Heap
// ---------------------------------------------------------------------------

fn on_heap_fault(fault: Fault) -> ! {
    system_reset(fault.reason())
}

#[global_allocator]
static HEAP: GuardedAlloc<LlffHeap> = GuardedAlloc::new(LlffHeap::empty(), on_heap_fault);

static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

const BEAT: Time = Time::seconds(1);
const REPORT_PERIOD: Time = Time::seconds(10);
const AWAKE_BEATS: u32 = 60;
const NAP: Time = Time::minutes(5);

// Read by the debugger.
#[allow(dead_code)]
#[derive(Clone, Copy)]
struct Report {
    beats: u32,
    heap_in_use: usize,
    stats: Stats,
}

static REPORT: IsrCell<Report> = IsrCell::new(Report {
    beats: 0,
    heap_in_use: 0,
    stats: Stats {
        now: Time::ZERO,
        busy_time: Time::ZERO,
        sleep_time: Time::ZERO,
        actors: 0,
    },
});

/// Periodic heartbeat that also drives the power mode.
struct Heartbeat {
    beats: u32,
    report: PeriodicTrigger,
}

impl Actor for Heartbeat {
    fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
        match event.id() {
            EventId::Bootstrap => ctx.send(ctx.me(), Event::receive()),
            EventId::Receive => {
                self.beats += 1;
                if self.report.is_triggered(REPORT_PERIOD, ctx) {
                    REPORT.set(Report {
                        beats: self.beats,
                        heap_in_use: HEAP.in_use(),
                        stats: ctx.scheduler().stats(),
                    });
                }
                if self.beats == AWAKE_BEATS {
                    ctx.send(ctx.me(), Event::sleep());
                }
                ctx.resend_after(ctx.me(), event, BEAT);
            }
            EventId::Sleep => {
                ctx.scheduler().sleep();
                ctx.send_after(ctx.me(), Event::wake_up(), NAP);
            }
            EventId::WakeUp => {
                self.beats = 0;
                ctx.scheduler().wake_up();
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    unsafe { HEAP.inner().init(addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }

    let mut cp = cortex_m::Peripherals::take().unwrap();
    let board = CortexM4::new(&mut cp.SYST);

    let mut heartbeat = Heartbeat {
        beats: 0,
        report: PeriodicTrigger::new(),
    };
    let mut sink = NullActor;

    let scheduler = kernel::boot(&board, PowerPolicy::new());
    scheduler
        .register(&mut heartbeat)
        .expect("Failed to register heartbeat");
    scheduler.register(&mut sink).expect("Failed to register sink");

    kernel::run(&scheduler)
}

#[exception]
unsafe fn HardFault(_frame: &ExceptionFrame) -> ! {
    system_reset(Fault::HardFault.reason())
}
