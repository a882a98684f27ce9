//! # actorlite
//!
//! A cooperative actor runtime for small microcontrollers.
//!
//! ## Overview
//!
//! Firmware is written as a set of actors. Each actor owns its state and its
//! hardware, receives work as events in a private mailbox, and runs one
//! event at a time to completion. A single scheduler loop sweeps the
//! mailboxes and, when nothing is due, puts the MCU into low-power sleep
//! until the earliest deadline.
//!
//! - **No preemption**: handlers run to completion on one stack
//! - **No timers**: an actor that wants to run later resends its own event
//!   with a new `not_before` deadline
//! - **No locks**: only the tick counter is shared with an interrupt
//! - **Watchdog-backed**: a wedged handler resets the board, and the reason
//!   is reported after reboot
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Actors                   │
//! │        on_event(event, ctx) · on_send(event)            │
//! ├────────────────────────────────────────────────────────┤
//! │       Kernel API (kernel.rs) · boot() · run()           │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Power Policy     │  Actor Context    │
//! │  scheduler.rs│   power.rs         │  context.rs       │
//! │  ─ register()│   ─ sleep_period() │  ─ send()         │
//! │  ─ run()     │   ─ enter_low_power│  ─ resend_after() │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │  Events (event.rs) · Mailboxes (list.rs) · Time        │
//! ├────────────────────────────────────────────────────────┤
//! │  Platform (arch/) · cortex_m4 · sim                     │
//! ├────────────────────────────────────────────────────────┤
//! │  GuardedAlloc (memory.rs) · Faults (fault.rs)          │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use actorlite::arch::sim::SimPlatform;
//! use actorlite::{Actor, ActorContext, Event, EventBox, EventId, PowerPolicy, Scheduler, Time};
//!
//! struct Blink {
//!     toggles: u32,
//! }
//!
//! impl Actor for Blink {
//!     fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
//!         match event.id() {
//!             EventId::Bootstrap => ctx.send(ctx.me(), Event::receive()),
//!             EventId::Receive => {
//!                 self.toggles += 1;
//!                 ctx.resend_after(ctx.me(), event, Time::millis(500));
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//!
//! let board = SimPlatform::new();
//! let mut blink = Blink { toggles: 0 };
//! let scheduler = Scheduler::new(&board, PowerPolicy::new());
//! scheduler.register(&mut blink).unwrap();
//! for _ in 0..8 {
//!     scheduler.run();
//! }
//! ```
//!
//! ## Memory Model
//!
//! - **Heap for events**: events are boxed and move between owners; firmware
//!   installs [`GuardedAlloc`] as the global allocator
//! - **Fixed registry**: `[ActorSlot; MAX_ACTORS]`, no per-actor allocation
//! - **Borrowed actors**: the scheduler holds `&mut dyn Actor`, so actors
//!   can live in `static`s or on `main`'s stack

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod actor;
pub mod actors;
pub mod arch;
pub mod config;
pub mod context;
pub mod event;
pub mod fault;
pub mod kernel;
pub mod list;
pub mod memory;
pub mod power;
pub mod scheduler;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod sync;
pub mod time;

pub use actor::{Actor, ActorId, Delivery};
pub use arch::Platform;
pub use context::ActorContext;
pub use event::{Event, EventBox, EventId, Payload};
pub use fault::{Error, Fault, ResetReason};
pub use memory::GuardedAlloc;
pub use power::PowerPolicy;
pub use scheduler::{Scheduler, Stats, Sweep};
pub use time::Time;
