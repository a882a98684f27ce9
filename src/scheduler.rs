//! # Scheduler
//!
//! Cooperative, run-to-completion event scheduler. Owns the actor registry
//! and one mailbox per actor, and decides when the system may sleep.
//!
//! ## Sweep Algorithm
//!
//! Each call to [`Scheduler::run`] is one sweep over all actors:
//!
//! 1. **Snapshot** the hardware clock
//! 2. **Visit** each actor in registration order:
//!    a. Feed the watchdog
//!    b. Start a new visit serial. Every queue operation stamps the event
//!       with the current serial, so anything queued during the visit
//!       (including requeues) marks the end of the actor's turn
//!    c. Pop from the head until a stamped event comes up. A not-yet-due
//!       event goes back to the tail and lowers `next_event`; a due event is
//!       dispatched and sets `next_event` to zero ("work happened")
//!    d. Leave the actor early if a handler changed what sits at the head
//! 3. **Sleep** if nothing was dispatched: the [`PowerPolicy`] turns
//!    `next_event` into a period measured from the last clock reading, the
//!    platform sleeps, and whatever the tick missed is added to the sleep
//!    accumulator
//!
//! ```text
//!   mailbox: [E1 due][E2 t=500][E3 due]        now = 0, visit = v
//!
//!   pop E1 ──► dispatch                       next_event = 0
//!   pop E2 ──► requeue  [E3][E2@v]            next_event = 0
//!   pop E3 ──► dispatch
//!   pop E2@v ──► put back, next actor
//! ```
//!
//! ## Logical Time
//!
//! Handlers see `platform.now() + sleep_time`. On boards whose tick halts in
//! deep sleep, the accumulator keeps deadlines moving across sleeps.
//!
//! ## Busy Time
//!
//! Wall time spent inside handlers is charged to the actor and to the
//! scheduler. A synchronous send is charged at every level of the chain.

use core::cell::Cell;

use log::{debug, error, info, trace, warn};

use crate::actor::{Actor, ActorId, ActorSlot, Delivery};
use crate::arch::Platform;
use crate::config::MAX_ACTORS;
use crate::context::ActorContext;
use crate::event::{Event, EventBox, EventId};
use crate::fault::{Error, Fault};
use crate::power::PowerPolicy;
use crate::time::Time;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Events handed to handlers.
    pub dispatched: usize,
    /// Not-yet-due events put back at the tail.
    pub requeued: usize,
    /// Earliest pending deadline; [`Time::ZERO`] if anything was dispatched.
    pub next_event: Time,
    /// Sleep period requested from the platform, if the sweep ended in one.
    pub slept: Option<Time>,
}

/// Telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub now: Time,
    pub busy_time: Time,
    pub sleep_time: Time,
    pub actors: usize,
}

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The runtime: actor registry, mailboxes and power bookkeeping.
///
/// All operations take `&self` so handlers can reach the scheduler through
/// their [`ActorContext`] while a sweep is in progress. State lives in cells;
/// the runtime is single-threaded.
pub struct Scheduler<'a> {
    platform: &'a dyn Platform,
    policy: PowerPolicy,

    /// Fixed registry. Slots `0..count` are occupied.
    slots: [ActorSlot<'a>; MAX_ACTORS],
    count: Cell<usize>,

    /// Application sleeping mode.
    sleeping: Cell<bool>,

    /// Wall time spent in handlers.
    busy_time: Cell<Time>,

    /// Sleep time the hardware tick did not observe.
    sleep_time: Cell<Time>,

    /// Set while a sweep is in progress.
    running: Cell<bool>,

    /// Serial of the current actor visit; stamped on queued events.
    visit: Cell<u32>,
}

impl<'a> Scheduler<'a> {
    /// Create an empty scheduler and arm the watchdog.
    pub fn new(platform: &'a dyn Platform, policy: PowerPolicy) -> Self {
        platform.watchdog_enable(policy.watchdog_timeout);
        Self {
            platform,
            policy,
            slots: core::array::from_fn(|_| ActorSlot::empty()),
            count: Cell::new(0),
            sleeping: Cell::new(false),
            busy_time: Cell::new(Time::ZERO),
            sleep_time: Cell::new(Time::ZERO),
            running: Cell::new(false),
            visit: Cell::new(0),
        }
    }

    /// Add `actor` to the registry and queue its `Bootstrap`.
    ///
    /// May be called from inside a handler; the new actor is visited later
    /// in the same sweep.
    ///
    /// # Returns
    /// - `Ok(id)`: the actor's identity, its registration index
    /// - `Err(Error::RegistryFull)`: all `MAX_ACTORS` slots are taken
    pub fn register(&self, actor: &'a mut dyn Actor) -> Result<ActorId, Error> {
        let index = self.count.get();
        if index >= MAX_ACTORS {
            warn!("cannot register actor: registry full");
            return Err(Error::RegistryFull);
        }

        let slot = &self.slots[index];
        debug_assert!(!slot.is_occupied());
        *slot.actor.borrow_mut() = Some(actor);
        self.count.set(index + 1);

        let id = ActorId(index as u8);
        debug!("registered {}", id);
        self.resend(id, Event::bootstrap());
        Ok(id)
    }

    /// Run one sweep over every actor. See the module docs.
    ///
    /// Not reentrant: a nested call from a handler does nothing and returns
    /// an empty [`Sweep`].
    pub fn run(&self) -> Sweep {
        if self.running.replace(true) {
            warn!("nested run() ignored");
            return Sweep::default();
        }

        let mut now = self.platform.now();
        let mut sweep = Sweep {
            next_event: Time::MAX,
            ..Sweep::default()
        };

        // `count` is re-read each step: actors registered mid-sweep are
        // visited too.
        let mut index = 0;
        while index < self.count.get() {
            let id = ActorId(index as u8);
            let slot = &self.slots[index];
            self.platform.watchdog_feed();

            let visit = self.visit.get().wrapping_add(1);
            self.visit.set(visit);

            loop {
                let mut mailbox = slot.mailbox.borrow_mut();
                let Some(event) = mailbox.pop_front() else {
                    break;
                };
                if event.queued_in == visit {
                    mailbox.push_front(event);
                    break;
                }
                let next = mailbox.head_ptr();
                drop(mailbox);

                let start = self.platform.now();
                now = start;
                let logical = start + self.sleep_time.get();
                if logical < event.not_before {
                    sweep.next_event = sweep.next_event.min(event.not_before);
                    self.enqueue(slot, event, false);
                    sweep.requeued += 1;
                    continue;
                }

                sweep.next_event = Time::ZERO;
                self.dispatch(slot, id, event, start, logical);
                sweep.dispatched += 1;

                if slot.mailbox.borrow().head_ptr() != next {
                    break;
                }
            }
            index += 1;
        }

        if sweep.next_event != Time::ZERO {
            let logical = now + self.sleep_time.get();
            if let Some(period) = self
                .policy
                .sleep_period(sweep.next_event, logical, self.sleeping.get())
            {
                let unobserved = self.policy.enter_low_power(self.platform, period);
                self.sleep_time.set(self.sleep_time.get() + unobserved);
                sweep.slept = Some(period);
            }
        }

        trace!(
            "sweep: {} dispatched, {} requeued, next {}",
            sweep.dispatched,
            sweep.requeued,
            sweep.next_event
        );
        self.running.set(false);
        sweep
    }

    /// Hand `event` to its handler and charge the elapsed time.
    fn dispatch(&self, slot: &ActorSlot<'a>, id: ActorId, event: EventBox, start: Time, logical: Time) {
        let mut guard = match slot.actor.try_borrow_mut() {
            Ok(guard) => guard,
            Err(_) => {
                // Already executing further up the stack.
                self.enqueue(slot, event, false);
                return;
            }
        };
        let Some(actor) = guard.as_deref_mut() else {
            return;
        };

        trace!("{} <- {:?}", id, event.id());
        let ctx = ActorContext::new(self, id, logical);
        actor.on_event(event, &ctx);
        drop(guard);

        let spent = self.platform.now() - start;
        slot.add_busy(spent);
        self.busy_time.set(self.busy_time.get() + spent);
    }

    /// Stamp `event` with the current visit and queue it.
    fn enqueue(&self, slot: &ActorSlot<'a>, mut event: EventBox, front: bool) {
        event.queued_in = self.visit.get();
        let mut mailbox = slot.mailbox.borrow_mut();
        if front {
            mailbox.push_front(event);
        } else {
            mailbox.push_back(event);
        }
    }

    fn slot(&self, id: ActorId) -> Option<&ActorSlot<'a>> {
        if id.index() < self.count.get() {
            Some(&self.slots[id.index()])
        } else {
            warn!("no such actor {}", id);
            None
        }
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Deliver `event` as the recipient's [`Actor::on_send`] asks.
    ///
    /// A recipient that is executing cannot be asked; its event is queued.
    pub fn send(&self, recipient: ActorId, event: EventBox) {
        let Some(slot) = self.slot(recipient) else {
            return;
        };
        let delivery = match slot.actor.try_borrow() {
            Ok(actor) => actor
                .as_deref()
                .map_or(Delivery::Mailbox, |actor| actor.on_send(&event)),
            Err(_) => Delivery::Mailbox,
        };
        match delivery {
            Delivery::Mailbox => self.enqueue(slot, event, false),
            Delivery::Immediate => self.enqueue(slot, event, true),
            Delivery::Sync => self.send_sync(recipient, event),
        }
    }

    /// Queue `event` at the head of the recipient's mailbox.
    pub fn send_immediate(&self, recipient: ActorId, event: EventBox) {
        self.resend_immediate(recipient, event);
    }

    /// Dispatch `event` to `recipient` now, bypassing its mailbox.
    ///
    /// Falls back to the mailbox when the recipient is already executing.
    pub fn send_sync(&self, recipient: ActorId, event: EventBox) {
        let Some(slot) = self.slot(recipient) else {
            return;
        };
        self.platform.watchdog_feed();
        let start = self.platform.now();
        self.dispatch(slot, recipient, event, start, start + self.sleep_time.get());
    }

    /// Queue an owned event at the tail, as-is.
    pub fn resend(&self, recipient: ActorId, event: EventBox) {
        if let Some(slot) = self.slot(recipient) {
            self.enqueue(slot, event, false);
        }
    }

    /// Queue an owned event at the head, as-is.
    pub fn resend_immediate(&self, recipient: ActorId, event: EventBox) {
        if let Some(slot) = self.slot(recipient) {
            self.enqueue(slot, event, true);
        }
    }

    /// Drop every pending `id` event queued for `actor`. Returns how many.
    pub fn purge_events(&self, actor: ActorId, id: EventId) -> usize {
        let Some(slot) = self.slot(actor) else {
            return 0;
        };
        let removed = slot.mailbox.borrow_mut().retain(|event| event.id() != id);
        if removed > 0 {
            debug!("purged {} {:?} event(s) from {}", removed, id, actor);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Power
    // -----------------------------------------------------------------------

    /// Enter application sleeping mode: every idle sleep lasts at least
    /// `min_sleep_period`.
    pub fn sleep(&self) {
        info!("entering sleeping mode");
        self.sleeping.set(true);
    }

    pub fn wake_up(&self) {
        info!("leaving sleeping mode");
        self.sleeping.set(false);
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping.get()
    }

    pub fn policy(&self) -> &PowerPolicy {
        &self.policy
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Hardware time plus unobserved sleep.
    pub fn logical_now(&self) -> Time {
        self.platform.now() + self.sleep_time.get()
    }

    pub fn busy_time(&self) -> Time {
        self.busy_time.get()
    }

    pub fn sleep_time(&self) -> Time {
        self.sleep_time.get()
    }

    /// Handler time charged to `actor`.
    pub fn actor_busy_time(&self, actor: ActorId) -> Time {
        self.slot(actor)
            .map_or(Time::ZERO, |slot| slot.busy_time.get())
    }

    /// Events waiting in `actor`'s mailbox.
    pub fn pending(&self, actor: ActorId) -> usize {
        self.slot(actor).map_or(0, |slot| slot.mailbox.borrow().len())
    }

    pub fn actor_count(&self) -> usize {
        self.count.get()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            now: self.logical_now(),
            busy_time: self.busy_time(),
            sleep_time: self.sleep_time(),
            actors: self.actor_count(),
        }
    }

    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    /// Record `fault` and reset the board.
    pub fn reset(&self, fault: Fault) -> ! {
        error!("reset: {} ({})", fault, fault.reason());
        self.platform.reset(fault.reason())
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::sim::{SimPlatform, WatchdogState};
    use crate::event::Payload;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(ActorId, EventId)>>>;

    /// Records every event it receives.
    struct Recorder {
        log: Log,
    }

    impl Recorder {
        fn new(log: &Log) -> Self {
            Self { log: log.clone() }
        }
    }

    impl Actor for Recorder {
        fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
            self.log.borrow_mut().push((ctx.me(), event.id()));
        }
    }

    /// Runs a closure for every event.
    struct Probe<F> {
        handler: F,
    }

    impl<F> Probe<F>
    where
        F: FnMut(EventBox, &ActorContext<'_, '_>),
    {
        fn new(handler: F) -> Self {
            Self { handler }
        }
    }

    impl<F> Actor for Probe<F>
    where
        F: FnMut(EventBox, &ActorContext<'_, '_>),
    {
        fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
            (self.handler)(event, ctx)
        }
    }

    struct Quiet;

    impl Actor for Quiet {
        fn on_event(&mut self, _event: EventBox, _ctx: &ActorContext<'_, '_>) {}
    }

    fn private_at(tag: u8, value: u32, not_before: Time) -> EventBox {
        Event::at(Payload::Private { tag, value }, not_before)
    }

    #[test]
    fn test_new_arms_watchdog() {
        let sim = SimPlatform::new();
        let policy = PowerPolicy::new().with_watchdog_timeout(Time::seconds(4));
        let _sched = Scheduler::new(&sim, policy);
        assert_eq!(sim.watchdog(), WatchdogState::Armed(Time::seconds(4)));
    }

    #[test]
    fn test_bootstraps_arrive_first_in_registration_order() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let mut b = Recorder::new(&log);
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let a = sched.register(&mut a).unwrap();
        let b = sched.register(&mut b).unwrap();
        sched.send(b, Event::receive());

        sched.run();
        assert_eq!(
            *log.borrow(),
            [
                (a, EventId::Bootstrap),
                (b, EventId::Bootstrap),
                (b, EventId::Receive),
            ]
        );
    }

    #[test]
    fn test_registry_full() {
        let sim = SimPlatform::new();
        let mut actors: Vec<Quiet> = (0..=MAX_ACTORS).map(|_| Quiet).collect();
        let (fit, extra) = actors.split_at_mut(MAX_ACTORS);
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        for actor in fit {
            sched.register(actor).unwrap();
        }
        assert_eq!(sched.register(&mut extra[0]), Err(Error::RegistryFull));
        assert_eq!(sched.actor_count(), MAX_ACTORS);
    }

    #[test]
    fn test_due_events_skip_future_ones() {
        let sim = SimPlatform::new();
        let seen: Rc<RefCell<Vec<u32>>> = Rc::default();
        let log = seen.clone();
        let mut probe = Probe::new(move |event, _ctx| {
            if let Payload::Private { value, .. } = event.payload() {
                log.borrow_mut().push(*value);
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();
        sched.send(id, Event::private(0, 1));
        sched.send(id, private_at(0, 2, Time::millis(500)));
        sched.send(id, Event::private(0, 3));

        let sweep = sched.run();
        assert_eq!(*seen.borrow(), [1, 3]);
        assert_eq!(sweep.dispatched, 3);
        assert_eq!(sweep.requeued, 1);
        assert_eq!(sweep.next_event, Time::ZERO);
        assert_eq!(sweep.slept, None);
        assert_eq!(sched.pending(id), 1);

        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 0);
        assert_eq!(sweep.next_event, Time::millis(500));
        assert_eq!(sweep.slept, Some(Time::millis(500)));
        assert_eq!(sim.now(), Time::millis(500));

        sched.run();
        assert_eq!(*seen.borrow(), [1, 3, 2]);
        assert_eq!(sched.pending(id), 0);
    }

    #[test]
    fn test_resent_event_waits_for_next_sweep() {
        let sim = SimPlatform::new();
        let count = Rc::new(Cell::new(0u32));
        let counter = count.clone();
        let mut probe = Probe::new(move |event, ctx| match event.id() {
            EventId::Bootstrap => ctx.send(ctx.me(), Event::receive()),
            EventId::Receive => {
                counter.set(counter.get() + 1);
                ctx.resend(ctx.me(), event);
            }
            _ => {}
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();

        sched.run();
        assert_eq!(count.get(), 0);
        assert_eq!(sched.pending(id), 1);

        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 1);
        assert_eq!(count.get(), 1);

        sched.run();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_events_queued_during_visit_wait() {
        let sim = SimPlatform::new();
        let count = Rc::new(Cell::new(0u32));
        let counter = count.clone();
        // Each private event queues another one at the tail.
        let mut probe = Probe::new(move |event, ctx| {
            if let EventId::Private(_) = event.id() {
                counter.set(counter.get() + 1);
                ctx.resend(ctx.me(), Event::private(0, 0));
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();
        sched.run();

        sched.send(id, Event::private(0, 0));
        sched.send(id, Event::private(0, 0));
        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 2);
        assert_eq!(count.get(), 2);
        assert_eq!(sched.pending(id), 2);
    }

    #[test]
    fn test_purge_then_resend_waits_for_next_sweep() {
        let sim = SimPlatform::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let values = seen.clone();
        let mut probe = Probe::new(move |event, ctx| {
            let Payload::Private { tag, value } = *event.payload() else {
                return;
            };
            values.borrow_mut().push(value);
            if tag == 0 {
                ctx.purge_events(ctx.me(), EventId::Private(2));
                ctx.resend(ctx.me(), event);
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();
        sched.run();

        sched.send(id, Event::private(0, 1));
        sched.send(id, Event::private(1, 2));
        sched.send(id, Event::private(2, 3));
        let sweep = sched.run();
        assert_eq!(*seen.borrow(), [1, 2]);
        assert_eq!(sweep.dispatched, 2);
        assert_eq!(sched.pending(id), 1);

        sched.run();
        assert_eq!(*seen.borrow(), [1, 2, 1]);
    }

    #[test]
    fn test_send_after_counts_from_dispatch_time() {
        let sim = SimPlatform::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let events = seen.clone();
        let mut probe = Probe::new(move |event, ctx| match event.id() {
            EventId::Bootstrap => ctx.send_after(ctx.me(), Event::receive(), Time::millis(300)),
            id => events.borrow_mut().push((id, event.sender(), ctx.now())),
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();

        sim.set_now(Time::millis(100));
        sched.run();
        let sweep = sched.run();
        assert_eq!(sweep.next_event, Time::millis(400));
        assert_eq!(sweep.slept, Some(Time::millis(300)));

        sched.run();
        assert_eq!(
            *seen.borrow(),
            [(EventId::Receive, Some(id), Time::millis(400))]
        );
    }

    #[test]
    fn test_resend_immediate_keeps_sender_and_jumps_queue() {
        let sim = SimPlatform::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let events = seen.clone();
        let forwarder = ActorId(0);
        let sink = ActorId(1);
        let mut front = Probe::new(move |event, ctx| {
            if event.id() == EventId::Private(0) {
                ctx.resend_immediate(sink, event);
            }
        });
        let mut back = Probe::new(move |event, _ctx| {
            if let EventId::Private(_) = event.id() {
                events.borrow_mut().push((event.id(), event.sender()));
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        assert_eq!(sched.register(&mut front).unwrap(), forwarder);
        assert_eq!(sched.register(&mut back).unwrap(), sink);
        sched.run();

        sched.send(sink, Event::private(1, 0));
        sched.send(forwarder, Event::private(0, 0));
        sched.run();
        assert_eq!(
            *seen.borrow(),
            [(EventId::Private(0), None), (EventId::Private(1), None)]
        );
    }

    /// Wraps the simulator with a clock that moves 10 ms per reading.
    struct CreepingClock {
        sim: SimPlatform,
    }

    impl Platform for CreepingClock {
        fn now(&self) -> Time {
            self.sim.advance(Time::millis(10));
            self.sim.now()
        }

        fn sleep(&self, period: Time) -> Time {
            self.sim.sleep(period)
        }

        fn watchdog_enable(&self, timeout: Time) {
            self.sim.watchdog_enable(timeout)
        }

        fn watchdog_disable(&self) {
            self.sim.watchdog_disable()
        }

        fn watchdog_feed(&self) {
            self.sim.watchdog_feed()
        }

        fn reset(&self, reason: crate::fault::ResetReason) -> ! {
            self.sim.reset(reason)
        }

        fn last_reset_reason(&self) -> Option<crate::fault::ResetReason> {
            self.sim.last_reset_reason()
        }
    }

    #[test]
    fn test_sleep_measured_from_last_clock_reading() {
        let board = CreepingClock {
            sim: SimPlatform::new(),
        };
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let sched = Scheduler::new(&board, PowerPolicy::new());
        let a = sched.register(&mut a).unwrap();
        // Reads at 10 (sweep), 20 (dispatch start) and 30 (dispatch end).
        sched.run();

        sched.send(a, Event::receive_at(Time::millis(500)));
        // Reads at 40 (sweep) and 50 (requeue).
        let sweep = sched.run();
        assert_eq!(sweep.requeued, 1);
        assert_eq!(sweep.slept, Some(Time::millis(450)));
    }

    #[test]
    fn test_head_change_ends_actor_visit() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let events = log.clone();
        let mut probe = Probe::new(move |event, ctx| {
            events.borrow_mut().push((ctx.me(), event.id()));
            if event.id() == EventId::Receive {
                ctx.send_immediate(ctx.me(), Event::wake_up());
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();
        sched.run();

        sched.send(id, Event::receive());
        sched.send(id, Event::sleep());
        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 1);
        assert_eq!(sched.pending(id), 2);

        sched.run();
        let ids: Vec<EventId> = log.borrow().iter().map(|(_, id)| *id).collect();
        assert_eq!(
            ids,
            [EventId::Bootstrap, EventId::Receive, EventId::WakeUp, EventId::Sleep]
        );
    }

    #[test]
    fn test_sleep_until_earliest_deadline() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let mut b = Recorder::new(&log);
        let mut c = Recorder::new(&log);
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let a = sched.register(&mut a).unwrap();
        let b = sched.register(&mut b).unwrap();
        let c = sched.register(&mut c).unwrap();
        sched.run();

        sched.send(a, Event::receive_at(Time::millis(300)));
        sched.send(b, Event::receive_at(Time::millis(200)));
        sched.send(c, Event::receive_at(Time::millis(900)));
        let sweep = sched.run();
        assert_eq!(sweep.requeued, 3);
        assert_eq!(sweep.next_event, Time::millis(200));
        assert_eq!(sweep.slept, Some(Time::millis(200)));
        assert_eq!(sim.sleeps(), [Time::millis(200)]);

        // t=200: b fires, the rest stays queued.
        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 1);
        assert_eq!(log.borrow().last(), Some(&(b, EventId::Receive)));
    }

    #[test]
    fn test_sleep_is_capped() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let a = sched.register(&mut a).unwrap();
        sched.run();

        sched.send(a, Event::receive_at(Time::seconds(10)));
        assert_eq!(sched.run().slept, Some(Time::millis(4000)));
    }

    #[test]
    fn test_empty_system_sleeps_max() {
        let sim = SimPlatform::new();
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let sweep = sched.run();
        assert_eq!(sweep.next_event, Time::MAX);
        assert_eq!(sweep.slept, Some(Time::millis(4000)));
        assert_eq!(sim.watchdog_during_sleeps(), [WatchdogState::Disabled]);
        assert_eq!(sim.watchdog(), WatchdogState::Armed(Time::millis(8000)));
    }

    #[test]
    fn test_sleeping_mode_floor() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let policy = PowerPolicy::new().with_min_sleep(Time::millis(10));
        let sched = Scheduler::new(&sim, policy);
        let a = sched.register(&mut a).unwrap();
        sched.run();

        sched.send(a, Event::receive_at(Time::millis(3)));
        assert_eq!(sched.run().slept, None);
        assert_eq!(sim.now(), Time::ZERO);

        sched.sleep();
        assert!(sched.is_sleeping());
        assert_eq!(sched.run().slept, Some(Time::millis(10)));
        assert_eq!(sim.now(), Time::millis(10));

        sched.wake_up();
        assert!(!sched.is_sleeping());
        assert_eq!(sched.run().dispatched, 1);
    }

    #[test]
    fn test_resend_reuses_event() {
        let sim = SimPlatform::new();
        let seen: Rc<RefCell<Vec<(usize, Time)>>> = Rc::default();
        let log = seen.clone();
        let mut probe = Probe::new(move |event, ctx| {
            if let EventId::Private(_) = event.id() {
                log.borrow_mut()
                    .push((&*event as *const Event as usize, event.not_before));
                if log.borrow().len() == 1 {
                    ctx.resend_after(ctx.me(), event, Time::millis(100));
                }
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();
        sched.send(id, Event::private(1, 0));

        sched.run();
        assert_eq!(sched.run().slept, Some(Time::millis(100)));
        sched.run();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, seen[1].0);
        assert_eq!(seen[0].1, Time::ZERO);
        assert_eq!(seen[1].1, Time::millis(100));
    }

    #[test]
    fn test_purge_by_tag() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let mut a = Recorder::new(&log);
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let a = sched.register(&mut a).unwrap();
        sched.send(a, Event::private(1, 0));
        sched.send(a, Event::private(2, 0));
        sched.send(a, Event::private(1, 0));

        assert_eq!(sched.purge_events(a, EventId::Private(1)), 2);
        assert_eq!(sched.pending(a), 2);
        assert_eq!(sched.purge_events(a, EventId::Private(1)), 0);

        sched.run();
        assert_eq!(
            *log.borrow(),
            [(a, EventId::Bootstrap), (a, EventId::Private(2))]
        );
    }

    #[test]
    fn test_send_sync_bypasses_mailbox() {
        let sim = SimPlatform::new();
        let log: Rc<RefCell<Vec<(EventId, Option<ActorId>)>>> = Rc::default();
        let mut caller = Probe::new(|event, ctx| {
            if event.id() == EventId::Bootstrap {
                ctx.send_sync(ActorId(1), Event::private(9, 0));
            }
        });
        let events = log.clone();
        let mut callee = Probe::new(|event, _ctx| {
            if event.id() == EventId::Private(9) {
                sim.advance(Time::millis(5));
            }
            events.borrow_mut().push((event.id(), event.sender()));
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let caller = sched.register(&mut caller).unwrap();
        let callee = sched.register(&mut callee).unwrap();

        sched.run();
        assert_eq!(
            *log.borrow(),
            [(EventId::Private(9), Some(caller)), (EventId::Bootstrap, None)]
        );
        assert_eq!(sched.actor_busy_time(callee), Time::millis(5));
        assert_eq!(sched.actor_busy_time(caller), Time::millis(5));
        assert_eq!(sched.busy_time(), Time::millis(10));
        // One feed per actor visit plus one for the synchronous dispatch.
        assert_eq!(sim.watchdog_feeds(), 3);
    }

    /// Routes `Data` synchronously and `WakeUp` to the head.
    struct Router {
        log: Rc<RefCell<Vec<EventId>>>,
    }

    impl Actor for Router {
        fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
            self.log.borrow_mut().push(event.id());
            if event.id() == EventId::Bootstrap {
                ctx.send(ctx.me(), Event::data("self"));
            }
        }

        fn on_send(&self, event: &Event) -> Delivery {
            match event.id() {
                EventId::Data => Delivery::Sync,
                EventId::WakeUp => Delivery::Immediate,
                _ => Delivery::Mailbox,
            }
        }
    }

    #[test]
    fn test_on_send_routing() {
        let sim = SimPlatform::new();
        let log: Rc<RefCell<Vec<EventId>>> = Rc::default();
        let mut router = Router { log: log.clone() };
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut router).unwrap();

        // Sending to itself while busy: queued, not dispatched.
        sched.run();
        assert_eq!(*log.borrow(), [EventId::Bootstrap]);
        assert_eq!(sched.pending(id), 1);

        sched.send(id, Event::receive());
        sched.send(id, Event::wake_up());
        sched.send(id, Event::data("now"));
        assert_eq!(*log.borrow(), [EventId::Bootstrap, EventId::Data]);
        assert_eq!(sched.pending(id), 3);

        sched.run();
        assert_eq!(
            *log.borrow(),
            [
                EventId::Bootstrap,
                EventId::Data,
                EventId::WakeUp,
                EventId::Data,
                EventId::Receive,
            ]
        );
    }

    #[test]
    fn test_nested_run_is_ignored() {
        let sim = SimPlatform::new();
        let nested: Rc<Cell<Option<Sweep>>> = Rc::default();
        let slot = nested.clone();
        let mut probe = Probe::new(move |_event, ctx| {
            slot.set(Some(ctx.scheduler().run()));
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        let id = sched.register(&mut probe).unwrap();

        assert_eq!(sched.run().dispatched, 1);
        assert_eq!(nested.get(), Some(Sweep::default()));

        // The guard is released once the outer sweep returns.
        sched.send(id, Event::receive());
        assert_eq!(sched.run().dispatched, 1);
    }

    #[test]
    fn test_register_from_handler() {
        let sim = SimPlatform::new();
        let log = Log::default();
        let child_log = log.clone();
        let mut parent = Probe::new(move |event, ctx| {
            if event.id() == EventId::Bootstrap {
                let child = Box::leak(Box::new(Recorder::new(&child_log)));
                ctx.scheduler().register(child).unwrap();
            }
        });
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        sched.register(&mut parent).unwrap();

        let sweep = sched.run();
        assert_eq!(sweep.dispatched, 2);
        assert_eq!(*log.borrow(), [(ActorId(1), EventId::Bootstrap)]);
        assert_eq!(sched.actor_count(), 2);
    }

    #[test]
    fn test_unknown_recipient_is_dropped() {
        let sim = SimPlatform::new();
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        sched.send(ActorId(5), Event::receive());
        sched.send_sync(ActorId(5), Event::receive());
        assert_eq!(sched.pending(ActorId(5)), 0);
        assert_eq!(sched.actor_busy_time(ActorId(5)), Time::ZERO);
    }

    #[test]
    fn test_stats_snapshot() {
        let sim = SimPlatform::new();
        let mut quiet = Quiet;
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        sched.register(&mut quiet).unwrap();
        sim.advance(Time::millis(42));
        assert_eq!(
            sched.stats(),
            Stats {
                now: Time::millis(42),
                busy_time: Time::ZERO,
                sleep_time: Time::ZERO,
                actors: 1,
            }
        );
    }

    #[test]
    #[should_panic(expected = "system reset: HEAP")]
    fn test_reset_stamps_fault_reason() {
        let sim = SimPlatform::new();
        let sched = Scheduler::new(&sim, PowerPolicy::new());
        sched.reset(Fault::HeapCorruption);
    }
}
