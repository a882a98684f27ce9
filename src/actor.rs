//! # Actors
//!
//! Defines the actor contract and the registry slot that backs each
//! registered actor.
//!
//! An actor is the unit of computation: it owns nothing but its own state,
//! receives work exclusively through its mailbox, and talks to other actors
//! only by sending events. Hardware resources (a UART, an I2C bus) belong to
//! exactly one actor and are touched only from its handler.
//!
//! ## Handler contract
//!
//! ```text
//!   mailbox ──pop──► on_event(event, ctx) ──► drop event     (done)
//!                                         └─► ctx.resend(..) (fire again later)
//! ```
//!
//! [`Actor::on_event`] receives exclusive ownership of one event. It matches
//! on the payload, handles what it recognizes and drops the rest: an
//! unrecognized event is not an error.
//!
//! [`Actor::on_send`] lets a recipient choose how events addressed to it are
//! delivered. The default queues them in the mailbox; a latency-critical
//! actor (a serial writer flushing diagnostics) can ask for synchronous
//! delivery so the event is handled before the sender continues.

use core::cell::{Cell, RefCell};
use core::fmt;

use crate::context::ActorContext;
use crate::event::{Event, EventBox};
use crate::list::EventList;
use crate::time::Time;

/// Identity of a registered actor: its index in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub(crate) u8);

impl ActorId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// How an event sent to an actor reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Queue at the tail of the mailbox (the default).
    #[default]
    Mailbox,
    /// Queue at the head of the mailbox, ahead of everything pending.
    Immediate,
    /// Dispatch right now, bypassing the mailbox entirely.
    Sync,
}

/// The actor contract.
pub trait Actor {
    /// Handle one event. The handler owns `event`; dropping it destroys it,
    /// resending it through `ctx` reuses it.
    fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>);

    /// Choose how `event` is delivered when someone sends it to this actor.
    ///
    /// Consulted by [`ActorContext::send`] only. Resends never pass through
    /// here. When the actor is itself executing (it is sending to itself, or
    /// sits further up a synchronous chain) the hook cannot be consulted and
    /// the event goes to the mailbox.
    fn on_send(&self, _event: &Event) -> Delivery {
        Delivery::Mailbox
    }
}

// ---------------------------------------------------------------------------
// Registry slot
// ---------------------------------------------------------------------------

/// Per-actor state held by the scheduler.
///
/// The actor itself and its mailbox live in separate cells: a handler runs
/// with its actor borrowed mutably while any actor, itself included, may
/// push into any mailbox.
pub(crate) struct ActorSlot<'a> {
    pub(crate) actor: RefCell<Option<&'a mut dyn Actor>>,
    pub(crate) mailbox: RefCell<EventList>,
    /// Wall time spent inside this actor's handler.
    pub(crate) busy_time: Cell<Time>,
}

impl<'a> ActorSlot<'a> {
    pub(crate) const fn empty() -> Self {
        Self {
            actor: RefCell::new(None),
            mailbox: RefCell::new(EventList::new()),
            busy_time: Cell::new(Time::ZERO),
        }
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.actor.try_borrow().map_or(true, |actor| actor.is_some())
    }

    /// Add handler time to this actor's counter.
    pub(crate) fn add_busy(&self, spent: Time) {
        self.busy_time.set(self.busy_time.get() + spent);
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
