//! # Actor Context
//!
//! The handle a handler uses to reach the rest of the system. One context is
//! built per dispatch; it knows which actor is running and the logical time
//! the dispatch started at, and forwards sends to the scheduler.
//!
//! ## Send vs. resend
//!
//! | Operation | Stamps sender | Consults `on_send` | Queue position |
//! |-----------|---------------|--------------------|----------------|
//! | `send` | yes | yes | per [`Delivery`](crate::actor::Delivery) |
//! | `send_immediate` | yes | no | head |
//! | `send_sync` | yes | no | none (dispatched now) |
//! | `resend` | no | no | tail |
//! | `resend_immediate` | no | no | head |
//!
//! Resends exist for handlers that got an event and hand it back, to
//! themselves or someone else, keeping its original sender.

use crate::actor::ActorId;
use crate::event::{EventBox, EventId};
use crate::scheduler::Scheduler;
use crate::time::Time;

/// Per-dispatch view of the scheduler.
pub struct ActorContext<'s, 'a> {
    scheduler: &'s Scheduler<'a>,
    actor: ActorId,
    now: Time,
}

impl<'s, 'a> ActorContext<'s, 'a> {
    pub(crate) fn new(scheduler: &'s Scheduler<'a>, actor: ActorId, now: Time) -> Self {
        Self { scheduler, actor, now }
    }

    /// Logical time at which this dispatch started.
    #[inline]
    pub fn now(&self) -> Time {
        self.now
    }

    /// The actor being dispatched.
    #[inline]
    pub fn me(&self) -> ActorId {
        self.actor
    }

    #[inline]
    pub fn scheduler(&self) -> &'s Scheduler<'a> {
        self.scheduler
    }

    /// Send `event` from this actor, routed by the recipient's
    /// [`Actor::on_send`](crate::actor::Actor::on_send).
    pub fn send(&self, recipient: ActorId, mut event: EventBox) {
        event.set_sender(Some(self.actor));
        self.scheduler.send(recipient, event);
    }

    /// Send `event` so that it becomes due `delay` from now.
    pub fn send_after(&self, recipient: ActorId, mut event: EventBox, delay: Time) {
        event.not_before = self.now + delay;
        self.send(recipient, event);
    }

    /// Send `event` to the head of the recipient's mailbox.
    pub fn send_immediate(&self, recipient: ActorId, mut event: EventBox) {
        event.set_sender(Some(self.actor));
        self.scheduler.send_immediate(recipient, event);
    }

    /// Dispatch `event` to `recipient` before returning.
    pub fn send_sync(&self, recipient: ActorId, mut event: EventBox) {
        event.set_sender(Some(self.actor));
        self.scheduler.send_sync(recipient, event);
    }

    /// Hand an owned event back to a mailbox tail, sender untouched.
    pub fn resend(&self, recipient: ActorId, event: EventBox) {
        self.scheduler.resend(recipient, event);
    }

    pub fn resend_immediate(&self, recipient: ActorId, event: EventBox) {
        self.scheduler.resend_immediate(recipient, event);
    }

    /// Requeue `event` due `delay` from now. This is the timer primitive:
    /// a periodic actor resends its own tick with the next deadline.
    pub fn resend_after(&self, recipient: ActorId, mut event: EventBox, delay: Time) {
        event.not_before = self.now + delay;
        self.resend(recipient, event);
    }

    /// Drop every pending `id` event queued for `actor`.
    pub fn purge_events(&self, actor: ActorId, id: EventId) -> usize {
        self.scheduler.purge_events(actor, id)
    }
}
