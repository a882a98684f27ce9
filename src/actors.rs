//! # Utility Actors
//!
//! Small building blocks most firmware ends up needing:
//!
//! - [`NullActor`]: a sink that drops whatever it is sent
//! - [`SchedulerActor`]: runs deferred closures at their deadline
//! - [`PeriodicTrigger`]: rate-limits work inside a handler that is woken
//!   more often than the work should run

use log::trace;

use crate::actor::{Actor, ActorId};
use crate::context::ActorContext;
use crate::event::{Event, EventBox, Payload};
use crate::time::Time;

/// Drops every event.
#[derive(Debug, Default)]
pub struct NullActor;

impl Actor for NullActor {
    fn on_event(&mut self, _event: EventBox, _ctx: &ActorContext<'_, '_>) {}
}

/// Executes [`Payload::Scheduled`] closures.
///
/// ```ignore
/// SchedulerActor::schedule(ctx, timers, ctx.now() + Time::seconds(5), |ctx| {
///     ctx.send(led, Event::private(LED_OFF, 0));
/// });
/// ```
#[derive(Debug, Default)]
pub struct SchedulerActor;

impl SchedulerActor {
    /// Have the scheduler actor `scheduler` run `function` at time `at`.
    pub fn schedule<F>(ctx: &ActorContext<'_, '_>, scheduler: ActorId, at: Time, function: F)
    where
        F: FnOnce(&ActorContext<'_, '_>) + 'static,
    {
        ctx.send(scheduler, Event::scheduled(at, function));
    }

    /// Have the scheduler actor `scheduler` run `function` `delay` from now.
    pub fn schedule_after<F>(ctx: &ActorContext<'_, '_>, scheduler: ActorId, delay: Time, function: F)
    where
        F: FnOnce(&ActorContext<'_, '_>) + 'static,
    {
        Self::schedule(ctx, scheduler, ctx.now() + delay, function);
    }
}

impl Actor for SchedulerActor {
    fn on_event(&mut self, event: EventBox, ctx: &ActorContext<'_, '_>) {
        if let Payload::Scheduled(function) = event.into_payload() {
            trace!("running scheduled function at {}", ctx.now());
            function(ctx);
        }
    }
}

/// Fires at most once per period.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicTrigger {
    last_triggered: Time,
}

impl PeriodicTrigger {
    pub const fn new() -> Self {
        Self {
            last_triggered: Time::ZERO,
        }
    }

    /// `true` if at least `period` has passed since the last time this
    /// returned `true`.
    pub fn is_triggered(&mut self, period: Time, ctx: &ActorContext<'_, '_>) -> bool {
        if self.last_triggered + period <= ctx.now() {
            self.last_triggered = ctx.now();
            true
        } else {
            false
        }
    }

    pub fn last_triggered(&self) -> Time {
        self.last_triggered
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
