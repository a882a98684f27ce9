//! # Events
//!
//! An [`Event`] is one unit of work destined for one actor. It carries:
//!
//! - a [`Payload`], whose variant fixes the event's [`EventId`] for its
//!   whole lifetime
//! - a `not_before` deadline, which actors rewrite to reschedule themselves
//! - the `sender` identity, stamped by the send primitive
//! - the intrusive `next` link used by the mailbox ([`crate::list::EventList`])
//!
//! ## Ownership
//!
//! Events travel as [`EventBox`] (`Box<Event>`), a move-only handle. At any
//! moment exactly one party owns an event: the code that built it, the
//! mailbox it sits in, or the handler that popped it. A handler that wants
//! to fire again later mutates `not_before` and *resends* the same box;
//! nothing is reallocated. A handler that lets the box drop destroys it.
//!
//! ## Lifecycle events
//!
//! | Payload | Meaning |
//! |---------|---------|
//! | `Bootstrap` | Sent once per actor on registration, before anything else |
//! | `Receive` | Self-addressed tick; the framework's only timer primitive |
//! | `Sleep` / `WakeUp` | Enter / leave application low-power mode |
//! | `Data` | A line of text for a line-protocol actor |
//! | `Scheduled` | A deferred closure, run by [`crate::actors::SchedulerActor`] |
//! | `Private` | Actor-private signal with a small integer argument |

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::actor::ActorId;
use crate::context::ActorContext;
use crate::time::Time;

/// Owning handle to a queued or in-flight event.
pub type EventBox = Box<Event>;

/// Deferred closure carried by [`Payload::Scheduled`].
pub type ScheduledFn = Box<dyn FnOnce(&ActorContext<'_, '_>)>;

/// Tag identifying the payload type of an event.
///
/// This is a closed set: handlers `match` on it (or on the payload) and
/// silently drop anything they do not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventId {
    Bootstrap,
    Receive,
    Data,
    Scheduled,
    Sleep,
    WakeUp,
    /// Actor-private event slot.
    Private(u8),
}

/// Event payload.
pub enum Payload {
    Bootstrap,
    Receive,
    Data(String),
    Scheduled(ScheduledFn),
    Sleep,
    WakeUp,
    Private { tag: u8, value: u32 },
}

impl Payload {
    pub fn id(&self) -> EventId {
        match self {
            Payload::Bootstrap => EventId::Bootstrap,
            Payload::Receive => EventId::Receive,
            Payload::Data(_) => EventId::Data,
            Payload::Scheduled(_) => EventId::Scheduled,
            Payload::Sleep => EventId::Sleep,
            Payload::WakeUp => EventId::WakeUp,
            Payload::Private { tag, .. } => EventId::Private(*tag),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Data(data) => f.debug_tuple("Data").field(data).finish(),
            Payload::Scheduled(_) => f.write_str("Scheduled(..)"),
            Payload::Private { tag, value } => f
                .debug_struct("Private")
                .field("tag", tag)
                .field("value", value)
                .finish(),
            other => write!(f, "{:?}", other.id()),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One unit of work for one actor.
pub struct Event {
    /// Earliest logical time at which the event may be dispatched.
    /// [`Time::ZERO`] means "as soon as possible".
    pub not_before: Time,

    /// Stamped by `send`; `None` for events injected from outside any actor.
    sender: Option<ActorId>,

    /// Immutable once built; its variant is the event's identity.
    payload: Payload,

    /// Serial of the actor visit during which the event was last queued.
    pub(crate) queued_in: u32,

    /// Intrusive mailbox link.
    pub(crate) next: Option<EventBox>,
}

impl Event {
    /// A new event, due immediately.
    pub fn new(payload: Payload) -> EventBox {
        Self::at(payload, Time::ZERO)
    }

    /// A new event, due at `not_before`.
    pub fn at(payload: Payload, not_before: Time) -> EventBox {
        Box::new(Event {
            not_before,
            sender: None,
            payload,
            queued_in: 0,
            next: None,
        })
    }

    pub fn bootstrap() -> EventBox {
        Self::new(Payload::Bootstrap)
    }

    pub fn receive() -> EventBox {
        Self::new(Payload::Receive)
    }

    pub fn receive_at(not_before: Time) -> EventBox {
        Self::at(Payload::Receive, not_before)
    }

    pub fn data(data: impl Into<String>) -> EventBox {
        Self::new(Payload::Data(data.into()))
    }

    pub fn sleep() -> EventBox {
        Self::new(Payload::Sleep)
    }

    pub fn wake_up() -> EventBox {
        Self::new(Payload::WakeUp)
    }

    /// A wake-up that only fires at `not_before`.
    pub fn wake_up_at(not_before: Time) -> EventBox {
        Self::at(Payload::WakeUp, not_before)
    }

    pub fn private(tag: u8, value: u32) -> EventBox {
        Self::new(Payload::Private { tag, value })
    }

    /// A closure to run at `not_before`.
    pub fn scheduled<F>(not_before: Time, function: F) -> EventBox
    where
        F: FnOnce(&ActorContext<'_, '_>) + 'static,
    {
        Self::at(Payload::Scheduled(Box::new(function)), not_before)
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.payload.id()
    }

    #[inline]
    pub fn sender(&self) -> Option<ActorId> {
        self.sender
    }

    pub(crate) fn set_sender(&mut self, sender: Option<ActorId>) {
        self.sender = sender;
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consume the event, keeping only its payload.
    pub fn into_payload(self: Box<Self>) -> Payload {
        self.payload
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("payload", &self.payload)
            .field("not_before", &self.not_before)
            .field("sender", &self.sender)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
