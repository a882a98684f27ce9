//! # Intrusive Event List
//!
//! The per-actor mailbox. Every [`Event`] embeds its own `next` link, so
//! queueing an event costs no allocation beyond the event itself.
//!
//! ```text
//!   head ──► [Event]──next──► [Event]──next──► [Event]──next──► None
//!             owns              owns              owns
//! ```
//!
//! Each link *owns* the rest of the chain: detaching a node hands its box
//! back to the caller, and the list never holds an event anybody else can
//! see. Positions are addressed with a [`Cursor`]; operations other than
//! those at the head walk from the head (mailboxes hold a handful of events,
//! so O(n) is fine).
//!
//! Operations past the end are no-ops and return [`EventList::end`].

use core::fmt;

use crate::event::{Event, EventBox};

type Link = Option<EventBox>;

/// A position in an [`EventList`]: `0` is the head, `len()` is the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

impl Cursor {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Singly-linked FIFO of owned events.
#[derive(Default)]
pub struct EventList {
    head: Link,
    len: usize,
}

impl EventList {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn begin(&self) -> Cursor {
        Cursor(0)
    }

    #[inline]
    pub fn end(&self) -> Cursor {
        Cursor(self.len)
    }

    pub fn front(&self) -> Option<&Event> {
        self.head.as_deref()
    }

    /// Identity of the current head node.
    ///
    /// The scheduler compares this before and after a dispatch to learn
    /// whether the handler queued something ahead of the remaining events.
    pub fn head_ptr(&self) -> Option<*const Event> {
        self.head.as_deref().map(|event| event as *const Event)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { next: self.head.as_deref() }
    }

    /// Append at the tail. Returns the cursor of the new tail.
    pub fn push_back(&mut self, item: EventBox) -> Cursor {
        self.insert(self.end(), item)
    }

    /// Prepend at the head, ahead of everything already queued.
    pub fn push_front(&mut self, item: EventBox) {
        self.insert(self.begin(), item);
    }

    pub fn pop_front(&mut self) -> Option<EventBox> {
        let mut first = self.head.take()?;
        self.head = first.next.take();
        self.len -= 1;
        Some(first)
    }

    /// Detach the event under `cursor` and return it. The cursor is left on
    /// what is now the next event (the same index).
    pub fn pop_at(&mut self, cursor: &mut Cursor) -> Option<EventBox> {
        if cursor.0 >= self.len {
            *cursor = self.end();
            return None;
        }
        let link = self.link_mut(cursor.0)?;
        let mut item = link.take()?;
        *link = item.next.take();
        self.len -= 1;
        Some(item)
    }

    /// Drop the event under `cursor`. Returns the cursor of its successor.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        let mut cursor = cursor;
        let _ = self.pop_at(&mut cursor);
        cursor
    }

    /// Insert `item` before `cursor` (a cursor past the end appends).
    /// Returns the cursor of the inserted event.
    pub fn insert(&mut self, cursor: Cursor, item: EventBox) -> Cursor {
        let index = cursor.0.min(self.len);
        let mut item = item;
        if let Some(link) = self.link_mut(index) {
            item.next = link.take();
            *link = Some(item);
        }
        self.len += 1;
        Cursor(index)
    }

    /// Keep only the events for which `keep` returns `true`, preserving
    /// order. Returns how many were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Event) -> bool,
    {
        let mut removed = 0;
        let mut link = &mut self.head;
        loop {
            let drop_here = match link.as_deref() {
                None => break,
                Some(event) => !keep(event),
            };
            if drop_here {
                if let Some(mut event) = link.take() {
                    *link = event.next.take();
                }
                removed += 1;
            } else if let Some(event) = link {
                link = &mut event.next;
            }
        }
        self.len -= removed;
        removed
    }

    /// The link slot at `index`; `index == len` is the empty tail slot.
    fn link_mut(&mut self, index: usize) -> Option<&mut Link> {
        if index > self.len {
            return None;
        }
        let mut link = &mut self.head;
        for _ in 0..index {
            match link {
                Some(event) => link = &mut event.next,
                None => return None,
            }
        }
        Some(link)
    }
}

impl Drop for EventList {
    fn drop(&mut self) {
        // Unlink one node at a time so long chains cannot recurse deeply.
        let mut link = self.head.take();
        while let Some(mut event) = link {
            link = event.next.take();
        }
    }
}

impl fmt::Debug for EventList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a mailbox, head to tail.
pub struct Iter<'a> {
    next: Option<&'a Event>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<&'a Event> {
        let event = self.next?;
        self.next = event.next.as_deref();
        Some(event)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
