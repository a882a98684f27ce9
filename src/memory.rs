//! # Guarded Allocator
//!
//! A [`GlobalAlloc`] wrapper that brackets every block with guard bands and
//! escalates allocation failures and heap corruption to a fault hook
//! (normally a system reset).
//!
//! ## Block Layout
//!
//! ```text
//!   ┌──────────┬────────┬──────────────────────┬────────┐
//!   │ size     │ guard  │ data (size bytes)    │ guard  │
//!   │ usize    │ 4×0xFD │ 0xCD on alloc        │ 4×0xFD │
//!   └──────────┴────────┴──────────────────────┴────────┘
//!   ◄──── header, rounded up ───►
//!          to the block alignment
//! ```
//!
//! On free, both guards are checked and the data is overwritten with `0xDD`
//! so that use-after-free reads stand out in a debugger.
//!
//! [`GuardedAlloc::in_use`] reports the payload bytes currently allocated.

use core::alloc::{GlobalAlloc, Layout};
use core::mem::size_of;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::fault::Fault;

/// Width of each guard band.
pub const GUARD_SIZE: usize = 4;

/// Guard band fill.
pub const GUARD_BYTE: u8 = 0xFD;

/// Fill for freshly allocated data.
pub const CLEAN_BYTE: u8 = 0xCD;

/// Fill for freed data.
pub const DEAD_BYTE: u8 = 0xDD;

/// Guard-band checking wrapper around an inner allocator.
pub struct GuardedAlloc<A> {
    inner: A,
    on_fault: fn(Fault) -> !,
    in_use: AtomicUsize,
}

impl<A> GuardedAlloc<A> {
    pub const fn new(inner: A, on_fault: fn(Fault) -> !) -> Self {
        Self {
            inner,
            on_fault,
            in_use: AtomicUsize::new(0),
        }
    }

    /// The wrapped allocator, e.g. to initialize its arena.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Payload bytes currently allocated.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }
}

/// Header bytes in front of the data for a given alignment.
fn header_size(align: usize) -> usize {
    let raw = size_of::<usize>() + GUARD_SIZE;
    (raw + align - 1) & !(align - 1)
}

fn block_layout(layout: Layout) -> Option<Layout> {
    let total = header_size(layout.align())
        .checked_add(layout.size())?
        .checked_add(GUARD_SIZE)?;
    Layout::from_size_align(total, layout.align()).ok()
}

unsafe fn is_guard(band: *const u8) -> bool {
    (0..GUARD_SIZE).all(|i| *band.add(i) == GUARD_BYTE)
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for GuardedAlloc<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let Some(block) = block_layout(layout) else {
            (self.on_fault)(Fault::OutOfMemory)
        };
        let base = self.inner.alloc(block);
        if base.is_null() {
            (self.on_fault)(Fault::OutOfMemory);
        }

        let header = header_size(layout.align());
        let data = base.add(header);
        ptr::write_unaligned(base as *mut usize, layout.size());
        ptr::write_bytes(data.sub(GUARD_SIZE), GUARD_BYTE, GUARD_SIZE);
        ptr::write_bytes(data, CLEAN_BYTE, layout.size());
        ptr::write_bytes(data.add(layout.size()), GUARD_BYTE, GUARD_SIZE);

        self.in_use.fetch_add(layout.size(), Ordering::Relaxed);
        data
    }

    unsafe fn dealloc(&self, data: *mut u8, layout: Layout) {
        let header = header_size(layout.align());
        let base = data.sub(header);

        let size = ptr::read_unaligned(base as *const usize);
        if size != layout.size()
            || !is_guard(data.sub(GUARD_SIZE))
            || !is_guard(data.add(layout.size()))
        {
            (self.on_fault)(Fault::HeapCorruption);
        }

        ptr::write_bytes(data, DEAD_BYTE, layout.size());
        self.in_use.fetch_sub(layout.size(), Ordering::Relaxed);
        if let Some(block) = block_layout(layout) {
            self.inner.dealloc(base, block);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
