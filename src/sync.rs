//! # Synchronization Primitives
//!
//! The scheduler itself never runs in interrupt context, so its state needs
//! no locking. The one exception is the millisecond tick, written by the
//! SysTick handler and read by the main loop; [`IsrCell`] covers that case.

use core::cell::Cell;

use cortex_m::interrupt::{self, Mutex};

/// Execute a closure with interrupts disabled.
///
/// Interrupts are restored to their previous state on exit. Keep the
/// enclosed work short: it delays every interrupt on the core.
///
/// ```ignore
/// let ms = sync::critical_section(|cs| MILLIS.borrow(cs).get());
/// ```
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}

/// A `Copy` value shared between thread mode and an interrupt handler.
pub struct IsrCell<T: Copy> {
    inner: Mutex<Cell<T>>,
}

impl<T: Copy> IsrCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        critical_section(|cs| self.inner.borrow(cs).get())
    }

    #[inline]
    pub fn set(&self, value: T) {
        critical_section(|cs| self.inner.borrow(cs).set(value));
    }

    /// Read-modify-write in one critical section.
    #[inline]
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(T) -> T,
    {
        critical_section(|cs| {
            let cell = self.inner.borrow(cs);
            let value = f(cell.get());
            cell.set(value);
            value
        })
    }
}
