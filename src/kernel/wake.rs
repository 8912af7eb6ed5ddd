// Pending-work signalling between producers and the host loop
//
// The scheduler raises the signal on every empty -> non-empty transition
// of its queue; the host loop consumes it and calls drain(). Producers
// may sit in ISRs, so every sink here is a plain store or a short
// critical section. Critical section guards riscv32imc (no atomic RMW).

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Receives "work is pending" notifications from a [`Scheduler`].
///
/// Called at most once per empty -> non-empty transition. Must not block.
///
/// [`Scheduler`]: super::Scheduler
pub trait PendingSignal {
    fn signal_pending(&self);
}

/// Single wake flag, set by the scheduler and taken by the host loop.
pub struct PendingFlag {
    raised: AtomicBool,
}

impl PendingFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    // consume the flag; true if it was raised
    pub fn take(&self) -> bool {
        critical_section::with(|_| {
            let raised = self.raised.load(Ordering::Relaxed);
            if raised {
                self.raised.store(false, Ordering::Relaxed);
            }
            raised
        })
    }
}

impl Default for PendingFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSignal for PendingFlag {
    #[inline]
    fn signal_pending(&self) {
        self.raised.store(true, Ordering::Release);
    }
}

/// Counts raised signals. Useful for host-side statistics and tests.
pub struct PendingCounter {
    // cs: riscv32imc has no atomic add
    count: critical_section::Mutex<Cell<u32>>,
}

impl PendingCounter {
    pub const fn new() -> Self {
        Self {
            count: critical_section::Mutex::new(Cell::new(0)),
        }
    }

    pub fn count(&self) -> u32 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    pub fn reset(&self) {
        critical_section::with(|cs| self.count.borrow(cs).set(0));
    }
}

impl Default for PendingCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSignal for PendingCounter {
    fn signal_pending(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(1));
        });
    }
}

// Lets an async host loop `PENDING.wait().await` between drains.
impl<M: RawMutex> PendingSignal for Signal<M, ()> {
    #[inline]
    fn signal_pending(&self) {
        self.signal(());
    }
}
