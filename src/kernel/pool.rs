// Callback record storage for the callback multiplexer
//
// The multiplexer never allocates; it asks a ContextPool for a record,
// links it into its own FIFO through the record's `next` slot, and hands
// it back once the callback has returned. FixedPool is the stock
// allocation-free implementation: a slab with a free list threaded
// through the vacant slots.

use super::callback::Callback;
use crate::config::DEFAULT_CONTEXT_NODES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(u16);

impl RecordId {
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One deferred call: the callback, its context, and the FIFO link.
pub struct Record<C> {
    pub(crate) callback: Callback<C>,
    pub(crate) context: C,
    pub(crate) next: Option<RecordId>,
}

impl<C> Record<C> {
    pub const fn new(callback: Callback<C>, context: C) -> Self {
        Self {
            callback,
            context,
            next: None,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

/// Allocator for callback records.
///
/// Exhaustion is reported as `None` from [`allocate`](Self::allocate),
/// never as a panic.
pub trait ContextPool<C> {
    fn allocate(&mut self, callback: Callback<C>, context: C) -> Option<RecordId>;

    fn release(&mut self, id: RecordId);

    fn record(&self, id: RecordId) -> Option<&Record<C>>;

    fn record_mut(&mut self, id: RecordId) -> Option<&mut Record<C>>;
}

enum Slot<C> {
    // next free slot
    Vacant(Option<u16>),
    Occupied(Record<C>),
}

pub struct FixedPool<C, const N: usize = DEFAULT_CONTEXT_NODES> {
    slots: [Slot<C>; N],
    free: Option<u16>,
    // slots past this index have never been handed out
    fresh: u16,
    used: usize,
}

impl<C, const N: usize> FixedPool<C, N> {
    pub const fn new() -> Self {
        assert!(N <= u16::MAX as usize, "pool too large for u16 record ids");
        Self {
            slots: [const { Slot::Vacant(None) }; N],
            free: None,
            fresh: 0,
            used: 0,
        }
    }

    pub fn available(&self) -> usize {
        N - self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= N
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<C, const N: usize> Default for FixedPool<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> ContextPool<C> for FixedPool<C, N> {
    fn allocate(&mut self, callback: Callback<C>, context: C) -> Option<RecordId> {
        let index = match self.free {
            Some(index) => {
                let Slot::Vacant(next) = self.slots[index as usize] else {
                    debug_assert!(false, "free list points at an occupied slot");
                    return None;
                };
                self.free = next;
                index
            }
            None if (self.fresh as usize) < N => {
                self.fresh += 1;
                self.fresh - 1
            }
            None => return None,
        };

        self.slots[index as usize] = Slot::Occupied(Record::new(callback, context));
        self.used += 1;
        Some(RecordId::new(index))
    }

    fn release(&mut self, id: RecordId) {
        let slot = &mut self.slots[id.index()];
        if !matches!(slot, Slot::Occupied(_)) {
            debug_assert!(false, "double release of record {}", id.index());
            return;
        }
        *slot = Slot::Vacant(self.free);
        self.free = Some(id.0);
        self.used -= 1;
    }

    fn record(&self, id: RecordId) -> Option<&Record<C>> {
        match self.slots.get(id.index())? {
            Slot::Occupied(record) => Some(record),
            Slot::Vacant(_) => None,
        }
    }

    fn record_mut(&mut self, id: RecordId) -> Option<&mut Record<C>> {
        match self.slots.get_mut(id.index())? {
            Slot::Occupied(record) => Some(record),
            Slot::Vacant(_) => None,
        }
    }
}
