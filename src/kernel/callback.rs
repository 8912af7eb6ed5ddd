// Callback multiplexer: many deferred calls behind one tasklet
//
// Call sites that only need "run this fn later" share a single TaskId.
// Each post_callback() takes a record from the pool, appends it to an
// internal FIFO (head/tail pair, not circular) and posts the tasklet.
// Posting an already queued tasklet is a no-op, so every call made
// before the next drain coalesces onto one queue slot.
//
// When the tasklet runs, the FIFO is drained to exhaustion: callbacks
// that post more callbacks extend the same pass. This differs from the
// scheduler, which defers new posts to the next drain.

use core::fmt;
use core::marker::PhantomData;

use log::{trace, warn};

use super::pool::{ContextPool, FixedPool, RecordId};
use super::scheduler::Post;
use super::task::TaskId;

/// A deferred call. Gets a handle for posting follow-up callbacks onto
/// the same multiplexer, and the context it was posted with.
pub type Callback<C> = fn(&mut dyn Defer<C>, C);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostError {
    /// Context pool exhausted; the callback was not queued
    NoBufs,
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostError::NoBufs => write!(f, "no callback records left"),
        }
    }
}

/// Posting surface handed to a running callback.
pub trait Defer<C> {
    fn try_post_callback(&mut self, callback: Callback<C>, context: C) -> Result<(), PostError>;

    // best effort: an exhausted pool drops the call
    fn post_callback(&mut self, callback: Callback<C>, context: C) {
        if let Err(err) = self.try_post_callback(callback, context) {
            warn!("deferred callback dropped: {}", err);
        }
    }
}

pub struct CallbackTasklet<C, P = FixedPool<C>> {
    task: TaskId,
    pool: P,
    head: Option<RecordId>,
    tail: Option<RecordId>,
    len: usize,
    // contexts live in the pool; C only flows through
    _context: PhantomData<fn(C)>,
}

impl<C: Copy, P: ContextPool<C>> CallbackTasklet<C, P> {
    pub const fn new(task: TaskId, pool: P) -> Self {
        Self {
            task,
            pool,
            head: None,
            tail: None,
            len: 0,
            _context: PhantomData,
        }
    }

    /// Handle to dispatch on in the host's drain loop.
    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn pending_callbacks(&self) -> usize {
        self.len
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Queue `callback(context)` and post the multiplexer's tasklet.
    ///
    /// On pool exhaustion nothing is queued or posted and
    /// [`PostError::NoBufs`] is returned.
    pub fn try_post_callback<S>(
        &mut self,
        sched: &mut S,
        callback: Callback<C>,
        context: C,
    ) -> Result<(), PostError>
    where
        S: Post + ?Sized,
    {
        let id = self
            .pool
            .allocate(callback, context)
            .ok_or(PostError::NoBufs)?;
        self.push_back(id);
        sched.post(self.task);
        Ok(())
    }

    /// Best-effort form of [`try_post_callback`](Self::try_post_callback):
    /// a call that cannot get a record is dropped and logged.
    pub fn post_callback<S>(&mut self, sched: &mut S, callback: Callback<C>, context: C)
    where
        S: Post + ?Sized,
    {
        if let Err(err) = self.try_post_callback(sched, callback, context) {
            warn!("{}: deferred callback dropped: {}", self.task, err);
        }
    }

    /// Tasklet body: invoke queued callbacks oldest first until the FIFO
    /// is empty, including ones posted by the callbacks themselves.
    /// Returns the number of callbacks invoked.
    pub fn run<S>(&mut self, sched: &mut S) -> usize
    where
        S: Post + ?Sized,
    {
        let mut ran = 0;

        while let Some(id) = self.pop_front() {
            let Some(record) = self.pool.record(id) else {
                debug_assert!(false, "queued record {} is vacant", id.index());
                continue;
            };
            let (callback, context) = (record.callback, record.context);

            callback(
                &mut Bound {
                    tasklet: &mut *self,
                    sched: &mut *sched,
                },
                context,
            );

            self.pool.release(id);
            ran += 1;
        }

        trace!("{}: ran {} callbacks", self.task, ran);
        ran
    }

    fn push_back(&mut self, id: RecordId) {
        if let Some(record) = self.pool.record_mut(id) {
            record.next = None;
        }

        match self.tail {
            Some(tail) => {
                if let Some(record) = self.pool.record_mut(tail) {
                    record.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    fn pop_front(&mut self) -> Option<RecordId> {
        let id = self.head?;
        let next = self.pool.record_mut(id).and_then(|record| record.next.take());

        self.head = next;
        if next.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(id)
    }
}

// A running callback's view of its multiplexer and scheduler
struct Bound<'a, C, P, S: ?Sized> {
    tasklet: &'a mut CallbackTasklet<C, P>,
    sched: &'a mut S,
}

impl<C, P, S> Defer<C> for Bound<'_, C, P, S>
where
    C: Copy,
    P: ContextPool<C>,
    S: Post + ?Sized,
{
    fn try_post_callback(&mut self, callback: Callback<C>, context: C) -> Result<(), PostError> {
        self.tasklet
            .try_post_callback(&mut *self.sched, callback, context)
    }
}
