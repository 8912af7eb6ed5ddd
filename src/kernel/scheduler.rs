// FIFO tasklet scheduler for cooperative run-to-completion work
// NOTE: No dynamic allocation; links live in a fixed arena indexed by TaskId
//
// The queue is a circular singly linked list and only the tail is kept:
// head = links[tail]. Appending splices after the tail in O(1). A node's
// link is None exactly when it is not queued, so "already posted" is a
// single load.
use log::{debug, trace};

use super::task::TaskId;
use super::wake::PendingSignal;
use crate::config::DEFAULT_TASKLETS;

/// Anything tasklets can be posted to.
///
/// Lets callback handlers post without naming the scheduler's capacity.
pub trait Post {
    fn post(&mut self, task: TaskId);
}

pub struct Scheduler<const N: usize = DEFAULT_TASKLETS> {
    links: [Option<TaskId>; N],
    tail: Option<TaskId>,
    signal: &'static dyn PendingSignal,
    // set for the duration of drain()
    draining: bool,
}

impl<const N: usize> Scheduler<N> {
    pub const fn new(signal: &'static dyn PendingSignal) -> Self {
        Self {
            links: [None; N],
            tail: None,
            signal,
            draining: false,
        }
    }

    /// Queue `task` behind everything already posted.
    ///
    /// No-op if the task is already queued. Raises the pending signal when
    /// the queue goes from empty to non-empty.
    pub fn post(&mut self, task: TaskId) {
        debug_assert!(task.index() < N, "{} out of range ({} slots)", task, N);

        if self.is_posted(task) {
            return;
        }

        match self.tail {
            None => {
                self.links[task.index()] = Some(task);
                self.tail = Some(task);
                trace!("post {}: queue was empty, signalling", task);
                self.signal.signal_pending();
            }
            Some(tail) => {
                // new -> head, old tail -> new
                self.links[task.index()] = self.links[tail.index()];
                self.links[tail.index()] = Some(task);
                self.tail = Some(task);
                trace!("post {}", task);
            }
        }
    }

    /// Run every tasklet queued at the time of the call, oldest first.
    ///
    /// `run` is the dispatch for the tasklet's work. It gets the scheduler
    /// back so the work can post more tasklets; those land in a fresh queue
    /// (raising the signal again) and wait for the next drain. Returns the
    /// number of tasklets run.
    ///
    /// Must not be called from inside a running tasklet. Doing so trips a
    /// debug assertion; release builds refuse the nested call and run
    /// nothing.
    pub fn drain<F>(&mut self, mut run: F) -> usize
    where
        F: FnMut(&mut Self, TaskId),
    {
        if self.draining {
            debug_assert!(false, "drain() called from inside a running tasklet");
            return 0;
        }
        self.draining = true;

        // detach the current circle; posts from here on start a new one
        let mut tail = self.tail.take();
        let mut ran = 0;

        while let Some(last) = tail {
            let Some(task) = self.links[last.index()] else {
                debug_assert!(false, "queued {} lost its link", last);
                break;
            };

            if task == last {
                tail = None;
            } else {
                self.links[last.index()] = self.links[task.index()];
            }

            // unlinked before running so the work may re-post itself
            self.links[task.index()] = None;
            run(self, task);
            ran += 1;
        }
        self.draining = false;

        if ran > 0 {
            debug!("drained {} tasklets", ran);
        }
        ran
    }

    // true while drain() is running tasklets
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn are_tasklets_pending(&self) -> bool {
        self.tail.is_some()
    }

    // true while queued, including while waiting in an in-progress drain
    pub fn is_posted(&self, task: TaskId) -> bool {
        self.links[task.index()].is_some()
    }

    // tasklets in the live queue
    pub fn pending(&self) -> usize {
        let Some(tail) = self.tail else {
            return 0;
        };
        let mut count = 1;
        let mut cursor = self.links[tail.index()];
        while let Some(task) = cursor {
            if task == tail {
                break;
            }
            count += 1;
            cursor = self.links[task.index()];
        }
        count
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Post for Scheduler<N> {
    fn post(&mut self, task: TaskId) {
        Scheduler::post(self, task);
    }
}
