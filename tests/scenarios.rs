use std::cell::RefCell;

use tasklet_sched::{
    CallbackTasklet, Defer, FixedPool, PendingCounter, PendingFlag, PostError, Scheduler, TaskId,
};

const A: TaskId = TaskId::new(0);
const B: TaskId = TaskId::new(1);
const C: TaskId = TaskId::new(2);
const MUX: TaskId = TaskId::new(3);

#[test]
fn post_two_then_drain() {
    static PENDING: PendingFlag = PendingFlag::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);

    sched.post(A);
    assert!(PENDING.take());
    sched.post(B);
    assert!(!PENDING.take());

    let mut ran = Vec::new();
    sched.drain(|_, task| ran.push(task));

    assert_eq!(ran, [A, B]);
    assert!(!sched.are_tasklets_pending());
    assert!(!PENDING.is_raised());
}

#[test]
fn repost_during_run_goes_to_next_drain() {
    static PENDING: PendingFlag = PendingFlag::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);

    sched.post(A);
    assert!(PENDING.take());

    let mut ran = Vec::new();
    sched.drain(|sched, task| {
        ran.push(task);
        if task == A {
            sched.post(A);
            sched.post(C);
        }
    });
    assert_eq!(ran, [A]);
    assert!(PENDING.take());
    assert_eq!(sched.pending(), 2);

    ran.clear();
    sched.drain(|_, task| ran.push(task));
    assert_eq!(ran, [A, C]);
    assert!(!PENDING.take());
}

#[test]
fn self_reposting_task_does_not_starve_others() {
    static PENDING: PendingCounter = PendingCounter::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);

    sched.post(A);
    sched.post(B);

    let mut ran = Vec::new();
    for _ in 0..3 {
        sched.drain(|sched, task| {
            ran.push(task);
            if task == A {
                sched.post(A);
            }
        });
    }

    assert_eq!(ran, [A, B, A, A]);
    // first post plus one re-post per drain
    assert_eq!(PENDING.count(), 4);
    assert!(sched.is_posted(A));
}

thread_local! {
    static EVENTS: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
}

fn note(_: &mut dyn Defer<u32>, ctx: u32) {
    EVENTS.with(|e| e.borrow_mut().push(ctx));
}

fn note_and_follow_up(defer: &mut dyn Defer<u32>, ctx: u32) {
    note(defer, ctx);
    defer.post_callback(note, ctx * 10);
}

#[test]
fn multiplexer_drains_n_plus_one_in_one_pass() {
    static PENDING: PendingCounter = PendingCounter::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);
    let mut mux: CallbackTasklet<u32, FixedPool<u32, 8>> =
        CallbackTasklet::new(MUX, FixedPool::new());

    mux.post_callback(&mut sched, note, 1);
    mux.post_callback(&mut sched, note_and_follow_up, 2);
    mux.post_callback(&mut sched, note, 3);
    assert_eq!(sched.pending(), 1);
    assert_eq!(PENDING.count(), 1);

    let mut invoked = 0;
    sched.drain(|sched, task| {
        assert_eq!(task, mux.task());
        invoked = mux.run(sched);
    });

    assert_eq!(invoked, 4);
    assert_eq!(EVENTS.with(|e| e.borrow().clone()), [1, 2, 3, 20]);
    assert_eq!(mux.pending_callbacks(), 0);
    assert_eq!(mux.pool().available(), 8);

    // the follow-up re-posted the multiplexer, which was already unlinked
    assert!(sched.is_posted(MUX));
    assert_eq!(PENDING.count(), 2);

    let mut again = None;
    sched.drain(|sched, _| again = Some(mux.run(sched)));
    assert_eq!(again, Some(0));
    assert!(!sched.are_tasklets_pending());
}

#[test]
fn multiplexer_shares_the_queue_with_plain_tasklets() {
    static PENDING: PendingCounter = PendingCounter::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);
    let mut mux: CallbackTasklet<u32, FixedPool<u32, 4>> =
        CallbackTasklet::new(MUX, FixedPool::new());

    sched.post(A);
    mux.post_callback(&mut sched, note, 7);
    sched.post(B);
    mux.post_callback(&mut sched, note, 8);

    let mut order = Vec::new();
    sched.drain(|sched, task| {
        order.push(task);
        if task == MUX {
            mux.run(sched);
        }
    });

    assert_eq!(order, [A, MUX, B]);
    assert_eq!(EVENTS.with(|e| e.borrow().clone()), [7, 8]);
}

#[test]
fn exhausted_pool_does_not_post() {
    static PENDING: PendingCounter = PendingCounter::new();
    let mut sched: Scheduler<4> = Scheduler::new(&PENDING);
    let mut mux: CallbackTasklet<u32, FixedPool<u32, 2>> =
        CallbackTasklet::new(MUX, FixedPool::new());

    assert_eq!(mux.try_post_callback(&mut sched, note, 1), Ok(()));
    assert_eq!(mux.try_post_callback(&mut sched, note, 2), Ok(()));
    assert_eq!(
        mux.try_post_callback(&mut sched, note, 3),
        Err(PostError::NoBufs)
    );

    sched.drain(|sched, _| {
        mux.run(sched);
    });
    assert_eq!(EVENTS.with(|e| e.borrow().clone()), [1, 2]);

    // records came back to the pool
    assert_eq!(mux.try_post_callback(&mut sched, note, 4), Ok(()));
    assert_eq!(PENDING.count(), 2);
}
