use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cits_core::pipeline::{mailbox, WorkerSet};

#[test]
fn no_worker_runs_before_release() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut workers = WorkerSet::new(3);
    for _ in 0..3 {
        let counter = Arc::clone(&released);
        workers
            .spawn("probe", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn failed");
    }
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(released.load(Ordering::SeqCst), 0);

    workers.release();
    workers.join();
    assert_eq!(released.load(Ordering::SeqCst), 3);
}

#[test]
fn mailbox_preserves_per_producer_order() {
    let (outbox, inbox) = mailbox();
    for i in 0..100 {
        outbox.send(i).expect("send failed");
    }
    let received: Vec<i32> = inbox.try_iter().take(100).collect();
    assert_eq!(received, (0..100).collect::<Vec<i32>>());
}

#[test]
fn send_never_blocks_without_a_consumer() {
    // Mailboxes are unbounded by design; back-pressure is a documented
    // non-goal of the stack, not an oversight to fix here.
    let (outbox, inbox) = mailbox();
    for i in 0..100_000 {
        outbox.send(i).expect("send failed");
    }
    drop(outbox);
    assert_eq!(inbox.iter().count(), 100_000);
}
