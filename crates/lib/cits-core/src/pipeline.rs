use std::io;
use std::sync::{Arc, Barrier};
use std::thread;
use std::thread::JoinHandle;

use log::debug;

/// Unbounded FIFO mailbox between adjacent layers. Sending never blocks the
/// producer; back-pressure is a non-goal of the emulated stack. Delivery is
/// in send order per producer, with no ordering across producers fanning
/// into the same inbox.
pub type Outbox<T> = std::sync::mpsc::Sender<T>;
pub type Inbox<T> = std::sync::mpsc::Receiver<T>;

pub fn mailbox<T>() -> (Outbox<T>, Inbox<T>) {
    std::sync::mpsc::channel()
}

/// Shared start gate for the worker stack. Every worker parks on it before
/// touching its mailboxes, and all of them wake exactly once when the
/// builder releases the gate after the last successful spawn. No message can
/// be produced before every consumer is listening.
#[derive(Clone)]
pub struct StartBarrier {
    inner: Arc<Barrier>,
}

impl StartBarrier {
    /// `waiters` counts the workers plus the releasing builder.
    pub fn new(waiters: usize) -> Self {
        Self {
            inner: Arc::new(Barrier::new(waiters)),
        }
    }

    pub fn wait(&self) {
        self.inner.wait();
    }
}

/// Spawns and tracks the named worker threads of one node. The stack is
/// all-or-nothing: a spawn failure is fatal to the node and no worker is
/// released past the start barrier.
pub struct WorkerSet {
    barrier: StartBarrier,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerSet {
    pub fn new(worker_count: usize) -> Self {
        Self {
            barrier: StartBarrier::new(worker_count + 1),
            handles: Vec::with_capacity(worker_count),
        }
    }

    /// Spawns a named worker. The worker body runs only after the barrier is
    /// released, so it must not assume the stack is live during setup.
    pub fn spawn<F>(&mut self, name: &str, work: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let barrier = self.barrier.clone();
        let thread_name = name.to_owned();
        let handle = thread::Builder::new().name(name.to_owned()).spawn(move || {
            barrier.wait();
            debug!("Worker {} released", thread_name);
            work();
        })?;
        self.handles.push(handle);
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Releases every spawned worker past the start barrier. Must be called
    /// exactly once, after all spawns succeeded.
    pub fn release(&self) {
        self.barrier.wait();
    }

    /// Joins all workers. Blocks until the stack winds down, which for a
    /// live node is until external termination.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
