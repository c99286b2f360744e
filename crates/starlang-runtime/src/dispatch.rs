//! Asynchronous signal dispatch.
//!
//! Signals are never handled on the sender's stack. [`Dispatcher::enqueue`]
//! appends to a single per-node FIFO and, if no drain is running, spawns one.
//! The drain handles up to `batch` signals, yields to the scheduler, and
//! repeats until the queue is empty. Two signals enqueued in order for the
//! same target are handled in that order.

use crate::context::Context;
use crate::signal::Signal;
use parking_lot::Mutex;
use starlang_core::Pid;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A signal waiting to be handled.
pub(crate) struct Dispatch {
    pub(crate) target: Context,
    pub(crate) from: Pid,
    pub(crate) signal: Signal,
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Dispatch>,
    draining: bool,
}

pub(crate) struct Dispatcher {
    queue: Mutex<Queue>,
    batch: usize,
}

impl Dispatcher {
    pub(crate) fn new(batch: usize) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(Queue::default()),
            batch: batch.max(1),
        })
    }

    /// Queues a signal, starting a drain task if none is running.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn enqueue(self: &Arc<Self>, dispatch: Dispatch) {
        let start = {
            let mut queue = self.queue.lock();
            queue.pending.push_back(dispatch);
            !std::mem::replace(&mut queue.draining, true)
        };
        if start {
            tokio::spawn(self.clone().drain());
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let batch: Vec<Dispatch> = {
                let mut queue = self.queue.lock();
                if queue.pending.is_empty() {
                    queue.draining = false;
                    return;
                }
                let take = queue.pending.len().min(self.batch);
                queue.pending.drain(..take).collect()
            };

            for Dispatch {
                target,
                from,
                signal,
            } in batch
            {
                let kind = signal.kind();
                let handled = catch_unwind(AssertUnwindSafe(|| target.handle_signal(from, signal)));
                if handled.is_err() {
                    tracing::warn!(
                        %from,
                        to = %target.pid(),
                        kind,
                        "signal handler panicked"
                    );
                }
            }

            tokio::task::yield_now().await;
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("Dispatcher")
            .field("pending", &queue.pending.len())
            .field("draining", &queue.draining)
            .field("batch", &self.batch)
            .finish()
    }
}
