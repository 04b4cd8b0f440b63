//! Task executors used for handler dispatch and response continuations.
//!
//! `schedule` must not run the task synchronously on the calling thread;
//! the explicit [`InlineExecutor`] is the one sanctioned exception.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Sender};
use tracing::error;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    fn schedule(&self, task: Task);
}

/// Runs tasks immediately in the calling thread. For tests and embedders
/// that manage their own threading.
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn schedule(&self, task: Task) {
        run_task(task);
    }
}

/// Fixed-size worker pool fed by an MPMC queue. Panicking tasks are caught
/// and logged; they never take a worker down. After `stop()` the queue is
/// gone and scheduled tasks are silently dropped.
pub struct ThreadPoolExecutor {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolExecutor {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = unbounded::<Task>();

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("hasten-worker-{index}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        run_task(task);
                    }
                })
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        ThreadPoolExecutor {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Stops accepting tasks and joins the workers. Queued tasks drain
    /// before the workers exit.
    pub fn stop(&self) {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        drop(sender);

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Executor for ThreadPoolExecutor {
    fn schedule(&self, task: Task) {
        if let Ok(slot) = self.sender.lock() {
            if let Some(sender) = slot.as_ref() {
                let _ = sender.send(task);
            }
            // Scheduled after stop: dropped on the floor.
        }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_task(task: Task) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!("executor task panicked");
    }
}

/// Pool sized to the machine, used when a context is not given one.
pub fn default_executor() -> Arc<ThreadPoolExecutor> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    Arc::new(ThreadPoolExecutor::new(workers))
}

#[cfg(test)]
#[path = "../tests/t_executor.rs"]
mod tests;
