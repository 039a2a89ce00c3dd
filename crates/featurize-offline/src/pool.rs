//! A fixed-size worker pool over a bounded job queue.
//!
//! Submission blocks while the queue is full, which is what bounds how far
//! the batch engine reads ahead of its workers. Panics inside jobs are caught
//! per job; the pool keeps running and the first panic is reported at
//! shutdown.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::{OfflineError, Result};
use crate::queue::BoundedQueue;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A pool of worker threads draining a bounded FIFO of jobs.
pub struct WorkerPool {
    queue: BoundedQueue<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    panics: Mutex<Vec<String>>,
}

impl WorkerPool {
    /// Spawns `num_threads` workers over a queue of `queue_capacity` jobs.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineError::SpawnFailed`] if the operating system refuses
    /// a thread; already-spawned workers are shut down before returning.
    pub fn new(num_threads: usize, queue_capacity: usize) -> Result<std::sync::Arc<Self>> {
        let pool = std::sync::Arc::new(Self {
            queue: BoundedQueue::new(queue_capacity),
            workers: Mutex::new(Vec::with_capacity(num_threads.max(1))),
            panics: Mutex::new(Vec::new()),
        });

        for i in 0..num_threads.max(1) {
            let pool2 = std::sync::Arc::clone(&pool);
            let spawned = thread::Builder::new()
                .name(format!("featurize-worker-{i}"))
                .spawn(move || pool2.run_worker());
            match spawned {
                Ok(handle) => pool.workers.lock().push(handle),
                Err(e) => {
                    let _ = pool.shutdown();
                    return Err(OfflineError::SpawnFailed {
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(pool)
    }

    fn run_worker(&self) {
        while let Some(job) = self.queue.pop() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                let message = panic_message(payload.as_ref());
                tracing::error!(message, "worker job panicked");
                self.panics.lock().push(message.to_string());
            }
        }
    }

    /// Submits a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineError::QueueClosed`] after [`shutdown`](Self::shutdown).
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(job))
    }

    /// Returns the number of jobs waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Lets queued jobs finish, then joins all workers.
    ///
    /// Idempotent. Returns the first worker panic observed over the pool's
    /// lifetime, if any.
    pub fn shutdown(&self) -> Result<()> {
        self.queue.close();
        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                // The worker loop catches job panics, so this is unexpected.
                tracing::error!("worker thread terminated abnormally");
            }
        }
        match self.panics.lock().first() {
            Some(message) => Err(OfflineError::WorkerPanic {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "opaque panic payload"
    }
}
