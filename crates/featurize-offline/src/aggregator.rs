//! Unordered concurrent batch aggregation.
//!
//! Workers fold batches into one shared accumulator in whatever order they
//! finish. The accumulator and the merge function must tolerate concurrent
//! calls; [`LockedState`] is the ready-made mutex-guarded accumulator for
//! merge logic that is not otherwise synchronized.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::BatchConfig;
use crate::error::{OfflineError, Result};
use crate::pool::{panic_message, WorkerPool};

/// A mutex-guarded accumulator satisfying the aggregation thread contract.
#[derive(Debug, Default)]
pub struct LockedState<Z> {
    inner: Mutex<Z>,
}

impl<Z> LockedState<Z> {
    /// Wraps an initial accumulator value.
    pub fn new(value: Z) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with exclusive access to the accumulator.
    pub fn with<R>(&self, f: impl FnOnce(&mut Z) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Unwraps the accumulated value.
    pub fn into_inner(self) -> Z {
        self.inner.into_inner()
    }
}

/// Folds record streams into a shared accumulator on a worker pool.
pub struct BatchAggregator {
    config: BatchConfig,
}

impl BatchAggregator {
    /// Creates an aggregator with the given tunables.
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Consumes `inputs` in batches, merging each batch into `state`.
    ///
    /// The calling thread reads the input and blocks while the work queue is
    /// full. Batches are merged in completion order; `merge` must be safe to
    /// call from several workers at once (wrap unsynchronized state in
    /// [`LockedState`]).
    ///
    /// Waits for all submitted batches to drain, then returns the
    /// accumulator, or the first error observed. After a failure, remaining
    /// input is not read and queued batches are skipped.
    pub fn aggregate<X, Z, E, F, I>(&self, inputs: I, state: Arc<Z>, merge: F) -> Result<Arc<Z>>
    where
        I: IntoIterator<Item = X>,
        X: Send + 'static,
        Z: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&Z, Vec<X>) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        let pool = WorkerPool::new(self.config.num_threads(), self.config.queue_capacity())?;
        let batch_size = self.config.batch_size();
        let merge = Arc::new(merge);
        let first_error: Arc<Mutex<Option<OfflineError>>> = Arc::new(Mutex::new(None));

        let mut iter = inputs.into_iter();
        let mut batches = 0usize;
        loop {
            let batch: Vec<X> = iter.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            if first_error.lock().is_some() {
                tracing::warn!(batches, "aggregation failed; stopping input early");
                break;
            }

            let state2 = Arc::clone(&state);
            let merge2 = Arc::clone(&merge);
            let error2 = Arc::clone(&first_error);
            pool.execute(move || {
                if error2.lock().is_some() {
                    return;
                }
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| merge2(&state2, batch)));
                let failure = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(OfflineError::batch(e)),
                    Err(payload) => Some(OfflineError::WorkerPanic {
                        message: panic_message(payload.as_ref()).to_string(),
                    }),
                };
                if let Some(e) = failure {
                    let mut slot = error2.lock();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            })?;
            batches += 1;
        }

        let shutdown = pool.shutdown();
        if let Some(e) = first_error.lock().take() {
            return Err(e);
        }
        shutdown?;
        tracing::debug!(batches, "aggregation drained");
        Ok(state)
    }
}
