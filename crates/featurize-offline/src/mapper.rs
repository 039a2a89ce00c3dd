//! Ordered concurrent batch mapping.
//!
//! Records are read from the input in arrival order, partitioned into
//! batches, and mapped on a worker pool. Results come back one handle per
//! batch, in submission order, regardless of which worker finishes first.
//! Reading ahead of the consumer is bounded by the job and handle queues, so
//! an input much larger than memory can be streamed through.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::BatchConfig;
use crate::error::{OfflineError, Result};
use crate::pool::{panic_message, WorkerPool};
use crate::queue::BoundedQueue;

/// The pending result of one batch.
pub struct BatchHandle<Y> {
    rx: Receiver<Result<Vec<Y>>>,
}

impl<Y> BatchHandle<Y> {
    /// Blocks until the batch completes and returns its mapped records.
    ///
    /// A failed record fails its whole batch; the first failure is returned.
    pub fn wait(self) -> Result<Vec<Y>> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(OfflineError::ResultLost),
        }
    }
}

/// Maps record streams over a worker pool, preserving input order.
pub struct BatchMapper {
    config: BatchConfig,
}

impl BatchMapper {
    /// Creates a mapper with the given tunables.
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Starts mapping `inputs` through `f` and returns the result stream.
    ///
    /// A loader thread consumes the input iterator; it blocks once the
    /// configured queues are full, which caps how many batches exist at once.
    /// Iterating over the returned [`MappedBatches`] yields one
    /// `Result<Vec<Y>>` per input batch, in submission order.
    pub fn map<X, Y, E, F, I>(&self, inputs: I, f: F) -> Result<MappedBatches<Y>>
    where
        I: IntoIterator<Item = X>,
        I::IntoIter: Send + 'static,
        X: Send + 'static,
        Y: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&X) -> std::result::Result<Y, E> + Send + Sync + 'static,
    {
        let pool = WorkerPool::new(self.config.num_threads(), self.config.queue_capacity())?;
        let handles: BoundedQueue<BatchHandle<Y>> =
            BoundedQueue::new(self.config.queue_capacity());
        let batch_size = self.config.batch_size();
        let f = Arc::new(f);
        // Only the iterator crosses into the loader thread, so `I` itself
        // does not need to be `Send`.
        let mut iter = inputs.into_iter();

        let pool2 = Arc::clone(&pool);
        let handles2 = handles.clone();
        let loader = thread::Builder::new()
            .name("featurize-loader".to_string())
            .spawn(move || {
                let mut batches = 0usize;
                loop {
                    let batch: Vec<X> = iter.by_ref().take(batch_size).collect();
                    if batch.is_empty() {
                        break;
                    }
                    let (tx, rx) = mpsc::channel();
                    let f2 = Arc::clone(&f);
                    let submitted = pool2.execute(move || {
                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| map_batch(&*f2, &batch)));
                        let result = match outcome {
                            Ok(result) => result,
                            Err(payload) => Err(OfflineError::WorkerPanic {
                                message: panic_message(payload.as_ref()).to_string(),
                            }),
                        };
                        // The receiver may have been dropped by an early exit.
                        let _ = tx.send(result);
                    });
                    if submitted.is_err() || handles2.push(BatchHandle { rx }).is_err() {
                        // Consumer went away; stop reading input.
                        break;
                    }
                    batches += 1;
                }
                handles2.close();
                tracing::debug!(batches, "input stream fully submitted");
            })
            .map_err(|e| OfflineError::SpawnFailed {
                message: e.to_string(),
            })?;

        Ok(MappedBatches {
            handles,
            pool,
            loader: Some(loader),
            finished: false,
        })
    }
}

fn map_batch<X, Y, E, F>(f: &F, batch: &[X]) -> Result<Vec<Y>>
where
    E: std::error::Error + Send + Sync + 'static,
    F: Fn(&X) -> std::result::Result<Y, E>,
{
    let mut out = Vec::with_capacity(batch.len());
    for record in batch {
        out.push(f(record).map_err(OfflineError::batch)?);
    }
    Ok(out)
}

/// The result stream of a [`BatchMapper::map`] run.
///
/// Yields batch results in submission order. Dropping it early stops the
/// loader and drains the pool.
pub struct MappedBatches<Y> {
    handles: BoundedQueue<BatchHandle<Y>>,
    pool: Arc<WorkerPool>,
    loader: Option<JoinHandle<()>>,
    finished: bool,
}

impl<Y> MappedBatches<Y> {
    fn finish(&mut self) -> Result<()> {
        self.handles.close();
        // Drop any unconsumed handles so blocked workers' sends fall through.
        while self.handles.try_pop().is_some() {}
        if let Some(loader) = self.loader.take() {
            if loader.join().is_err() {
                tracing::error!("loader thread terminated abnormally");
            }
        }
        self.pool.shutdown()
    }
}

impl<Y> Iterator for MappedBatches<Y> {
    type Item = Result<Vec<Y>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.handles.pop() {
            Some(handle) => Some(handle.wait()),
            None => {
                self.finished = true;
                match self.finish() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
        }
    }
}

impl<Y> Drop for MappedBatches<Y> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            let _ = self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("bad record: {0}")]
    struct BadRecord(i64);

    fn mapper(threads: usize, batch: usize) -> BatchMapper {
        BatchMapper::new(
            BatchConfig::new()
                .with_num_threads(threads)
                .with_batch_size(batch),
        )
    }

    #[test]
    fn test_results_in_submission_order() {
        let results = mapper(4, 7)
            .map(0..1000i64, |x| Ok::<_, Infallible>(x * x))
            .unwrap();

        let mut flat = Vec::new();
        for batch in results {
            flat.extend(batch.unwrap());
        }
        let expected: Vec<i64> = (0..1000).map(|x| x * x).collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_record_error_fails_its_batch_only() {
        let results: Vec<_> = mapper(2, 2)
            .map(0..6i64, |&x| if x == 3 { Err(BadRecord(x)) } else { Ok(x) })
            .unwrap()
            .collect();

        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), vec![0, 1]);
        assert!(matches!(results[1], Err(OfflineError::Batch { .. })));
        assert_eq!(*results[2].as_ref().unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_panic_rides_the_handle() {
        let results: Vec<_> = mapper(1, 1)
            .map(0..2i64, |&x| {
                if x == 0 {
                    panic!("mapper exploded");
                }
                Ok::<_, Infallible>(x)
            })
            .unwrap()
            .collect();

        assert!(
            matches!(&results[0], Err(OfflineError::WorkerPanic { message }) if message == "mapper exploded")
        );
        assert_eq!(*results[1].as_ref().unwrap(), vec![1]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let results: Vec<_> = mapper(2, 10)
            .map(std::iter::empty::<i64>(), |&x| Ok::<_, Infallible>(x))
            .unwrap()
            .collect();
        assert!(results.is_empty());
    }

    #[test]
    fn test_early_drop_stops_cleanly() {
        let mut results = mapper(2, 1)
            .map(0..10_000i64, |&x| Ok::<_, Infallible>(x))
            .unwrap();
        let first = results.next().unwrap().unwrap();
        assert_eq!(first, vec![0]);
        drop(results);
    }
}
