//! Concurrent batch harness for offline featurize runs.
//!
//! Offline workloads such as training-data generation and evaluation
//! metrics stream millions of records through a vectorization pipeline.
//! This crate runs that work on a fixed pool of worker threads behind a
//! bounded queue, so a fast reader can never outrun the workers by more than
//! the configured capacity, in two modes:
//!
//! - **Ordered map mode** ([`BatchMapper`]): per-record results, delivered in
//!   input order. Use it when the output is written somewhere order matters,
//!   like a training file that must line up with its labels.
//! - **Unordered aggregate mode** ([`BatchAggregator`]): batches folded into
//!   one shared accumulator in completion order. Use it for commutative
//!   reductions like metric sums, where ordering would only cost throughput.
//!
//! # Example
//!
//! ```
//! use featurize_offline::config::BatchConfig;
//! use featurize_offline::mapper::BatchMapper;
//! use std::convert::Infallible;
//!
//! let mapper = BatchMapper::new(BatchConfig::new().with_num_threads(2));
//! let results = mapper.map(0..100i64, |x| Ok::<_, Infallible>(x + 1)).unwrap();
//!
//! let mut count = 0;
//! for batch in results {
//!     count += batch.unwrap().len();
//! }
//! assert_eq!(count, 100);
//! ```
//!
//! # Modules
//!
//! - [`config`]: parallelism and batching tunables.
//! - [`queue`]: the bounded blocking FIFO underneath everything.
//! - [`pool`]: the fixed-size worker pool.
//! - [`mapper`]: ordered map mode.
//! - [`aggregator`]: unordered aggregate mode.
//! - [`error`]: error types for the library.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod mapper;
pub mod pool;
pub mod queue;

// Re-export commonly used types at the crate root for convenience
pub use aggregator::{BatchAggregator, LockedState};
pub use config::BatchConfig;
pub use error::{OfflineError, Result};
pub use mapper::{BatchHandle, BatchMapper, MappedBatches};
pub use pool::WorkerPool;
pub use queue::BoundedQueue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_reexports() {
        let _config = BatchConfig::new();
        let _queue: BoundedQueue<i32> = BoundedQueue::new(1);
        let _state = LockedState::new(0i32);
        let _err: Result<()> = Ok(());
    }
}
