//! Tunables for the batch engine.

/// Parallelism and batching parameters.
///
/// Unset (or zero) fields resolve to defaults: worker threads = available
/// cores minus one (minimum 1), queue capacity = threads × 4, batch size 500.
///
/// # Examples
///
/// ```
/// use featurize_offline::config::BatchConfig;
///
/// let config = BatchConfig::new().with_num_threads(2);
/// assert_eq!(config.num_threads(), 2);
/// assert_eq!(config.queue_capacity(), 8);
/// assert_eq!(config.batch_size(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    num_threads: Option<usize>,
    queue_capacity: Option<usize>,
    batch_size: Option<usize>,
}

const DEFAULT_BATCH_SIZE: usize = 500;

impl BatchConfig {
    /// Creates a configuration resolving everything to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of worker threads; zero keeps the default.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = (num_threads > 0).then_some(num_threads);
        self
    }

    /// Overrides the work-queue capacity; zero keeps the default.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = (queue_capacity > 0).then_some(queue_capacity);
        self
    }

    /// Overrides the number of records per batch; zero keeps the default.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = (batch_size > 0).then_some(batch_size);
        self
    }

    /// The resolved worker-thread count.
    pub fn num_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1).max(1))
    }

    /// The resolved work-queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or_else(|| self.num_threads() * 4)
    }

    /// The resolved batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::new();
        assert!(config.num_threads() >= 1);
        assert_eq!(config.queue_capacity(), config.num_threads() * 4);
        assert_eq!(config.batch_size(), 500);
    }

    #[test]
    fn test_queue_capacity_tracks_thread_override() {
        let config = BatchConfig::new().with_num_threads(3);
        assert_eq!(config.queue_capacity(), 12);
    }

    #[test]
    fn test_zero_override_keeps_default() {
        let config = BatchConfig::new().with_batch_size(0).with_num_threads(0);
        assert_eq!(config.batch_size(), 500);
        assert!(config.num_threads() >= 1);
    }

    #[test]
    fn test_explicit_overrides() {
        let config = BatchConfig::new()
            .with_num_threads(2)
            .with_queue_capacity(5)
            .with_batch_size(10);
        assert_eq!(config.num_threads(), 2);
        assert_eq!(config.queue_capacity(), 5);
        assert_eq!(config.batch_size(), 10);
    }
}
