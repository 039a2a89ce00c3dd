//! Error types for the offline batch engine.

use thiserror::Error;

/// The main error type for featurize-offline operations.
#[derive(Debug, Error)]
pub enum OfflineError {
    /// Error when work is submitted to an engine that has been shut down.
    #[error("The work queue is closed")]
    QueueClosed,

    /// Error when a worker thread panicked while processing a batch.
    #[error("Worker thread panicked: {message}")]
    WorkerPanic {
        /// The panic payload, stringified.
        message: String,
    },

    /// Error when processing a record failed; carries the underlying cause.
    #[error("Batch processing failed: {source}")]
    Batch {
        /// The error raised by the caller's processing function.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error when the operating system refused to start a worker thread.
    #[error("Failed to spawn worker thread: {message}")]
    SpawnFailed {
        /// The underlying I/O error, stringified.
        message: String,
    },

    /// Error when a batch handle can no longer receive a result.
    #[error("Batch result lost; the worker was shut down before completion")]
    ResultLost,
}

impl OfflineError {
    /// Wraps a caller-side processing error.
    pub fn batch<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OfflineError::Batch {
            source: Box::new(source),
        }
    }
}

/// A specialized Result type for featurize-offline operations.
pub type Result<T> = std::result::Result<T, OfflineError>;
