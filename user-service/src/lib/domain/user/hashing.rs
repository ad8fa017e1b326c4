use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::user::errors::HashingError;

/// Bounded pool for CPU-heavy password work.
///
/// Argon2 deliberately burns CPU and memory, so hashing and verification run on the
/// blocking thread pool, with at most `size` jobs in flight at once.
#[derive(Debug, Clone)]
pub struct HashingPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl HashingPool {
    /// Create a pool allowing `size` concurrent jobs (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `work` on a blocking thread once a slot is free.
    ///
    /// The slot is held by the blocking job itself, so dropping the returned future
    /// does not free it while the job is still running.
    ///
    /// # Errors
    /// * `Closed` - The pool has been shut down
    /// * `WorkerFailed` - The job panicked or was cancelled
    pub async fn run<F, T>(&self, work: F) -> Result<T, HashingError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| HashingError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
            .map_err(|e| HashingError::WorkerFailed(e.to_string()))
    }
}
