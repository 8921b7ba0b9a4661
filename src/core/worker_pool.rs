use crate::error::PoolError;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded executor for blocking work. Admission is FIFO; a submitted job runs to
/// completion and is never cancelled.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
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

    pub async fn submit<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        let output = tokio::task::spawn_blocking(move || {
            // The permit is moved into the worker and released when the job returns
            let _permit = permit;
            job()
        })
        .await?;
        Ok(output)
    }

    /// Waits for in-flight jobs, then refuses new ones.
    pub async fn shutdown(&self) {
        if let Ok(all) = self.permits.acquire_many(self.size as u32).await {
            all.forget();
        }
        self.permits.close();
        tracing::info!(workers = self.size, "worker pool drained");
    }
}

/// How blocking conversion work is scheduled relative to the request task.
#[derive(Clone, Debug)]
pub enum Dispatcher {
    /// Run on the calling task, blocking it for the job's duration.
    Inline,
    /// Offload to a bounded pool and await the result.
    Pool(WorkerPool),
}

impl Dispatcher {
    pub fn with_workers(workers: usize) -> Self {
        if workers == 0 {
            Dispatcher::Inline
        } else {
            Dispatcher::Pool(WorkerPool::new(workers))
        }
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match self {
            Dispatcher::Inline => Ok(job()),
            Dispatcher::Pool(pool) => pool.submit(job).await,
        }
    }

    pub async fn shutdown(&self) {
        if let Dispatcher::Pool(pool) = self {
            pool.shutdown().await;
        }
    }
}
