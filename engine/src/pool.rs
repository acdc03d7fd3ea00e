use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::DispatchError;

/// Bounded worker pool: one task per item, at most `limit` running at once.
///
/// A permit is acquired before each task is spawned, so no more than `limit`
/// tasks exist at any time. Results come back in input order; a task that
/// panicked yields `Err` with the panic message instead of taking the pool
/// down.
pub struct WorkerPool {
    limit: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Result<Self, DispatchError> {
        if limit == 0 {
            return Err(DispatchError::InvalidConcurrency(limit));
        }
        Ok(Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
        })
    }

    /// Returns the maximum concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `work(index, item)` for every item and wait for all of them.
    pub async fn run<T, F, Fut>(&self, items: Vec<T>, work: F) -> Vec<Result<Fut::Output, String>>
    where
        F: Fn(usize, T) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut handles = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    handles.push(Err(e.to_string()));
                    continue;
                }
            };
            let task = work(index, item);
            handles.push(Ok(tokio::spawn(async move {
                let _permit = permit;
                task.await
            })));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle {
                Ok(handle) => handle.await.map_err(panic_message),
                Err(e) => Err(e),
            });
        }
        results
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
