//! Bounded background worker pool.
//!
//! Cache refresh and score enrichment run off the request path as jobs
//! submitted here. The pool is bounded so a burst of calendar requests
//! cannot fan out unbounded detached tasks, and job failures go to an error
//! channel that is logged rather than surfaced to any caller.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config;

type Job = (
    String,
    Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>,
);

#[derive(Clone)]
pub struct BackgroundPool {
    tx: mpsc::Sender<Job>,
}

impl BackgroundPool {
    /// Spawn `workers` worker tasks plus one error-channel drainer.
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(queue_depth);
        let (err_tx, mut err_rx) = mpsc::channel::<(String, anyhow::Error)>(queue_depth);

        // Error channel: observable failures, decoupled from the request path.
        tokio::spawn(async move {
            while let Some((label, err)) = err_rx.recv().await {
                error!(job = %label, error = %err, "background job failed");
            }
        });

        let rx = std::sync::Arc::new(tokio::sync::Mutex::new(rx));
        for worker in 0..workers.max(1) {
            let rx = rx.clone();
            let err_tx = err_tx.clone();
            tokio::spawn(async move {
                loop {
                    let job = rx.lock().await.recv().await;
                    let Some((label, fut)) = job else { break };
                    debug!(worker, job = %label, "background job start");
                    if let Err(e) = fut.await {
                        let _ = err_tx.send((label, e)).await;
                    }
                }
            });
        }

        Self { tx }
    }

    pub fn with_defaults() -> Self {
        Self::new(config::BACKGROUND_WORKERS, config::BACKGROUND_QUEUE_DEPTH)
    }

    /// Submit a job. A full queue drops the submission with a warning:
    /// every job here is idempotently recomputable, so dropping one only
    /// delays a refresh.
    pub fn submit<F>(&self, label: &str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let job: Job = (label.to_string(), Box::pin(fut));
        if let Err(e) = self.tx.try_send(job) {
            warn!(job = %label, "background queue full, dropping job: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_to_completion() {
        let pool = BackgroundPool::new(2, 8);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            pool.submit("bump", async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_failing_job_does_not_kill_workers() {
        let pool = BackgroundPool::new(1, 8);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit("boom", async { anyhow::bail!("deliberate failure") });
        let c = counter.clone();
        pool.submit("after", async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
