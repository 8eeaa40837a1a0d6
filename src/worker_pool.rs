//! # Worker Pool Module
//!
//! Runs N worker coroutines, each owning its own [`App`].
//!
//! Every worker calls the same factory, so every worker replays the same
//! registration calls and ends up with a separate routing trie. Workers share
//! nothing mutable; the only shared state is the request queue and counters.
//!
//! ## Features
//!
//! - **Per-worker tables**: no locks on the matching path
//! - **Unbounded Queue**: may's MPSC channel, shared by all workers
//! - **Load Balancing**: whichever worker is idle takes the next request
//! - **Panic Containment**: a panic that escapes the chain becomes a 500 and
//!   the worker keeps serving
//! - **Metrics**: dispatched, completed and in-flight counts
//!
//! ## Configuration
//!
//! Worker count and stack size come from [`AppConfig`] (`SWITCHYARD_WORKERS`,
//! `SWITCHYARD_STACK_SIZE`).

use crate::config::AppConfig;
use crate::dispatcher::{App, HandlerRequest, HandlerResponse};
use anyhow::{Context as _, Result};
use may::sync::mpsc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Metrics for a worker pool
#[derive(Debug, Default)]
pub struct WorkerPoolMetrics {
    /// Current queue depth plus in-flight requests (approximate)
    queue_depth: AtomicUsize,
    /// Total requests dispatched
    dispatched_count: AtomicU64,
    /// Total requests completed
    completed_count: AtomicU64,
    /// Panics caught at the worker boundary
    panic_count: AtomicU64,
}

impl WorkerPoolMetrics {
    fn record_dispatch(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    fn record_completion(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }
}

/// A queued request with its reply channel.
struct Job {
    request: HandlerRequest,
    reply: mpsc::Sender<HandlerResponse>,
}

/// A pool of coroutines serving requests against per-worker [`App`]s.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    metrics: Arc<WorkerPoolMetrics>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `config.workers` coroutines, each serving its own `factory()` result.
    ///
    /// The factory is called once on the calling thread first so registration
    /// errors (bad patterns) surface here instead of inside a coroutine.
    pub fn spawn<F>(config: &AppConfig, factory: F) -> Result<Self>
    where
        F: Fn() -> Result<App> + Send + Sync + 'static,
    {
        let first = factory().context("route table factory failed")?;
        let routes_count = first.router().routes().len();
        drop(first);

        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(rx);
        let factory = Arc::new(factory);
        let metrics = Arc::new(WorkerPoolMetrics::default());

        info!(
            num_workers = workers,
            stack_size = config.stack_size,
            routes_count,
            "Creating worker pool"
        );

        for worker_id in 0..workers {
            let rx = Arc::clone(&rx);
            let factory = Arc::clone(&factory);
            let metrics = Arc::clone(&metrics);

            // SAFETY: may::coroutine::Builder::spawn() is unsafe because the
            // coroutine must not rely on thread-local storage across yields.
            // The closure owns everything it uses (Arcs and the per-worker App)
            // and only talks to other coroutines through may channels.
            #[allow(unsafe_code)]
            let spawn_result = unsafe {
                may::coroutine::Builder::new()
                    .name(format!("switchyard-worker-{worker_id}"))
                    .stack_size(config.stack_size)
                    .spawn(move || run_worker(worker_id, &rx, factory.as_ref(), &metrics))
            };

            if let Err(e) = spawn_result {
                error!(
                    worker_id = worker_id,
                    error = %e,
                    "Failed to spawn worker coroutine"
                );
            }
        }

        Ok(Self {
            sender: tx,
            metrics,
            workers,
        })
    }

    /// Send a request to the pool and wait for its response.
    ///
    /// Returns 503 if the workers are gone.
    pub fn dispatch(&self, request: HandlerRequest) -> HandlerResponse {
        let request_id = request.request_id;
        let (reply_tx, reply_rx) = mpsc::channel();

        self.metrics.record_dispatch();
        if let Err(e) = self.sender.send(Job {
            request,
            reply: reply_tx,
        }) {
            self.metrics.record_completion();
            error!(
                request_id = %request_id,
                error = %e,
                "Worker pool channel disconnected"
            );
            return HandlerResponse::error(503, "Workers are not responding");
        }

        match reply_rx.recv() {
            Ok(response) => response,
            Err(e) => {
                error!(
                    request_id = %request_id,
                    error = %e,
                    "Worker dropped reply channel"
                );
                HandlerResponse::error(503, "Workers are not responding")
            }
        }
    }

    /// Get metrics for this worker pool
    #[must_use]
    pub fn metrics(&self) -> &Arc<WorkerPoolMetrics> {
        &self.metrics
    }

    /// Number of worker coroutines.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }
}

fn run_worker<F>(
    worker_id: usize,
    rx: &mpsc::Receiver<Job>,
    factory: &F,
    metrics: &WorkerPoolMetrics,
) where
    F: Fn() -> Result<App>,
{
    let app = match factory() {
        Ok(app) => app,
        Err(e) => {
            error!(
                worker_id = worker_id,
                error = ?e,
                "Worker failed to build its route table - exiting"
            );
            return;
        }
    };
    debug!(worker_id = worker_id, "Worker coroutine started");

    // All workers share one receiver, so idle workers pick up the next job.
    while let Ok(Job { request, reply }) = rx.recv() {
        let request_id = request.request_id;
        debug!(
            request_id = %request_id,
            worker_id = worker_id,
            "Worker processing request"
        );

        let response = match catch_unwind(AssertUnwindSafe(|| app.handle(request))) {
            Ok(response) => response,
            Err(panic) => {
                metrics.panic_count.fetch_add(1, Ordering::Relaxed);
                error!(
                    request_id = %request_id,
                    worker_id = worker_id,
                    panic_message = ?panic,
                    "Handler panicked - CRITICAL"
                );
                HandlerResponse::error(500, "Internal Server Error")
            }
        };

        metrics.record_completion();
        if reply.send(response).is_err() {
            debug!(
                request_id = %request_id,
                worker_id = worker_id,
                "Caller went away before the response was ready"
            );
        }
    }

    debug!(worker_id = worker_id, "Worker coroutine exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_metrics() {
        let metrics = WorkerPoolMetrics::default();
        assert_eq!(metrics.queue_depth(), 0);
        assert_eq!(metrics.dispatched_count(), 0);

        metrics.record_dispatch();
        assert_eq!(metrics.dispatched_count(), 1);
        assert_eq!(metrics.queue_depth(), 1);

        metrics.record_completion();
        assert_eq!(metrics.completed_count(), 1);
        assert_eq!(metrics.queue_depth(), 0);
    }
}
