use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::core::{HandlerResult, Middleware, Next};
use crate::context::Context;

/// Per-route counters.
#[derive(Debug, Default)]
pub struct RouteStats {
    requests: AtomicUsize,
    errors: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl RouteStats {
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Responses with status >= 500 plus chains that returned `Err`.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.requests() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

/// Middleware for collecting request metrics
///
/// Tracks a global request count and latency plus per-route counts keyed by
/// the matched pattern (`/users/:id`, not `/users/42`) so cardinality stays
/// bounded by the routing table. All counters are atomics; the per-route map
/// is a `DashMap`, so one instance can be shared by every route and worker.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    per_route: DashMap<Arc<str>, Arc<RouteStats>>,
    stack_size: AtomicUsize,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Counters for one route pattern, if it has served a request.
    #[must_use]
    pub fn route_stats(&self, pattern: &str) -> Option<Arc<RouteStats>> {
        self.per_route.get(pattern).map(|s| Arc::clone(s.value()))
    }

    /// Request count per route pattern, sorted by pattern.
    #[must_use]
    pub fn route_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .per_route
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().requests()))
            .collect();
        counts.sort();
        counts
    }

    /// Coroutine stack size observed on the last request (0 outside a coroutine).
    #[must_use]
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    fn stats_for(&self, pattern: &str) -> Arc<RouteStats> {
        if let Some(stats) = self.per_route.get(pattern) {
            return Arc::clone(stats.value());
        }
        Arc::clone(self.per_route.entry(Arc::from(pattern)).or_default().value())
    }
}

impl Middleware for MetricsMiddleware {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let stats = self.stats_for(ctx.route_pattern().unwrap_or("<unmatched>"));
        stats.requests.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let result = next.run(ctx);
        let latency_ns = start.elapsed().as_nanos() as u64;

        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        stats.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        let failed = match &result {
            Ok(res) => res.status >= 500,
            Err(_) => true,
        };
        if failed {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }

        if may::coroutine::is_coroutine() {
            self.stack_size
                .store(may::coroutine::current().stack_size(), Ordering::Relaxed);
        }

        result
    }
}
