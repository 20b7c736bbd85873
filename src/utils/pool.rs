//! Bounded rayon worker pools.

use crate::error::{DriftError, Result, TreeErrorKind};

/// Number of workers for a configured bound (0 = available parallelism).
#[must_use]
pub fn worker_count(max_workers: usize) -> usize {
    if max_workers == 0 {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    } else {
        max_workers
    }
}

/// Build a pool of at most `max_workers` threads named `{prefix}-{i}`.
pub fn worker_pool(max_workers: usize, prefix: &'static str) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(max_workers))
        .thread_name(move |i| format!("{prefix}-{i}"))
        .build()
        .map_err(|e| DriftError::tree("building worker pool", TreeErrorKind::WorkerPool(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = worker_pool(2, "test").unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
