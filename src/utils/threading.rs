//! # Threading Configuration
//!
//! Configure rayon thread pools for the data-parallel phases.

use crate::error::{MosaixError, Result};

/// Create a configured thread pool.
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("mosaix-worker-{}", i))
        .build()
        .map_err(|e| MosaixError::config(format!("Failed to create thread pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_runs_tasks() {
        let pool = build_thread_pool(2).unwrap();
        let sum: usize = pool.install(|| {
            use rayon::prelude::*;
            (0..100usize).into_par_iter().sum()
        });
        assert_eq!(sum, 4950);
    }
}
