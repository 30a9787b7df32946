//! Worker pool construction.

use ned_common::{Error, Result};
use rayon::ThreadPool;

/// Build a rayon pool with `workers` threads (`None` = logical CPUs).
pub fn build_pool(workers: Option<usize>, name: &'static str) -> Result<ThreadPool> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(move |idx| format!("ned-{}-{}", name, idx));
    if let Some(workers) = workers {
        builder = builder.num_threads(workers);
    }
    builder
        .build()
        .map_err(|e| Error::WorkerPool(format!("failed to build {} pool: {}", name, e)))
}
