// Concurrency management for Stackweave.
// Batch rendering runs on a dedicated rayon pool; a single render never spawns work.

use anyhow::Result;

/// Default worker count: half the cores, minimum 1.
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Build the pool used for batch rendering.
pub fn build_thread_pool(jobs: Option<usize>) -> Result<rayon::ThreadPool> {
    let workers = jobs.unwrap_or_else(default_workers).max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("stackweave-render-{}", i))
        .build()?;

    tracing::debug!(
        workers,
        cores = num_cpus::get(),
        "initialized render thread pool"
    );

    Ok(pool)
}
