//! Bounded rayon pool shared by the digest and document phases.

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Build a pool with `threads` workers (at least one).
///
/// Returns `None` if the pool cannot be created, in which case callers fall
/// back to rayon's global pool.
#[must_use]
pub fn io_pool(threads: usize) -> Option<ThreadPool> {
    match ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("spdedup-io-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!(
                "Failed to create I/O thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            None
        }
    }
}

/// Run `op` inside `pool`, or on the calling thread's pool if there is none.
pub fn install<R, F>(pool: Option<&ThreadPool>, op: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
