//! Bounded worker pool and politeness pacing shared by the scanner and the
//! active ARP strategies

use rand::Rng;
use std::{net::Ipv4Addr, ops::Range, sync::Arc, thread, time::Duration};
use threadpool::ThreadPool;

/// Range of the random jitter, in milliseconds, added before every probe
pub const JITTER_MS: Range<u64> = 50..150;

/// Returns a random jitter duration within [`JITTER_MS`]
pub fn jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(JITTER_MS))
}

/// Sleeps for the configured delay followed by a random jitter so that
/// concurrent workers never fire in synchronized bursts
pub fn polite_pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    thread::sleep(jitter());
}

/// Number of workers for a pass: never more than there are targets and
/// never fewer than one
pub fn worker_count(concurrency: usize, total: usize) -> usize {
    concurrency.min(total).max(1)
}

/// Runs `job` once per target on a pool of at most `concurrency` threads and
/// blocks until every job has finished. A panicking job is logged and does
/// not affect the others.
pub fn for_each_bounded<F>(targets: &[Ipv4Addr], concurrency: usize, job: F)
where
    F: Fn(Ipv4Addr) + Send + Sync + 'static,
{
    if targets.is_empty() {
        return;
    }

    let pool = ThreadPool::new(worker_count(concurrency, targets.len()));
    let job = Arc::new(job);

    for &target in targets {
        let job = Arc::clone(&job);
        pool.execute(move || job(target));
    }

    pool.join();

    if pool.panic_count() > 0 {
        log::error!("{} worker(s) panicked during pass", pool.panic_count());
    }
}

#[cfg(test)]
#[path = "./pool_tests.rs"]
mod tests;
