//! Bounded fan-out over scoped threads.

use parking_lot::Mutex;
use std::thread;

/// Runs `work` over every job and returns the results in job order.
///
/// `parallelism == 0` spawns one thread per job. Otherwise at most
/// `parallelism` workers pull jobs from a shared queue.
pub(crate) fn run_bounded<J, R, F>(jobs: Vec<J>, parallelism: usize, work: F) -> Vec<R>
where
    J: Send,
    R: Send,
    F: Fn(J) -> R + Sync,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = if parallelism == 0 { total } else { parallelism.min(total) };
    let queue = Mutex::new(jobs.into_iter().enumerate());
    let results: Mutex<Vec<Option<R>>> = Mutex::new((0..total).map(|_| None).collect());

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let next = queue.lock().next();
                let Some((index, job)) = next else { break };
                let result = work(job);
                results.lock()[index] = Some(result);
            });
        }
    });

    results.into_inner().into_iter().flatten().collect()
}
