use std::{
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{Barrier, Semaphore},
    task::JoinHandle,
    time,
};
use tracing::trace;

/// Fixed-size pool for units of work submitted by a session.
///
/// Tasks run on the ambient tokio runtime; at most `workers` of them make
/// progress at once. Submission never waits.
#[derive(Clone, Debug)]
pub struct Scheduler {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl Scheduler {
    /// Startup parks two tasks at the rendezvous, so fewer slots would deadlock.
    pub const MIN_WORKERS: usize = 2;

    pub fn new(workers: usize) -> Self {
        let workers = workers.max(Self::MIN_WORKERS);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `work` once a worker slot is free.
    pub fn submit<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            // The semaphore is never closed, so this only fails if the pool is gone.
            let _permit = permits.acquire_owned().await.ok();
            work.await
        })
    }

    /// Calls `tick` every `period`, starting one period from now. Each call
    /// takes a worker slot only for its own duration.
    pub fn every<F>(&self, period: Duration, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                let _permit = permits.acquire().await.ok();
                trace!("Periodic task tick");
                tick();
            }
        })
    }
}

/// One-shot meeting point: every party waits in `arrive` until all have come.
#[derive(Clone, Debug)]
pub struct Rendezvous {
    barrier: Arc<Barrier>,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
        }
    }

    /// Returns `true` for exactly one party, the last to arrive.
    pub async fn arrive(&self) -> bool {
        self.barrier.wait().await.is_leader()
    }

    /// Runs `work`, then arrives. A panic in `work` is held until this party
    /// has arrived and is then resumed, so the others are never stranded.
    pub async fn arrive_after<T>(&self, work: impl FnOnce() -> T) -> T {
        let outcome = panic::catch_unwind(AssertUnwindSafe(work));
        self.arrive().await;
        outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pool_has_a_floor() {
        assert_eq!(Scheduler::new(0).workers(), Scheduler::MIN_WORKERS);
        assert_eq!(Scheduler::new(4).workers(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn submitted_work_respects_pool_size() {
        let scheduler = Scheduler::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..24)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                scheduler.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn rendezvous_releases_everyone_together() {
        let rendezvous = Rendezvous::new(3);
        let arrived = Arc::new(AtomicUsize::new(0));

        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let rendezvous = rendezvous.clone();
                let arrived = arrived.clone();
                tokio::spawn(async move {
                    arrived.fetch_add(1, Ordering::SeqCst);
                    let leader = rendezvous.arrive().await;
                    (leader, arrived.load(Ordering::SeqCst))
                })
            })
            .collect();

        tokio::task::yield_now().await;
        arrived.fetch_add(1, Ordering::SeqCst);
        let mut leaders = usize::from(rendezvous.arrive().await);

        for waiter in waiters {
            let (leader, seen) = waiter.await.unwrap();
            assert_eq!(seen, 3);
            leaders += usize::from(leader);
        }
        assert_eq!(leaders, 1);
    }

    #[tokio::test]
    async fn panicking_party_still_arrives() {
        let rendezvous = Rendezvous::new(2);
        let failing = {
            let rendezvous = rendezvous.clone();
            tokio::spawn(async move {
                rendezvous
                    .arrive_after(|| -> usize { panic!("work failed") })
                    .await
            })
        };

        let waited = time::timeout(Duration::from_secs(3), rendezvous.arrive()).await;
        assert!(waited.is_ok(), "the other party was stranded");
        assert!(failing.await.unwrap_err().is_panic());
    }

    #[tokio::test]
    async fn arrive_after_returns_the_work_result() {
        let rendezvous = Rendezvous::new(1);
        assert_eq!(rendezvous.arrive_after(|| 6 * 7).await, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_ticks_until_aborted() {
        let scheduler = Scheduler::new(2);
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = scheduler.every(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        handle.abort();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
