//! Concurrent stress test for the unit pool.
//!
//! 50 tasks mix blocking and non-blocking acquisitions. Every unit carries a
//! tag recording its current holder; a unit seen by two holders at once, or a
//! creation count above capacity, fails the test.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use unit_pool::{Pool, Unit, UnitError, UnitFactory};

const MAX_UNITS: usize = 6;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct TaggedUnit {
    id: u32,
    holder: Option<u64>,
}

impl Unit for TaggedUnit {
    fn flush(&mut self) -> Result<(), UnitError> {
        self.holder = None;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct TaggedFactory {
    created: Arc<AtomicU32>,
}

impl UnitFactory for TaggedFactory {
    type Unit = TaggedUnit;

    async fn create(&self) -> Result<TaggedUnit, UnitError> {
        let id = self.created.fetch_add(1, Ordering::SeqCst);
        // Simulate slow creation
        tokio::time::sleep(Duration::from_micros(200)).await;
        Ok(TaggedUnit { id, holder: None })
    }
}

// ---------------------------------------------------------------------------
// Test
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_50_tasks_never_share_a_unit() {
    let factory = TaggedFactory::default();
    let pool = Pool::new("stress", factory.clone(), MAX_UNITS).unwrap();
    pool.warm_up(2).await.unwrap();

    let in_use: Arc<Mutex<HashSet<u32>>> = Arc::default();
    let completed = Arc::new(AtomicU64::new(0));
    let mut set = JoinSet::new();

    for task in 0..50u64 {
        let pool = pool.clone();
        let in_use = Arc::clone(&in_use);
        let completed = Arc::clone(&completed);
        set.spawn(async move {
            for round in 0..20 {
                let mut lease = if round % 3 == 0 {
                    match pool.try_acquire().await {
                        Ok(lease) => lease,
                        Err(err) if err.is_capacity_reached() => pool.wait().await.unwrap(),
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                } else {
                    pool.wait().await.expect("task should acquire")
                };

                assert!(lease.holder.is_none(), "unit {} handed out while held", lease.id);
                assert!(
                    in_use.lock().insert(lease.id),
                    "unit {} owned by two callers",
                    lease.id
                );
                lease.holder = Some(task);

                tokio::time::sleep(Duration::from_micros(500)).await;

                assert_eq!(lease.holder, Some(task));
                in_use.lock().remove(&lease.id);
                drop(lease);
            }
            completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while let Some(result) = tokio::time::timeout_at(deadline, set.join_next())
        .await
        .expect("stress test should not deadlock (30s timeout)")
    {
        result.expect("task should not panic");
    }

    assert_eq!(completed.load(Ordering::SeqCst), 50);

    let stats = pool.stats();
    assert_eq!(stats.active, 0, "every unit is back");
    assert_eq!(stats.total_acquisitions, 1000);
    assert_eq!(stats.total_releases, stats.total_acquisitions);
    assert!(stats.total_created <= MAX_UNITS);
    assert_eq!(stats.idle, stats.total_created);
    assert!(factory.created.load(Ordering::SeqCst) as usize <= MAX_UNITS);

    pool.drain().await.unwrap();
    assert_eq!(pool.total_created(), 0);
}
