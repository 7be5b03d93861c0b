//! Factory failure handling tests.
//!
//! Verifies that when `UnitFactory::create()` returns `Err`, the pool stays
//! consistent: the creation counter is not incremented, capacity permits are
//! not leaked, and subsequent acquisitions work normally.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use unit_pool::{Error, Pool, Unit, UnitError, UnitErrorKind, UnitFactory};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    id: u32,
}

impl Unit for Slot {
    fn flush(&mut self) -> Result<(), UnitError> {
        Ok(())
    }
}

/// Factory whose N-th call (0-indexed) fails when bit N of `fail_mask` is set.
#[derive(Clone)]
struct MaskedFactory {
    fail_mask: u32,
    calls: Arc<AtomicU32>,
}

impl MaskedFactory {
    fn new(fail_mask: u32) -> Self {
        Self {
            fail_mask,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl UnitFactory for MaskedFactory {
    type Unit = Slot;

    async fn create(&self) -> Result<Slot, UnitError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mask & (1 << n) != 0 {
            return Err(UnitError::new(
                UnitErrorKind::Device,
                format!("intentional failure on call {n}"),
            ));
        }
        Ok(Slot { id: n })
    }
}

/// Factory that never finishes creating.
struct StuckFactory;

impl UnitFactory for StuckFactory {
    type Unit = Slot;

    async fn create(&self) -> Result<Slot, UnitError> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creation_error_leaves_counter_untouched() {
    // second creation fails
    let pool = Pool::new("slots", MaskedFactory::new(0b10), 5).unwrap();

    let _first = pool.try_acquire().await.unwrap();
    let before = pool.total_created();

    let err = pool.try_acquire().await.unwrap_err();
    assert!(
        matches!(&err, Error::Creation { source, .. } if source.kind == UnitErrorKind::Device),
        "expected Creation, got {err:?}"
    );
    assert!(!err.is_capacity_reached());
    assert_eq!(pool.total_created(), before);

    let stats = pool.stats();
    assert_eq!(stats.active, 1);
    assert_eq!(stats.creation_failures, 1);
}

#[tokio::test]
async fn creation_failure_is_not_reported_as_capacity() {
    // every call fails, capacity is untouched
    let pool = Pool::new("slots", MaskedFactory::new(u32::MAX), 1).unwrap();
    for _ in 0..3 {
        assert!(matches!(
            pool.try_acquire().await.unwrap_err(),
            Error::Creation { .. }
        ));
    }
    assert_eq!(pool.total_created(), 0);
    assert_eq!(pool.stats().capacity_rejections, 0);
}

#[tokio::test]
async fn intermittent_create_failure_recovery() {
    // Fail on calls 0, 1, 2, succeed from call 3 onwards
    let pool = Pool::new("slots", MaskedFactory::new(0b0111), 2).unwrap();

    for i in 0..3 {
        assert!(pool.wait().await.is_err(), "wait {i} should fail");
    }
    assert_eq!(pool.stats().active, 0);

    let a = pool.wait().await.expect("pool should recover");
    assert_eq!(a.id, 3);
    let b = pool.wait().await.expect("second unit should be created");
    assert_eq!(b.id, 4);

    let stats = pool.stats();
    assert_eq!(stats.active, 2);
    assert_eq!(stats.total_created, 2);
    assert_eq!(stats.creation_failures, 3);
}

#[tokio::test]
async fn partial_warm_up_is_retained() {
    // third creation fails
    let pool = Pool::new("slots", MaskedFactory::new(0b100), 5).unwrap();

    let err = pool.warm_up(4).await.unwrap_err();
    assert!(matches!(err, Error::Creation { .. }));

    let stats = pool.stats();
    assert_eq!(stats.idle, 2, "units created before the failure stay idle");
    assert_eq!(stats.total_created, 2);

    let lease = pool.try_acquire().await.unwrap();
    assert_eq!(lease.id, 0);
}

#[tokio::test]
async fn cancelled_creation_releases_reservation() {
    let pool = Pool::new("slots", StuckFactory, 1).unwrap();

    let attempt = tokio::time::timeout(Duration::from_millis(20), pool.try_acquire()).await;
    assert!(attempt.is_err(), "creation never completes");

    let stats = pool.stats();
    assert_eq!(stats.total_created, 0);
    assert_eq!(stats.active, 0);

    // capacity came back: a warm-up may still start a creation
    let attempt = tokio::time::timeout(Duration::from_millis(20), pool.warm_up(1)).await;
    assert!(attempt.is_err());
    assert_eq!(pool.total_created(), 0);
}
