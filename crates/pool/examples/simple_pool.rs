//! Minimal unit pool walkthrough.
//!
//! Run with: `cargo run -p unit-pool --example simple_pool`

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use unit_pool::{Pool, PoolConfig, Unit, UnitError, UnitFactory};

/// A fake scratch buffer that remembers how long it was in use.
#[derive(Debug)]
struct ScratchBuffer {
    id: u32,
    bytes: Vec<u8>,
    started: Option<Instant>,
}

impl ScratchBuffer {
    fn fill(&mut self, byte: u8) {
        self.started = Some(Instant::now());
        self.bytes.fill(byte);
    }
}

impl Unit for ScratchBuffer {
    fn flush(&mut self) -> Result<(), UnitError> {
        self.bytes.fill(0);
        self.started = None;
        Ok(())
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started.map(|at| at.elapsed())
    }
}

#[derive(Default)]
struct ScratchFactory {
    next_id: AtomicU32,
}

impl UnitFactory for ScratchFactory {
    type Unit = ScratchBuffer;

    async fn create(&self) -> Result<ScratchBuffer, UnitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("  [factory] creating buffer #{id}");
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(ScratchBuffer {
            id,
            bytes: vec![0; 4096],
            started: None,
        })
    }

    async fn retire(&self, unit: ScratchBuffer) -> Result<(), UnitError> {
        println!("  [factory] retiring buffer #{}", unit.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unit_pool=debug".into()),
        )
        .init();

    let pool = Pool::builder("scratch", ScratchFactory::default())
        .config(PoolConfig {
            max_units: 3,
            acquire_timeout: Some(Duration::from_secs(1)),
            ..Default::default()
        })
        .build()?;

    println!("== warm-up ==");
    let created = pool.warm_up(2).await?;
    println!("warmed {created} buffers: {}", pool.stats());

    println!("\n== acquire and complete ==");
    {
        let mut lease = pool.wait().await?;
        println!("got buffer #{}", lease.id);
        lease.fill(0xAB);
    }
    println!("after release: {}", pool.stats());

    println!("\n== exhaust capacity ==");
    let held: Vec<_> = hold_all(&pool, 3).await?;
    match pool.try_acquire().await {
        Ok(_) => println!("unexpected: got a fourth buffer"),
        Err(e) => println!("try_acquire refused: {e}"),
    }

    println!("\n== a waiter is served by a release ==");
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.wait().await.map(|lease| lease.id) })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(held);
    println!("waiter got buffer #{}", waiter.await??);

    println!("\n== drain ==");
    pool.drain().await?;
    pool.log_information();
    println!("after drain: {}", pool.stats());

    Ok(())
}

async fn hold_all(
    pool: &Pool<ScratchFactory>,
    n: usize,
) -> Result<Vec<unit_pool::Lease<ScratchBuffer>>, unit_pool::Error> {
    let mut leases = Vec::with_capacity(n);
    for _ in 0..n {
        leases.push(pool.wait().await?);
    }
    Ok(leases)
}
