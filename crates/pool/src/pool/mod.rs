//! Bounded unit pool.
//!
//! `Pool<F>` hands out units produced by a [`UnitFactory`]. An idle unit is
//! always reused first; a new one is created only while fewer than
//! `max_units` exist. When every unit is held by a caller, [`Pool::try_acquire`]
//! reports [`Error::CapacityReached`] and [`Pool::wait`] suspends until a unit
//! comes back.
//!
//! Capacity is a semaphore with one permit per unit that may still be handed
//! out. A caller holding a permit either finds an idle unit or is guaranteed
//! room to create one, so `total_created` can never pass `max_units`.

pub mod config;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::completion::{CompletionSink, settle};
use crate::error::{Error, Result};
use crate::guard::Lease;
use crate::logger::{LogCategory, PoolLogger, default_logger};
use crate::registry::{Registration, Registry, validate_name};
use crate::unit::UnitFactory;

pub use config::{DiagnosticLevel, PoolConfig};

/// Pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Capacity ceiling.
    pub max_units: usize,
    /// Units currently in existence (idle + active).
    pub total_created: usize,
    /// Units sitting in the idle set.
    pub idle: usize,
    /// Units currently held by callers.
    pub active: usize,
    /// Total successful acquisitions.
    pub total_acquisitions: u64,
    /// Total units returned through the completion hook.
    pub total_releases: u64,
    /// Units permanently retired by drains.
    pub retired: u64,
    /// Factory calls that failed.
    pub creation_failures: u64,
    /// Non-blocking acquisitions that found the pool saturated.
    pub capacity_rejections: u64,
    /// Returning units whose flush failed.
    pub flush_failures: u64,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} units ({} idle, {} active); acquisitions={} releases={} retired={} \
             creation_failures={} capacity_rejections={} flush_failures={}",
            self.total_created,
            self.max_units,
            self.idle,
            self.active,
            self.total_acquisitions,
            self.total_releases,
            self.retired,
            self.creation_failures,
            self.capacity_rejections,
            self.flush_failures,
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquisitions: u64,
    releases: u64,
    retired: u64,
    creation_failures: u64,
    capacity_rejections: u64,
    flush_failures: u64,
}

/// Everything guarded by the pool lock.
struct State<U> {
    idle: VecDeque<U>,
    /// Always `idle.len() + outstanding`.
    total_created: usize,
    outstanding: usize,
    /// Factory calls in flight; each holds a capacity permit.
    creating: usize,
    counters: Counters,
}

/// Claim on one in-flight factory call. Released on drop unless committed.
struct Reservation<'a, U> {
    state: &'a Mutex<State<U>>,
    armed: bool,
}

impl<'a, U> Reservation<'a, U> {
    /// Take over a `creating` slot the caller already counted.
    fn adopt(state: &'a Mutex<State<U>>) -> Self {
        Self { state, armed: true }
    }

    fn commit(mut self, apply: impl FnOnce(&mut State<U>)) {
        self.armed = false;
        let mut state = self.state.lock();
        state.creating -= 1;
        state.total_created += 1;
        apply(&mut state);
    }
}

impl<U> Drop for Reservation<'_, U> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock();
            state.creating -= 1;
        }
    }
}

/// Inner shared state for the pool.
struct PoolInner<F: UnitFactory> {
    name: String,
    factory: F,
    config: PoolConfig,
    logger: Arc<dyn PoolLogger>,
    state: Mutex<State<F::Unit>>,
    /// `max_units` minus units handed out, minus acquisitions in progress.
    slots: Semaphore,
    _registration: Option<Registration>,
}

impl<F: UnitFactory> PoolInner<F> {
    fn complete(&self, mut unit: F::Unit) {
        let flush_error = settle(
            &self.name,
            &mut unit,
            self.logger.as_ref(),
            self.config.diagnostics,
        );

        let stray = {
            let mut state = self.state.lock();
            if flush_error.is_some() {
                state.counters.flush_failures += 1;
            }
            if state.outstanding == 0 {
                Some(unit)
            } else {
                state.outstanding -= 1;
                state.counters.releases += 1;
                state.idle.push_back(unit);
                None
            }
        };

        match stray {
            // Idle push happens before the permit so the next holder finds it.
            None => self.slots.add_permits(1),
            Some(unit) => {
                self.logger.log_text(
                    LogCategory::Lifecycle,
                    &format!(
                        "{}: completion for a unit this pool did not hand out, dropping it",
                        self.name
                    ),
                );
                drop(unit);
            }
        }
    }
}

impl<F: UnitFactory> CompletionSink<F::Unit> for PoolInner<F> {
    fn on_complete(&self, unit: F::Unit) {
        self.complete(unit);
    }
}

impl<F: UnitFactory> Drop for PoolInner<F> {
    fn drop(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            pool = %self.name,
            idle = self.state.get_mut().idle.len(),
            "Pool dropped"
        );
    }
}

// ---------------------------------------------------------------------------
// Pool<F>
// ---------------------------------------------------------------------------

/// Bounded pool of reusable units.
///
/// Cloning is cheap; clones share the same units.
pub struct Pool<F: UnitFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: UnitFactory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: UnitFactory> std::fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.inner.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<F: UnitFactory> Pool<F> {
    /// Create a pool named `name` holding at most `max_units` units.
    ///
    /// No unit is created up front; see [`Pool::warm_up`].
    pub fn new(name: impl Into<String>, factory: F, max_units: usize) -> Result<Self> {
        Self::builder(name, factory).max_units(max_units).build()
    }

    /// Start building a pool with non-default settings.
    pub fn builder(name: impl Into<String>, factory: F) -> PoolBuilder<F> {
        PoolBuilder {
            name: name.into(),
            factory,
            config: PoolConfig::default(),
            logger: None,
            registry: None,
        }
    }

    /// The pool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Capacity ceiling.
    #[must_use]
    pub fn max_units(&self) -> usize {
        self.inner.config.max_units
    }

    /// Number of units currently in existence.
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.inner.state.lock().total_created
    }

    /// The configuration the pool was built with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Take a unit without waiting for a release.
    ///
    /// Reuses an idle unit if there is one, otherwise creates a unit when
    /// capacity remains. Returns [`Error::CapacityReached`] when every unit is
    /// held by a caller (or a drain is in progress), and [`Error::Creation`]
    /// if the factory fails.
    pub async fn try_acquire(&self) -> Result<Lease<F::Unit>> {
        let inner = &self.inner;
        match inner.slots.try_acquire() {
            Ok(permit) => self.claim(permit).await,
            Err(TryAcquireError::NoPermits) => {
                inner.state.lock().counters.capacity_rejections += 1;
                inner.logger.log_text(
                    LogCategory::Capacity,
                    &format!("{}: capacity reached [{}]", inner.name, inner.config.max_units),
                );
                Err(Error::CapacityReached {
                    pool: inner.name.clone(),
                    max_units: inner.config.max_units,
                })
            }
            Err(TryAcquireError::Closed) => Err(self.closed()),
        }
    }

    /// Take a unit, suspending until one is released if the pool is saturated.
    ///
    /// Bounded by [`PoolConfig::acquire_timeout`] when set. Waiters are served
    /// in arrival order, one unit per release.
    pub async fn wait(&self) -> Result<Lease<F::Unit>> {
        match self.inner.config.acquire_timeout {
            Some(timeout) => self.wait_timeout(timeout).await,
            None => {
                let permit = self.slot().await?;
                self.claim(permit).await
            }
        }
    }

    /// Like [`Pool::wait`], giving up with [`Error::Timeout`] after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<Lease<F::Unit>> {
        let permit = tokio::time::timeout(timeout, self.slot())
            .await
            .map_err(|_| Error::Timeout {
                pool: self.inner.name.clone(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        self.claim(permit).await
    }

    /// Like [`Pool::wait`], giving up with [`Error::Cancelled`] once `token`
    /// is cancelled.
    pub async fn wait_cancellable(&self, token: &CancellationToken) -> Result<Lease<F::Unit>> {
        let permit = tokio::select! {
            biased;
            () = token.cancelled() => {
                return Err(Error::Cancelled {
                    pool: self.inner.name.clone(),
                });
            }
            permit = self.slot() => permit?,
        };
        self.claim(permit).await
    }

    /// Eagerly create up to `count` idle units.
    ///
    /// Creation stops at `max_units`. The first factory failure is returned
    /// and units created before it stay in the idle set. Returns the number
    /// of units created.
    pub async fn warm_up(&self, count: usize) -> Result<usize> {
        let inner = &self.inner;
        let mut created = 0;

        while created < count {
            let Ok(permit) = inner.slots.try_acquire() else {
                break;
            };
            let reservation = {
                let mut state = inner.state.lock();
                if state.total_created + state.creating >= inner.config.max_units {
                    break;
                }
                state.creating += 1;
                Reservation::adopt(&inner.state)
            };

            match inner.factory.create().await {
                Ok(unit) => {
                    reservation.commit(|state| state.idle.push_back(unit));
                    created += 1;
                    drop(permit);
                }
                Err(source) => {
                    drop(reservation);
                    inner.state.lock().counters.creation_failures += 1;
                    return Err(Error::Creation {
                        pool: inner.name.clone(),
                        source,
                    });
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %inner.name, requested = count, created, "Warm-up finished");

        Ok(created)
    }

    /// Completion hook: flush `unit` and make it available again.
    ///
    /// Never fails. Flush errors and the unit's last error are logged, and the
    /// unit is returned to the idle set regardless.
    pub fn on_unit_complete(&self, unit: F::Unit) {
        self.inner.complete(unit);
    }

    /// Wait for every outstanding unit to come back, then retire all units.
    ///
    /// Resets `total_created` to zero; the pool stays usable afterwards.
    /// An out-of-memory failure from [`UnitFactory::retire`] ends retirement
    /// early without error and the remaining idle units are dropped. Any
    /// other retirement failure is returned as [`Error::Drain`].
    pub async fn drain(&self) -> Result<()> {
        let inner = &self.inner;
        let all = u32::try_from(inner.config.max_units)
            .map_err(|_| Error::internal(&inner.name, "max_units does not fit a permit count"))?;
        let _permits = inner
            .slots
            .acquire_many(all)
            .await
            .map_err(|_| self.closed())?;

        // Every permit is held: nothing is outstanding or being created.
        let mut retired = 0u64;
        loop {
            let next = {
                let mut state = inner.state.lock();
                let unit = state.idle.pop_front();
                if unit.is_some() {
                    state.total_created -= 1;
                }
                unit
            };
            let Some(unit) = next else {
                break;
            };

            match inner.factory.retire(unit).await {
                Ok(()) => {
                    inner.state.lock().counters.retired += 1;
                    retired += 1;
                }
                Err(err) if err.is_out_of_memory() => {
                    let abandoned: Vec<_> = inner.state.lock().idle.drain(..).collect();
                    inner.logger.log_text(
                        LogCategory::Drain,
                        &format!(
                            "{}: {err} while retiring, releasing {} remaining units",
                            inner.name,
                            abandoned.len()
                        ),
                    );
                    drop(abandoned);
                    break;
                }
                Err(source) => {
                    inner.logger.log_text(
                        LogCategory::Drain,
                        &format!("{}: retiring a unit failed: {source}", inner.name),
                    );
                    return Err(Error::Drain {
                        pool: inner.name.clone(),
                        source,
                    });
                }
            }
        }

        inner.state.lock().total_created = 0;

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %inner.name, retired, "Pool drained");
        let _ = retired;

        Ok(())
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            max_units: self.inner.config.max_units,
            total_created: state.total_created,
            idle: state.idle.len(),
            active: state.outstanding,
            total_acquisitions: state.counters.acquisitions,
            total_releases: state.counters.releases,
            retired: state.counters.retired,
            creation_failures: state.counters.creation_failures,
            capacity_rejections: state.counters.capacity_rejections,
            flush_failures: state.counters.flush_failures,
        }
    }

    /// Write a statistics summary through the pool's logger.
    pub fn log_information(&self) {
        let stats = self.stats();
        self.inner
            .logger
            .log_text(LogCategory::Lifecycle, &format!("{}: {stats}", self.inner.name));
    }

    async fn slot(&self) -> Result<SemaphorePermit<'_>> {
        self.inner.slots.acquire().await.map_err(|_| self.closed())
    }

    /// Turn a capacity permit into a lease: reuse an idle unit or create one.
    async fn claim(&self, permit: SemaphorePermit<'_>) -> Result<Lease<F::Unit>> {
        let inner = &self.inner;
        let reused = {
            let mut state = inner.state.lock();
            match state.idle.pop_front() {
                Some(unit) => {
                    state.outstanding += 1;
                    state.counters.acquisitions += 1;
                    Some(unit)
                }
                None => {
                    state.creating += 1;
                    None
                }
            }
        };

        let unit = match reused {
            Some(unit) => unit,
            None => {
                let reservation = Reservation::adopt(&inner.state);
                match inner.factory.create().await {
                    Ok(unit) => {
                        reservation.commit(|state| {
                            state.outstanding += 1;
                            state.counters.acquisitions += 1;
                        });
                        #[cfg(feature = "tracing")]
                        tracing::debug!(pool = %inner.name, "Created unit");
                        unit
                    }
                    Err(source) => {
                        drop(reservation);
                        inner.state.lock().counters.creation_failures += 1;
                        return Err(Error::Creation {
                            pool: inner.name.clone(),
                            source,
                        });
                    }
                }
            }
        };

        // The permit comes back through `add_permits` when the unit completes.
        permit.forget();
        let sink: Arc<dyn CompletionSink<F::Unit>> = self.inner.clone();
        Ok(Lease::new(unit, sink))
    }

    fn closed(&self) -> Error {
        Error::internal(&self.inner.name, "capacity semaphore closed")
    }
}

impl<F: UnitFactory> CompletionSink<F::Unit> for Pool<F> {
    fn on_complete(&self, unit: F::Unit) {
        self.inner.complete(unit);
    }
}

// ---------------------------------------------------------------------------
// PoolBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Pool`].
pub struct PoolBuilder<F> {
    name: String,
    factory: F,
    config: PoolConfig,
    logger: Option<Arc<dyn PoolLogger>>,
    registry: Option<Registry>,
}

impl<F: UnitFactory> PoolBuilder<F> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the capacity ceiling.
    pub fn max_units(mut self, max_units: usize) -> Self {
        self.config.max_units = max_units;
        self
    }

    /// Route timing and diagnostics to `logger` instead of the default.
    pub fn logger(mut self, logger: Arc<dyn PoolLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Register the pool's name in `registry`.
    pub fn registry(mut self, registry: &Registry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Validate settings, register the name and build the pool.
    pub fn build(self) -> Result<Pool<F>> {
        validate_name(&self.name)?;
        self.config.validate()?;

        let registration = self
            .registry
            .as_ref()
            .map(|registry| registry.register(&self.name, self.config.max_units))
            .transpose()?;

        let logger = self.logger.unwrap_or_else(default_logger);
        logger.log_text(
            LogCategory::Lifecycle,
            &format!("{}: pool created, max_units={}", self.name, self.config.max_units),
        );

        let max = self.config.max_units;
        Ok(Pool {
            inner: Arc::new(PoolInner {
                name: self.name,
                factory: self.factory,
                config: self.config,
                logger,
                state: Mutex::new(State {
                    idle: VecDeque::with_capacity(max),
                    total_created: 0,
                    outstanding: 0,
                    creating: 0,
                    counters: Counters::default(),
                }),
                slots: Semaphore::new(max),
                _registration: registration,
            }),
        })
    }
}
