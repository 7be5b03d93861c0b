//! Logging collaborator for pools.
//!
//! A pool reports unit timing and diagnostic text through a [`PoolLogger`].
//! Logging is fire-and-forget: implementations must not block and the pool
//! never reacts to what a logger does.

use std::sync::Arc;

use crate::unit::Unit;

/// Category attached to free-form log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Construction, registration, stats dumps.
    Lifecycle,
    /// A non-blocking acquisition found the pool saturated.
    Capacity,
    /// A returning unit carried an error from its last operation.
    UnitError,
    /// Flushing a returning unit failed.
    Flush,
    /// Drain progress and tolerated failures.
    Drain,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Capacity => write!(f, "capacity"),
            Self::UnitError => write!(f, "unit-error"),
            Self::Flush => write!(f, "flush"),
            Self::Drain => write!(f, "drain"),
        }
    }
}

/// Sink for pool timing and diagnostic messages.
pub trait PoolLogger: Send + Sync {
    /// Record timing for a unit that just completed its work.
    fn log_timing(&self, pool: &str, unit: &dyn Unit);

    /// Record a diagnostic message.
    fn log_text(&self, category: LogCategory, message: &str);
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl PoolLogger for NoopLogger {
    fn log_timing(&self, _pool: &str, _unit: &dyn Unit) {}

    fn log_text(&self, _category: LogCategory, _message: &str) {}
}

/// Logger that emits `tracing` events.
///
/// Timing goes out at `trace`, capacity and lifecycle text at `debug`, and
/// unit/flush/drain problems at `warn`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl PoolLogger for TracingLogger {
    fn log_timing(&self, pool: &str, unit: &dyn Unit) {
        match unit.elapsed() {
            Some(elapsed) => tracing::trace!(
                pool,
                elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                "Unit completed"
            ),
            None => tracing::trace!(pool, "Unit completed"),
        }
    }

    fn log_text(&self, category: LogCategory, message: &str) {
        match category {
            LogCategory::Lifecycle | LogCategory::Capacity => {
                tracing::debug!(category = %category, "{message}");
            }
            LogCategory::UnitError | LogCategory::Flush | LogCategory::Drain => {
                tracing::warn!(category = %category, "{message}");
            }
        }
    }
}

/// The logger a pool uses when none is injected.
pub fn default_logger() -> Arc<dyn PoolLogger> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingLogger)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NoopLogger)
    }
}
