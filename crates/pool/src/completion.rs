//! Completion boundary between a unit's asynchronous work and its pool.

use crate::pool::DiagnosticLevel;
use crate::logger::{LogCategory, PoolLogger};
use crate::unit::{Unit, UnitError};

/// Callback invoked when a unit finishes its in-flight work.
///
/// Each completion must call `on_complete` exactly once, and the caller must
/// not keep the unit afterwards: ownership goes back to the pool.
pub trait CompletionSink<U>: Send + Sync {
    /// Hand a finished unit back.
    fn on_complete(&self, unit: U);
}

/// Bring a finished unit back to a reusable state.
///
/// Logs timing, optionally reports the unit's last error, then flushes it.
/// Returns the flush error, if any. Callers recycle the unit either way.
pub(crate) fn settle<U: Unit>(
    pool: &str,
    unit: &mut U,
    logger: &dyn PoolLogger,
    diagnostics: DiagnosticLevel,
) -> Option<UnitError> {
    logger.log_timing(pool, &*unit);

    if diagnostics.inspects_errors()
        && let Some(err) = unit.last_error()
    {
        logger.log_text(LogCategory::UnitError, &format!("{pool}: {err}"));
    }

    match unit.flush() {
        Ok(()) => None,
        Err(err) => {
            logger.log_text(
                LogCategory::Flush,
                &format!("{pool}: flush of returning unit failed: {err}"),
            );
            Some(err)
        }
    }
}
