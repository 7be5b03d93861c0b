//! Unit and factory traits
//!
//! A [`Unit`] is an opaque, expensive-to-create resource handle the pool
//! recycles instead of destroying. A [`UnitFactory`] creates units on demand
//! and retires them when the pool is drained.

use std::time::Duration;

/// Category of a [`UnitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UnitErrorKind {
    /// The backing store could not satisfy an allocation.
    OutOfMemory,
    /// The device or driver behind the unit reported a failure.
    Device,
    /// The unit was asked to do something its current state forbids.
    InvalidState,
    /// Anything else.
    Other,
}

impl std::fmt::Display for UnitErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Device => write!(f, "device error"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::Other => write!(f, "error"),
        }
    }
}

/// Error reported by a unit or its factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct UnitError {
    /// What went wrong
    pub kind: UnitErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl UnitError {
    /// Create a new unit error.
    pub fn new(kind: UnitErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`UnitErrorKind::OutOfMemory`] error.
    pub fn out_of_memory(message: impl Into<String>) -> Self {
        Self::new(UnitErrorKind::OutOfMemory, message)
    }

    /// `true` if this is an out-of-memory condition.
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        self.kind == UnitErrorKind::OutOfMemory
    }
}

/// A reusable, pool-managed resource handle.
pub trait Unit: Send + 'static {
    /// Reset the unit to a pristine, reusable state.
    fn flush(&mut self) -> Result<(), UnitError>;

    /// Error left behind by the unit's most recent operation, if any.
    fn last_error(&self) -> Option<UnitError> {
        None
    }

    /// Duration of the unit's most recent operation, if the unit tracks it.
    fn elapsed(&self) -> Option<Duration> {
        None
    }
}

/// Creates and retires units for a pool.
///
/// Implementations may use `async fn` for both methods.
pub trait UnitFactory: Send + Sync + 'static {
    /// The unit type produced by this factory.
    type Unit: Unit;

    /// Create a new unit.
    fn create(&self) -> impl Future<Output = Result<Self::Unit, UnitError>> + Send;

    /// Permanently remove a unit from circulation.
    fn retire(&self, unit: Self::Unit) -> impl Future<Output = Result<(), UnitError>> + Send {
        drop(unit);
        async { Ok(()) }
    }
}
