//! Error types for pool operations
use thiserror::Error;

use crate::unit::UnitError;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for every fallible pool operation.
///
/// [`Error::CapacityReached`] is not a fault: it is the expected answer of a
/// non-blocking acquisition on a saturated pool. Use
/// [`Error::is_capacity_reached`] to tell it apart from real failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Pool configuration is invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },

    /// Identity validation or registration failed; the pool is unusable.
    #[error("Initialization failed for pool '{pool}': {reason}")]
    Initialization {
        /// The pool name
        pool: String,
        /// The failure reason
        reason: String,
    },

    /// The factory failed to produce a unit. The capacity counter is unaffected.
    #[error("Unit creation failed for pool '{pool}'")]
    Creation {
        /// The pool name
        pool: String,
        /// The factory error
        #[source]
        source: UnitError,
    },

    /// Every unit exists and is held by a caller.
    #[error("Pool '{pool}' reached its capacity of {max_units} units")]
    CapacityReached {
        /// The pool name
        pool: String,
        /// Capacity ceiling
        max_units: usize,
    },

    /// A bounded wait elapsed before a unit was released.
    #[error("Wait timed out after {timeout_ms}ms for pool '{pool}'")]
    Timeout {
        /// The pool name
        pool: String,
        /// The timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// A cancellable wait was cancelled.
    #[error("Wait cancelled for pool '{pool}'")]
    Cancelled {
        /// The pool name
        pool: String,
    },

    /// Retiring a unit during drain failed with something other than
    /// out-of-memory.
    #[error("Drain of pool '{pool}' failed unexpectedly")]
    Drain {
        /// The pool name
        pool: String,
        /// The retirement error
        #[source]
        source: UnitError,
    },

    /// Generic internal error
    #[error("Internal error in pool '{pool}': {message}")]
    Internal {
        /// The pool name
        pool: String,
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an initialization error
    pub fn initialization(pool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Initialization {
            pool: pool.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(pool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            pool: pool.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CapacityReached { .. } | Self::Timeout { .. } | Self::Creation { .. }
        )
    }

    /// `true` for the non-fault "pool is saturated" signal.
    #[must_use]
    pub fn is_capacity_reached(&self) -> bool {
        matches!(self, Self::CapacityReached { .. })
    }

    /// Get the pool name associated with this error (if any)
    #[must_use]
    pub fn pool_name(&self) -> Option<&str> {
        match self {
            Self::Configuration { .. } => None,
            Self::Initialization { pool, .. }
            | Self::Creation { pool, .. }
            | Self::CapacityReached { pool, .. }
            | Self::Timeout { pool, .. }
            | Self::Cancelled { pool }
            | Self::Drain { pool, .. }
            | Self::Internal { pool, .. } => Some(pool),
        }
    }
}
