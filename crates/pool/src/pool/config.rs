//! Pool configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How much the completion hook inspects a returning unit.
///
/// The level only changes what gets logged. A unit is always flushed and
/// returned to the idle set regardless of the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiagnosticLevel {
    /// Only timing is logged.
    Off,
    /// The unit's last error code is inspected and logged as well.
    Errors,
}

impl DiagnosticLevel {
    /// `true` if returning units should have their last error inspected.
    #[must_use]
    pub fn inspects_errors(self) -> bool {
        self == Self::Errors
    }
}

impl Default for DiagnosticLevel {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Errors
        } else {
            Self::Off
        }
    }
}

/// Configuration for a unit pool
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Maximum number of units that may exist at once
    pub max_units: usize,
    /// Upper bound for [`Pool::wait`](crate::Pool::wait); `None` waits forever
    pub acquire_timeout: Option<Duration>,
    /// Completion-hook diagnostics
    pub diagnostics: DiagnosticLevel,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_units: 10,
            acquire_timeout: None,
            diagnostics: DiagnosticLevel::default(),
        }
    }
}

impl PoolConfig {
    /// Config with the given capacity and defaults for everything else.
    #[must_use]
    pub fn with_max_units(max_units: usize) -> Self {
        Self {
            max_units,
            ..Self::default()
        }
    }

    /// Validate pool configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_units == 0 {
            return Err(Error::configuration("max_units must be greater than 0"));
        }
        if self.max_units > tokio::sync::Semaphore::MAX_PERMITS
            || u32::try_from(self.max_units).is_err()
        {
            return Err(Error::configuration(format!(
                "max_units ({}) exceeds the supported maximum",
                self.max_units
            )));
        }
        if self.acquire_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::configuration(
                "acquire_timeout must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_units, 10);
        assert!(config.acquire_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config_validation() {
        assert!(PoolConfig::with_max_units(0).validate().is_err());
        assert!(
            PoolConfig {
                acquire_timeout: Some(Duration::ZERO),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(PoolConfig::with_max_units(1).validate().is_ok());
    }

    #[test]
    fn diagnostics_follow_build_profile() {
        assert_eq!(
            DiagnosticLevel::default().inspects_errors(),
            cfg!(debug_assertions)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_deserializes_with_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"max_units": 4, "diagnostics": "off"}"#).unwrap();
        assert_eq!(config.max_units, 4);
        assert_eq!(config.diagnostics, DiagnosticLevel::Off);
        assert!(config.acquire_timeout.is_none());
    }
}
