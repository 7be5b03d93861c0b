//! Pool identity registry.
//!
//! A [`Registry`] guarantees that at most one live pool holds a given name.
//! Registering returns a [`Registration`] that releases the name on drop.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{Error, Result};

/// Longest accepted pool name, in characters.
pub const MAX_NAME_LEN: usize = 254;

/// Check a pool name against the identity rules.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::initialization(name, "pool name must not be empty"));
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(Error::initialization(
            name,
            format!("pool name is {len} characters, limit is {MAX_NAME_LEN}"),
        ));
    }
    Ok(())
}

/// Registry of live pool names.
///
/// Cloning is cheap; clones share the same set of names.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    names: Arc<DashMap<String, usize>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for a pool with capacity `max_units`.
    ///
    /// Fails with [`Error::Initialization`] if the name is invalid or already
    /// held by a live pool.
    pub fn register(&self, name: &str, max_units: usize) -> Result<Registration> {
        validate_name(name)?;
        match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::initialization(
                name,
                "a pool with this name is already registered",
            )),
            Entry::Vacant(slot) => {
                slot.insert(max_units);
                #[cfg(feature = "tracing")]
                tracing::debug!(pool = name, max_units, "Registered pool");
                Ok(Registration {
                    names: Arc::clone(&self.names),
                    name: name.to_string(),
                })
            }
        }
    }

    /// Whether a live pool holds `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Capacity recorded for `name`, if registered.
    #[must_use]
    pub fn max_units(&self, name: &str) -> Option<usize> {
        self.names.get(name).map(|entry| *entry.value())
    }

    /// Number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` if no pool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Claim on a registered name. Dropping it frees the name.
#[derive(Debug)]
pub struct Registration {
    names: Arc<DashMap<String, usize>>,
    name: String,
}

impl Registration {
    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.names.remove(&self.name);
        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %self.name, "Unregistered pool");
    }
}
