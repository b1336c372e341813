//! # World Configuration
//!
//! Sizing hints for a [`World`](crate::World), loaded once at startup from
//! TOML or built in code.
//!
//! ```toml
//! expected_entity_count = 10000
//! edit_pool_capacity = 256
//! identity_warning_threshold = 2048
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Configuration for a world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Initial capacity of the per-entity tables.
    pub expected_entity_count: usize,
    /// Number of edit objects preallocated in the edit pool.
    pub edit_pool_capacity: usize,
    /// Distinct compositions after which a warning is logged.
    ///
    /// Identity lookup is a linear scan, so an application creating
    /// unbounded component combinations slows down past this point.
    pub identity_warning_threshold: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            expected_entity_count: 128,
            edit_pool_capacity: 64,
            identity_warning_threshold: 4096,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the text is not valid TOML for
    /// this structure, or if a value is out of range.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] for a zero warning threshold.
    pub fn validate(&self) -> EcsResult<()> {
        if self.identity_warning_threshold == 0 {
            return Err(EcsError::InvalidConfig(
                "identity_warning_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
