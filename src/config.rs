//! Engine configuration.
//!
//! Configuration can be set via environment variables:
//! - `EXPEDITION_DB_PATH` - Optional. SQLite database path; unset means the
//!   non-persistent in-memory store.
//! - `CAPACITY_SCALING` - Optional. `scaled` (default) applies the level
//!   compatibility coefficient to hero capacity; `raw` feeds the picker the
//!   unscaled value.
//! - `STUCK_SWEEP_MINUTES` - Optional. Age after which a still-`Created`
//!   expedition is considered stuck and retried by the sweep.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::CapacityAdjustment;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// SQLite database path; `None` selects the in-memory store.
    pub db_path: Option<PathBuf>,

    /// Whether the picker sees compatibility-scaled or raw capacity.
    pub capacity_adjustment: CapacityAdjustment,

    /// Age threshold for the stuck-expedition sweep.
    pub stuck_after: Option<chrono::Duration>,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparseable values; every
    /// variable is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("EXPEDITION_DB_PATH").ok().map(PathBuf::from);

        let capacity_adjustment = match std::env::var("CAPACITY_SCALING") {
            Ok(raw) => CapacityAdjustment::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue("CAPACITY_SCALING".to_string(), raw)
            })?,
            Err(_) => CapacityAdjustment::default(),
        };

        let stuck_after = match std::env::var("STUCK_SWEEP_MINUTES") {
            Ok(raw) => {
                let minutes: i64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue("STUCK_SWEEP_MINUTES".to_string(), format!("{e}"))
                })?;
                Some(chrono::Duration::minutes(minutes))
            }
            Err(_) => None,
        };

        Ok(Self {
            db_path,
            capacity_adjustment,
            stuck_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_scaled_capacity() {
        let config = EngineConfig::default();
        assert_eq!(config.capacity_adjustment, CapacityAdjustment::Scaled);
        assert!(config.db_path.is_none());
        assert!(config.stuck_after.is_none());
    }

    #[test]
    fn adjustment_values_parse() {
        assert_eq!(
            CapacityAdjustment::parse("scaled"),
            Some(CapacityAdjustment::Scaled)
        );
        assert_eq!(
            CapacityAdjustment::parse("raw"),
            Some(CapacityAdjustment::Raw)
        );
        assert_eq!(CapacityAdjustment::parse("sometimes"), None);
    }
}
