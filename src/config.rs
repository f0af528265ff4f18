use crate::core::{Location, Result, StasisError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Lowest and highest Y a stash location may use.
pub const STASH_MIN_Y: f64 = -64.0;
pub const STASH_MAX_Y: f64 = 320.0;

/// Stasis subsystem configuration
///
/// Loaded from JSON with kebab-case keys; every section and key is optional
/// and falls back to its default.
///
/// ```
/// # use stasis_vault::StasisConfig;
/// let config = StasisConfig::from_json_str(r#"{
///     "stash": { "world": "vault", "y": 300.0 },
///     "capacity": { "enabled": true, "max-total": 50 }
/// }"#).unwrap();
/// assert_eq!(config.stash.world, "vault");
/// assert_eq!(config.capacity.max_total, 50);
/// assert_eq!(config.reconcile.batch_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct StasisConfig {
    pub stash: StashConfig,
    pub capacity: CapacityConfig,
    pub reconcile: ReconcileConfig,
    pub persistence: PersistenceConfig,
}

/// Fixed point where parked actors are held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StashConfig {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            world: "world".to_string(),
            x: 0.0,
            y: 320.0,
            z: 0.0,
        }
    }
}

impl StashConfig {
    pub fn location(&self) -> Location {
        Location::new(self.world.clone(), self.x, self.y, self.z)
    }
}

/// Global cap on simultaneously parked actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CapacityConfig {
    pub enabled: bool,
    pub max_total: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_total: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReconcileConfig {
    /// Records validated per tick during the startup pass.
    pub batch_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PersistenceConfig {
    /// File name of the stasis table inside the data directory.
    pub file_name: PathBuf,
    /// Ticks to wait before retrying a failed save.
    pub save_retry_ticks: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from("stasis.json"),
            save_retry_ticks: 100,
        }
    }
}

impl StasisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StasisConfig = serde_json::from_str(json)
            .map_err(|e| StasisError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            StasisError::InvalidConfig(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Set the stash location
    pub fn with_stash(mut self, world: &str, x: f64, y: f64, z: f64) -> Self {
        self.stash = StashConfig {
            world: world.to_string(),
            x,
            y,
            z,
        };
        self
    }

    /// Set the capacity cap
    pub fn with_capacity(mut self, enabled: bool, max_total: usize) -> Self {
        self.capacity = CapacityConfig { enabled, max_total };
        self
    }

    /// Set the reconcile batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.reconcile.batch_size = batch_size;
        self
    }

    /// Set the save retry interval
    pub fn with_save_retry_ticks(mut self, ticks: u64) -> Self {
        self.persistence.save_retry_ticks = ticks;
        self
    }

    /// Path of the stasis table for a given data directory.
    pub fn data_file(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.persistence.file_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stash.world.trim().is_empty() {
            return Err(StasisError::InvalidConfig(
                "Stash world cannot be blank".to_string(),
            ));
        }
        if ![self.stash.x, self.stash.y, self.stash.z]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(StasisError::InvalidConfig(
                "Stash coordinates must be finite".to_string(),
            ));
        }
        if self.stash.y < STASH_MIN_Y || self.stash.y > STASH_MAX_Y {
            return Err(StasisError::InvalidConfig(format!(
                "Stash Y coordinate must be between {} and {}: {}",
                STASH_MIN_Y, STASH_MAX_Y, self.stash.y
            )));
        }
        if self.reconcile.batch_size == 0 {
            return Err(StasisError::InvalidConfig(
                "Reconcile batch size must be at least 1".to_string(),
            ));
        }
        if self.persistence.save_retry_ticks == 0 {
            return Err(StasisError::InvalidConfig(
                "Save retry interval must be at least 1 tick".to_string(),
            ));
        }
        if self.persistence.file_name.as_os_str().is_empty() {
            return Err(StasisError::InvalidConfig(
                "Persistence file name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = StasisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stash.world, "world");
        assert_eq!(config.stash.y, 320.0);
        assert!(config.capacity.enabled);
        assert_eq!(config.capacity.max_total, 500);
        assert_eq!(config.reconcile.batch_size, 100);
        assert_eq!(config.persistence.file_name, PathBuf::from("stasis.json"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StasisConfig::from_json_str(
            r#"{ "capacity": { "max-total": 3 }, "persistence": { "save-retry-ticks": 20 } }"#,
        )
        .unwrap();
        assert!(config.capacity.enabled);
        assert_eq!(config.capacity.max_total, 3);
        assert_eq!(config.persistence.save_retry_ticks, 20);
        assert_eq!(config.stash, StashConfig::default());
    }

    #[test]
    fn test_rejects_out_of_range_stash_y() {
        let err = StasisConfig::default()
            .with_stash("world", 0.0, 400.0, 0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StasisError::InvalidConfig(_)));

        let err = StasisConfig::from_json_str(r#"{ "stash": { "y": -65.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("between"));
    }

    #[test]
    fn test_rejects_blank_world_and_zero_batch() {
        assert!(StasisConfig::default()
            .with_stash("  ", 0.0, 100.0, 0.0)
            .validate()
            .is_err());
        assert!(StasisConfig::default().with_batch_size(0).validate().is_err());
        assert!(StasisConfig::default()
            .with_save_retry_ticks(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = StasisConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, StasisError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stasis-config.json");
        fs::write(&path, r#"{ "stash": { "world": "limbo", "x": 10.5 } }"#).unwrap();

        let config = StasisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.stash.location(), Location::new("limbo", 10.5, 320.0, 0.0));
        assert_eq!(
            config.data_file(temp_dir.path()),
            temp_dir.path().join("stasis.json")
        );

        assert!(StasisConfig::from_json_file(temp_dir.path().join("missing.json")).is_err());
    }
}
