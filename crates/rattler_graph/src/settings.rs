// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution settings.
//!
//! Settings control the policies a [`Graph`](crate::graph::Graph) applies
//! while wiring and running nodes:
//! - How strictly callable results must match the declared source ports
//! - Whether several edges may feed the same sink port

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// How a result count that differs from the number of source ports is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArityPolicy {
    /// Fail the node with an arity mismatch
    #[default]
    Strict,
    /// Fill sources in order, drop extra results and leave missing ones unset
    Lenient,
}

/// Policies applied by a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Settings format version
    pub version: u32,
    /// Result arity handling
    pub arity: ArityPolicy,
    /// Allow more than one edge into a sink port (the last edge added wins)
    pub allow_fan_in: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            arity: ArityPolicy::Strict,
            allow_fan_in: true,
        }
    }
}

impl ExecutionSettings {
    /// Settings reproducing the permissive behaviour: lenient arity, fan-in allowed
    pub fn lenient() -> Self {
        Self {
            arity: ArityPolicy::Lenient,
            ..Self::default()
        }
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default().struct_names(true))
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        tracing::debug!("Loaded execution settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self.to_ron().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ExecutionSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.arity, ArityPolicy::Strict);
        assert!(settings.allow_fan_in);
    }

    #[test]
    fn test_serialization() {
        let settings = ExecutionSettings::lenient();
        let ron_str = settings.to_ron().unwrap();
        let loaded = ExecutionSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = ExecutionSettings::from_ron("(arity: Lenient)").unwrap();
        assert_eq!(loaded.arity, ArityPolicy::Lenient);
        assert!(loaded.allow_fan_in);
        assert_eq!(loaded.version, SETTINGS_FORMAT_VERSION);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("rattler-settings-{}.ron", std::process::id()));
        let settings = ExecutionSettings {
            allow_fan_in: false,
            ..ExecutionSettings::default()
        };
        settings.save(&path).unwrap();
        let loaded = ExecutionSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_newer_version_rejected() {
        let path = std::env::temp_dir()
            .join(format!("rattler-settings-new-{}.ron", std::process::id()));
        std::fs::write(&path, "(version: 99)").unwrap();
        let err = ExecutionSettings::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
