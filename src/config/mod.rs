// SPDX-License-Identifier: MPL-2.0
//! Engine configuration, including loading and saving host-tuned settings
//! to an `engine.toml` file.
//!
//! Every field is optional; missing fields fall back to the defaults in
//! [`defaults`]. Invalid TOML degrades to defaults rather than failing the
//! host application.

mod defaults;

pub use defaults::*;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "engine.toml";
const APP_NAME: &str = "PlanCanvas";

/// Rendering quality/performance trade-off selected by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    /// Favor visual quality.
    High,
    /// Adaptive middle ground.
    #[default]
    Balanced,
    /// Favor frame rate on weak hardware.
    Performance,
}

/// Top-level engine configuration.
///
/// All fields are optional so hosts can override only what they care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub enable_performance_monitoring: Option<bool>,
    #[serde(default)]
    pub enable_memory_management: Option<bool>,
    #[serde(default)]
    pub enable_viewport_culling: Option<bool>,
    /// Touch-capable host. `None` leaves the decision to platform detection.
    #[serde(default)]
    pub is_mobile: Option<bool>,
    /// Hard memory limit in megabytes for cached render artifacts.
    #[serde(default)]
    pub max_memory_mb: Option<u32>,
    /// Cap on the number of items returned from one culling query.
    #[serde(default)]
    pub max_render_items: Option<usize>,
    #[serde(default)]
    pub performance_mode: Option<PerformanceMode>,
    #[serde(default)]
    pub enable_debug_mode: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_performance_monitoring: Some(true),
            enable_memory_management: Some(true),
            enable_viewport_culling: Some(true),
            is_mobile: None,
            max_memory_mb: None,
            max_render_items: None,
            performance_mode: Some(PerformanceMode::default()),
            enable_debug_mode: Some(false),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn performance_mode(&self) -> PerformanceMode {
        self.performance_mode.unwrap_or_default()
    }

    #[must_use]
    pub fn culling_enabled(&self) -> bool {
        self.enable_viewport_culling.unwrap_or(true)
    }

    #[must_use]
    pub fn memory_management_enabled(&self) -> bool {
        self.enable_memory_management.unwrap_or(true)
    }

    #[must_use]
    pub fn performance_monitoring_enabled(&self) -> bool {
        self.enable_performance_monitoring.unwrap_or(true)
    }

    #[must_use]
    pub fn debug_mode_enabled(&self) -> bool {
        self.enable_debug_mode.unwrap_or(false)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<EngineConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(EngineConfig::default())
}

pub fn save(config: &EngineConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_default())
}

pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_fields() {
        let config = EngineConfig {
            enable_viewport_culling: Some(false),
            is_mobile: Some(true),
            max_memory_mb: Some(64),
            performance_mode: Some(PerformanceMode::Performance),
            ..EngineConfig::default()
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("engine.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded.enable_viewport_culling, Some(false));
        assert_eq!(loaded.is_mobile, Some(true));
        assert_eq!(loaded.max_memory_mb, Some(64));
        assert_eq!(loaded.performance_mode, Some(PerformanceMode::Performance));
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("engine.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.performance_mode, Some(PerformanceMode::Balanced));
    }

    #[test]
    fn save_to_path_creates_parent_directories() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("deep").join("path").join("engine.toml");

        save_to_path(&EngineConfig::default(), &config_path).expect("save should create dirs");
        assert!(config_path.exists());
    }

    #[test]
    fn default_config_enables_all_subsystems() {
        let config = EngineConfig::default();
        assert!(config.culling_enabled());
        assert!(config.memory_management_enabled());
        assert!(config.performance_monitoring_enabled());
        assert!(!config.debug_mode_enabled());
        assert!(config.is_mobile.is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_accessor_defaults() {
        let config: EngineConfig = toml::from_str("max_memory_mb = 48").unwrap();
        assert_eq!(config.max_memory_mb, Some(48));
        assert!(config.culling_enabled());
        assert_eq!(config.performance_mode(), PerformanceMode::Balanced);
    }

    #[test]
    fn performance_mode_serializes_snake_case() {
        let config = EngineConfig {
            performance_mode: Some(PerformanceMode::Performance),
            ..EngineConfig::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("performance_mode = \"performance\""));
    }
}
