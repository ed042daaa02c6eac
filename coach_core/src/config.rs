//! Configuration file support for coachgen.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/coachgen/config.toml`.

use crate::engine::DEFAULT_MAX_DURATION_SEC;
use crate::templates::{Template, TemplateCatalog};
use crate::{get_default_catalog, Error, ExerciseCatalog, Intensity, Result, SessionMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub equipment: EquipmentConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Extra templates, merged over the built-ins by name
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Equipment availability configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentConfig {
    #[serde(default = "default_equipment")]
    pub available: Vec<String>,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            available: default_equipment(),
        }
    }
}

/// Request defaults and limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_template")]
    pub default_template: String,

    #[serde(default = "default_duration_sec")]
    pub default_duration_sec: u32,

    #[serde(default)]
    pub default_mode: SessionMode,

    #[serde(default)]
    pub default_intensity: Intensity,

    #[serde(default = "default_max_duration_sec")]
    pub max_duration_sec: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_template: default_template(),
            default_duration_sec: default_duration_sec(),
            default_mode: SessionMode::default(),
            default_intensity: Intensity::default(),
            max_duration_sec: default_max_duration_sec(),
        }
    }
}

/// Exercise catalog source
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// TOML or JSON catalog file; the built-in catalog when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("coachgen")
}

fn default_equipment() -> Vec<String> {
    vec![]
}

fn default_template() -> String {
    "straight_sets".into()
}

fn default_duration_sec() -> u32 {
    3600
}

fn default_max_duration_sec() -> u32 {
    DEFAULT_MAX_DURATION_SEC
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("coachgen").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation.max_duration_sec == 0 {
            return Err(Error::Config("max_duration_sec must be positive".into()));
        }
        if self.generation.default_duration_sec == 0
            || self.generation.default_duration_sec > self.generation.max_duration_sec
        {
            return Err(Error::Config(format!(
                "default_duration_sec must be between 1 and {}",
                self.generation.max_duration_sec
            )));
        }
        if self.equipment.available.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::Config("Equipment names must not be blank".into()));
        }
        Ok(())
    }

    /// Configured equipment, trimmed and lowercased
    pub fn equipment_set(&self) -> BTreeSet<String> {
        self.equipment
            .available
            .iter()
            .map(|e| e.trim().to_lowercase())
            .collect()
    }

    /// Built-in templates plus the configured ones
    pub fn template_catalog(&self) -> Result<TemplateCatalog> {
        let catalog = TemplateCatalog::with_overrides(&self.templates);
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::Config(format!(
                "Invalid templates: {}",
                errors.join("; ")
            )));
        }
        Ok(catalog)
    }

    /// The configured exercise catalog, or the built-in one
    pub fn exercise_catalog(&self) -> Result<ExerciseCatalog> {
        let catalog = match self.catalog.path {
            Some(ref path) => ExerciseCatalog::load_from(path)?,
            None => get_default_catalog().clone(),
        };
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data.data_dir.join("sessions.jsonl")
    }

    pub fn exclusions_path(&self) -> PathBuf {
        self.data.data_dir.join("exclusions.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.equipment.available.is_empty());
        assert_eq!(config.generation.default_template, "straight_sets");
        assert_eq!(config.generation.max_duration_sec, 14_400);
        assert_eq!(config.generation.default_intensity, Intensity::Moderate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.equipment.available = vec!["barbell".into(), "bench".into()];
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.equipment.available, parsed.equipment.available);
        assert_eq!(
            config.generation.default_template,
            parsed.generation.default_template
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[generation]
default_template = "emom"
default_intensity = "high"

[equipment]
available = [" Kettlebell ", "box"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generation.default_template, "emom");
        assert_eq!(config.generation.default_intensity, Intensity::High);
        assert_eq!(config.generation.max_duration_sec, 14_400); // default
        assert!(config.equipment_set().contains("kettlebell"));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let mut config = Config::default();
        config.generation.max_duration_sec = 600;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_extra_templates_merge_over_builtins() {
        let toml_str = r#"
[[templates]]
name = "express"
label = "Express"

[[templates.slots]]
kind = "main"
format = "emom"
weight = 1.0
exercises = { type = "fixed", count = 2 }
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let templates = config.template_catalog().unwrap();

        let express = templates.get("express").unwrap();
        assert_eq!(express.slots.len(), 1);
        assert_eq!(express.slots[0].kind, BlockKind::Main);
        assert!(templates.get("hyrox").is_some());
    }

    #[test]
    fn test_out_of_range_templates_rejected() {
        let overflow = r#"
[[templates]]
name = "broken_rounds"
label = "Broken"

[[templates.slots]]
kind = "main"
format = "tabata"
weight = 1.0
work_sec = 4294967295
rest_sec = 1
exercises = { type = "fixed", count = 2 }
"#;
        let config: Config = toml::from_str(overflow).unwrap();
        assert!(matches!(config.template_catalog(), Err(Error::Config(_))));

        let huge_count = r#"
[[templates]]
name = "broken_count"
label = "Broken"

[[templates.slots]]
kind = "main"
format = "amrap"
weight = 1.0
exercises = { type = "fixed", count = 9223372036854775807 }
"#;
        let config: Config = toml::from_str(huge_count).unwrap();
        let err = config.template_catalog().unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn test_missing_catalog_file_is_an_error() {
        let mut config = Config::default();
        config.catalog.path = Some(PathBuf::from("/nonexistent/catalog.toml"));
        assert!(matches!(config.exercise_catalog(), Err(Error::Io(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().to_path_buf();

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, temp_dir.path());
        assert_eq!(loaded.sessions_path(), temp_dir.path().join("sessions.jsonl"));
    }
}
