// src/config/loader.rs
//! Settings and threshold loading
//!
//! Settings are merged from built-in defaults, every TOML file found on the
//! search path and `LEO_VALIDATE_*` environment variables, in that order.
//! Threshold documents are YAML and are loaded strictly: a missing file,
//! a parse error or a missing key is reported, never papered over.

use crate::config::constants::paths;
use crate::config::thresholds::ThresholdDocument;
use crate::config::ValidatorSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("missing section '{section}' in {path}")]
    MissingSection { path: String, section: String },
    #[error("invalid configuration in {component}: {reason}")]
    Invalid { component: String, reason: String },
    #[error("configuration consistency errors: {}", .0.join("; "))]
    Inconsistent(Vec<String>),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

/// Top-level settings sections addressable from the environment
const SECTIONS: [&str; 4] = ["motor_load", "validation", "simulator", "bus"];

/// Layered settings loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Create loader over the default search path
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            use_environment: true,
        }
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            use_environment: true,
        }
    }

    /// Skip `LEO_VALIDATE_*` overrides
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load and validate tool settings
    pub fn load_settings(&self) -> Result<ValidatorSettings, ConfigError> {
        let mut merged = toml::Value::try_from(ValidatorSettings::default()).map_err(|e| {
            ConfigError::Parse {
                path: "<defaults>".to_string(),
                reason: e.to_string(),
            }
        })?;

        for config_path in &self.config_paths {
            if !config_path.exists() {
                continue;
            }
            let file_config = Self::load_config_file(config_path)?;
            debug!(path = %config_path.display(), "merging settings file");
            merge_toml_values(&mut merged, file_config);
        }

        if self.use_environment {
            apply_overrides(&mut merged, std::env::vars());
        }

        let settings: ValidatorSettings =
            merged.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
                path: "<merged settings>".to_string(),
                reason: e.to_string(),
            })?;

        settings
            .validate_consistency()
            .map_err(ConfigError::Inconsistent)?;

        Ok(settings)
    }

    /// Load the threshold document `T` from a YAML file
    pub fn load_thresholds<T: ThresholdDocument>(path: &Path) -> Result<T, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_thresholds(&content, &path.display().to_string())
    }

    /// Parse the threshold document `T` from YAML text; `origin` names the source in errors
    pub fn parse_thresholds<T: ThresholdDocument>(
        content: &str,
        origin: &str,
    ) -> Result<T, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        let section = root
            .get(T::SECTION)
            .cloned()
            .ok_or_else(|| ConfigError::MissingSection {
                path: origin.to_string(),
                section: T::SECTION.to_string(),
            })?;

        let document: T = serde_yaml::from_value(section).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: format!("section '{}': {}", T::SECTION, e),
        })?;

        document.validate()?;
        debug!(origin, section = T::SECTION, "loaded thresholds");
        Ok(document)
    }

    fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from(paths::SYSTEM_CONFIG_PATH));

        if let Some(home_dir) = std::env::var_os("HOME").map(PathBuf::from) {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Apply `LEO_VALIDATE_<SECTION>_<KEY>` variables onto the settings tree
fn apply_overrides(config: &mut toml::Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let rest = rest.to_lowercase();

        let Some((section, field)) = SECTIONS.iter().find_map(|section| {
            rest.strip_prefix(section)
                .and_then(|tail| tail.strip_prefix('_'))
                .filter(|field| !field.is_empty())
                .map(|field| (*section, field.to_string()))
        }) else {
            warn!(variable = %key, "ignoring override for unknown settings section");
            continue;
        };

        debug!(section, field = %field, "applying environment override");
        set_nested_value(config, section, &field, parse_env_value(&value));
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, section: &str, field: &str, value: toml::Value) {
    if let toml::Value::Table(table) = config {
        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        if let toml::Value::Table(section_table) = entry {
            section_table.insert(field.to_string(), value);
        }
    }
}
