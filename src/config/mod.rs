// src/config/mod.rs
//! Tool settings and threshold documents

pub mod constants;
pub mod loader;
pub mod thresholds;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use thresholds::*;

use crate::hal::simulator::SimulatorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete tool configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ValidatorSettings {
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub motor_load: MotorLoadSettings,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// How this tool appears on the bus
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BusSettings {
    /// Node that bridges the firmware onto the bus
    #[serde(default = "defaults::bridge_node")]
    pub bridge_node: String,

    #[serde(default = "defaults::node_name")]
    pub node_name: String,

    #[serde(default = "defaults::anonymous")]
    pub anonymous: bool,
}

/// When a sampling validator gives up
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Deadline measured from validator start
    Overall,
    /// Deadline measured from the most recent sample
    SampleGap,
}

/// Threshold file locations and sampling behaviour
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ValidationSettings {
    #[serde(default = "defaults::threshold_dir")]
    pub threshold_dir: PathBuf,

    #[serde(default = "defaults::imu_file")]
    pub imu_file: String,

    #[serde(default = "defaults::battery_file")]
    pub battery_file: String,

    #[serde(default = "defaults::motor_file")]
    pub motor_file: String,

    #[serde(default = "defaults::timeout_policy")]
    pub timeout_policy: TimeoutPolicy,
}

/// Duty ramp issued by the motor load routine
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MotorLoadSettings {
    #[serde(default = "defaults::ramp_start")]
    pub ramp_start: u32,

    #[serde(default = "defaults::ramp_end")]
    pub ramp_end: u32,

    #[serde(default = "defaults::step_interval_ms")]
    pub step_interval_ms: u64,
}

/// Default value providers using constants
mod defaults {
    use super::TimeoutPolicy;
    use crate::config::constants::*;
    use std::path::PathBuf;

    pub fn bridge_node() -> String { topics::DEFAULT_BRIDGE_NODE.to_string() }
    pub fn node_name() -> String { topics::DEFAULT_NODE_NAME.to_string() }
    pub fn anonymous() -> bool { true }

    pub fn threshold_dir() -> PathBuf { PathBuf::from(validation::DEFAULT_THRESHOLD_DIR) }
    pub fn imu_file() -> String { validation::IMU_FILE.to_string() }
    pub fn battery_file() -> String { validation::BATTERY_FILE.to_string() }
    pub fn motor_file() -> String { validation::MOTOR_FILE.to_string() }
    pub fn timeout_policy() -> TimeoutPolicy { TimeoutPolicy::Overall }

    pub fn ramp_start() -> u32 { motor_load::DEFAULT_RAMP_START }
    pub fn ramp_end() -> u32 { motor_load::DEFAULT_RAMP_END }
    pub fn step_interval_ms() -> u64 { motor_load::DEFAULT_STEP_INTERVAL_MS }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            bridge_node: defaults::bridge_node(),
            node_name: defaults::node_name(),
            anonymous: defaults::anonymous(),
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            threshold_dir: defaults::threshold_dir(),
            imu_file: defaults::imu_file(),
            battery_file: defaults::battery_file(),
            motor_file: defaults::motor_file(),
            timeout_policy: defaults::timeout_policy(),
        }
    }
}

impl Default for MotorLoadSettings {
    fn default() -> Self {
        Self {
            ramp_start: defaults::ramp_start(),
            ramp_end: defaults::ramp_end(),
            step_interval_ms: defaults::step_interval_ms(),
        }
    }
}

impl ValidationSettings {
    pub fn imu_path(&self) -> PathBuf {
        self.threshold_dir.join(&self.imu_file)
    }

    pub fn battery_path(&self) -> PathBuf {
        self.threshold_dir.join(&self.battery_file)
    }

    pub fn motor_path(&self) -> PathBuf {
        self.threshold_dir.join(&self.motor_file)
    }
}

impl MotorLoadSettings {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// Number of duty steps in the ramp
    pub fn step_count(&self) -> u32 {
        self.ramp_end.saturating_add(1).saturating_sub(self.ramp_start)
    }
}

impl ValidatorSettings {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.bus.bridge_node.trim().is_empty() {
            errors.push("bus.bridge_node cannot be empty".to_string());
        } else if self.simulator.bridge_node != self.bus.bridge_node {
            errors.push(format!(
                "simulator.bridge_node ({}) must match bus.bridge_node ({})",
                self.simulator.bridge_node, self.bus.bridge_node
            ));
        }
        if self.bus.node_name.trim().is_empty() {
            errors.push("bus.node_name cannot be empty".to_string());
        }

        if self.motor_load.ramp_start > self.motor_load.ramp_end {
            errors.push(format!(
                "motor_load.ramp_start ({}) must not exceed ramp_end ({})",
                self.motor_load.ramp_start, self.motor_load.ramp_end
            ));
        }
        if self.motor_load.ramp_end > motor_load::MAX_DUTY {
            errors.push(format!(
                "motor_load.ramp_end ({}) exceeds the maximum duty of {}",
                self.motor_load.ramp_end,
                motor_load::MAX_DUTY
            ));
        }
        if self.motor_load.step_interval_ms == 0 {
            errors.push("motor_load.step_interval_ms must be greater than 0".to_string());
        }

        if let Err(reason) = self.simulator.validate() {
            errors.push(format!("simulator: {}", reason));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ValidatorSettings::default();
        assert_eq!(settings.bus.bridge_node, "serial_node");
        assert_eq!(settings.bus.node_name, "leo_core_validation");
        assert_eq!(settings.validation.timeout_policy, TimeoutPolicy::Overall);
        assert_eq!(settings.motor_load.step_count(), 19);
        assert!(settings.validate_consistency().is_ok());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = ValidatorSettings::default();
        let toml_str = toml::to_string(&settings).unwrap();
        let deserialized: ValidatorSettings = toml::from_str(&toml_str).unwrap();

        assert_eq!(settings, deserialized);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: ValidatorSettings = toml::from_str(
            r#"
[validation]
timeout_policy = "sample_gap"
"#,
        )
        .unwrap();
        assert_eq!(settings.validation.timeout_policy, TimeoutPolicy::SampleGap);
        assert_eq!(settings.validation.imu_file, "imu.yaml");
        assert_eq!(settings.bus, BusSettings::default());
    }

    #[test]
    fn test_threshold_paths() {
        let settings = ValidationSettings {
            threshold_dir: PathBuf::from("/opt/leo/validate"),
            ..ValidationSettings::default()
        };
        assert_eq!(settings.imu_path(), PathBuf::from("/opt/leo/validate/imu.yaml"));
        assert_eq!(settings.motor_path(), PathBuf::from("/opt/leo/validate/motor.yaml"));
    }

    #[test]
    fn test_consistency_errors() {
        let mut settings = ValidatorSettings::default();
        settings.motor_load.ramp_start = 30;
        settings.motor_load.ramp_end = 20;
        settings.motor_load.step_interval_ms = 0;
        settings.bus.bridge_node = " ".to_string();

        let errors = settings.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_simulated_bridge_must_match_bus() {
        let mut settings = ValidatorSettings::default();
        settings.bus.bridge_node = "firmware_bridge".to_string();

        let errors = settings.validate_consistency().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("simulator.bridge_node (serial_node)"));

        settings.simulator.bridge_node = "firmware_bridge".to_string();
        assert!(settings.validate_consistency().is_ok());
    }

    #[test]
    fn test_step_count_saturates() {
        let mut settings = MotorLoadSettings::default();
        settings.ramp_start = 0;
        settings.ramp_end = u32::MAX;
        assert_eq!(settings.step_count(), u32::MAX);

        settings.ramp_start = 5;
        settings.ramp_end = 5;
        assert_eq!(settings.step_count(), 1);
    }
}
