// tests/common/mod.rs
//! Shared fixtures for integration tests

#![allow(dead_code)]

use leo_validate::config::{ValidationSettings, ValidatorSettings};
use leo_validate::hal::{SimulatedBus, SimulatorConfig, SimulatorProfile};
use std::fs;
use tempfile::TempDir;

pub const IMU_YAML: &str = r#"
imu:
  accel_x: 0.0
  accel_y: 0.0
  accel_z: 9.81
  accel_del: 0.5
  gyro_x: 0.0
  gyro_y: 0.0
  gyro_z: 0.0
  gyro_del: 0.05
  timeout: 5
"#;

pub const BATTERY_YAML: &str = r#"
battery:
  voltage_min: 10.0
  voltage_max: 13.0
  timeout: 5
"#;

pub const MOTOR_YAML: &str = r#"
motor:
  wheel_speed_limit: 0.05
  encoder_resolution: 878.4
"#;

/// Threshold directory populated with the given documents
pub fn threshold_dir(imu: &str, battery: &str, motor: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create threshold dir");
    fs::write(dir.path().join("imu.yaml"), imu).expect("Failed to write imu.yaml");
    fs::write(dir.path().join("battery.yaml"), battery).expect("Failed to write battery.yaml");
    fs::write(dir.path().join("motor.yaml"), motor).expect("Failed to write motor.yaml");
    dir
}

pub fn default_thresholds() -> TempDir {
    threshold_dir(IMU_YAML, BATTERY_YAML, MOTOR_YAML)
}

/// Settings reading thresholds from `dir`, with a fast motor ramp
pub fn settings_for(dir: &TempDir) -> ValidatorSettings {
    let mut settings = ValidatorSettings::default();
    settings.validation = ValidationSettings {
        threshold_dir: dir.path().to_path_buf(),
        ..ValidationSettings::default()
    };
    settings.motor_load.step_interval_ms = 1;
    settings
}

/// Seeded simulated bus streaming at 200 Hz
pub fn streaming_bus(profile: SimulatorProfile) -> SimulatedBus {
    let config = SimulatorConfig {
        publish_rate_hz: 200,
        seed: Some(42),
        ..SimulatorConfig::default()
    };
    let bus = SimulatedBus::new(profile.apply(config));
    bus.start_streaming();
    bus
}
