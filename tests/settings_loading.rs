// tests/settings_loading.rs
//! Layered settings: files, environment overrides, shipped defaults

use leo_validate::config::{ConfigError, ConfigLoader, ImuThresholds, BatteryThresholds, MotorValidation, TimeoutPolicy};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn settings_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create settings file");
    write!(file, "{}", content).expect("Failed to write settings file");
    file
}

fn clear_overrides() {
    for (key, _) in std::env::vars() {
        if key.starts_with("LEO_VALIDATE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_later_files_override_earlier_ones() {
    clear_overrides();
    let base = settings_file("[motor_load]\nramp_end = 10\nstep_interval_ms = 50\n");
    let local = settings_file("[motor_load]\nstep_interval_ms = 20\n");

    let settings = ConfigLoader::with_paths(vec![base.path().to_path_buf(), local.path().to_path_buf()])
        .load_settings()
        .unwrap();

    assert_eq!(settings.motor_load.ramp_end, 10);
    assert_eq!(settings.motor_load.step_interval_ms, 20);
    assert_eq!(settings.motor_load.ramp_start, 1);
}

#[test]
#[serial]
fn test_environment_overrides_files() {
    clear_overrides();
    let file = settings_file("[validation]\ntimeout_policy = \"overall\"\n[bus]\nanonymous = true\n");
    std::env::set_var("LEO_VALIDATE_VALIDATION_TIMEOUT_POLICY", "sample_gap");
    std::env::set_var("LEO_VALIDATE_BUS_ANONYMOUS", "false");
    std::env::set_var("LEO_VALIDATE_MOTOR_LOAD_STEP_INTERVAL_MS", "5");
    std::env::set_var("LEO_VALIDATE_SIMULATOR_BATTERY_VOLTAGE", "11.5");

    let result = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load_settings();
    clear_overrides();
    let settings = result.unwrap();

    assert_eq!(settings.validation.timeout_policy, TimeoutPolicy::SampleGap);
    assert!(!settings.bus.anonymous);
    assert_eq!(settings.motor_load.step_interval_ms, 5);
    assert_eq!(settings.simulator.battery_voltage, 11.5);
}

#[test]
#[serial]
fn test_environment_can_be_ignored() {
    clear_overrides();
    std::env::set_var("LEO_VALIDATE_MOTOR_LOAD_RAMP_END", "5");

    let result = ConfigLoader::with_paths(Vec::new()).without_environment().load_settings();
    clear_overrides();

    assert_eq!(result.unwrap().motor_load.ramp_end, 19);
}

#[test]
#[serial]
fn test_inconsistent_settings_are_rejected() {
    clear_overrides();
    let file = settings_file("[motor_load]\nramp_start = 20\nramp_end = 5\n");

    let result = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load_settings();

    assert!(matches!(result, Err(ConfigError::Inconsistent(errors)) if errors.len() == 1));
}

#[test]
#[serial]
fn test_malformed_settings_file_fails_loudly() {
    clear_overrides();
    let file = settings_file("[motor_load\nramp_end = ");

    let result = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load_settings();

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
#[serial]
fn test_shipped_defaults_load() {
    clear_overrides();
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let settings = ConfigLoader::with_paths(vec![root.join("config/default.toml")])
        .load_settings()
        .unwrap();
    assert_eq!(settings, leo_validate::ValidatorSettings::default());

    let validate = root.join("validate");
    let imu: ImuThresholds = ConfigLoader::load_thresholds(&validate.join("imu.yaml")).unwrap();
    assert_eq!(imu.samples, 50);
    assert_eq!(imu.accel_z, 9.81);

    let battery: BatteryThresholds = ConfigLoader::load_thresholds(&validate.join("battery.yaml")).unwrap();
    assert!(battery.voltage_min < battery.voltage_max);

    let motor: MotorValidation = ConfigLoader::load_thresholds(&validate.join("motor.yaml")).unwrap();
    assert!(motor.parameters.contains_key("wheel_speed_limit"));
}
