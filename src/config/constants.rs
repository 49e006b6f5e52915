// src/config/constants.rs
//! Tool-wide constants

/// Bus topic and node names
pub mod topics {
    pub const IMU: &str = "firmware/imu";
    pub const WHEEL_STATES: &str = "firmware/wheel_states";
    pub const BATTERY: &str = "firmware/battery";
    pub const CMD_VEL: &str = "cmd_vel";

    pub const DEFAULT_BRIDGE_NODE: &str = "serial_node";
    pub const DEFAULT_NODE_NAME: &str = "leo_core_validation";
}

/// Sampling validator defaults
pub mod validation {
    pub const DEFAULT_SAMPLE_QUOTA: u32 = 50;
    /// Longest accepted per-check timeout, seconds
    pub const MAX_TIMEOUT_SECS: f64 = 3600.0;
    pub const DEFAULT_THRESHOLD_DIR: &str = "validate";
    pub const IMU_FILE: &str = "imu.yaml";
    pub const BATTERY_FILE: &str = "battery.yaml";
    pub const MOTOR_FILE: &str = "motor.yaml";
}

/// Motor load ramp defaults
pub mod motor_load {
    pub const DEFAULT_RAMP_START: u32 = 1;
    pub const DEFAULT_RAMP_END: u32 = 19;
    pub const DEFAULT_STEP_INTERVAL_MS: u64 = 100;
    pub const MAX_DUTY: u32 = 100;
}

/// Simulated bus defaults
pub mod simulator {
    pub const DEFAULT_PUBLISH_RATE_HZ: u32 = 100;
    pub const DEFAULT_BATTERY_VOLTAGE: f32 = 12.1;
    pub const DEFAULT_GRAVITY: f32 = 9.81;
    pub const DEFAULT_FIRMWARE_VERSION: &str = "1.2.0";
}

/// Settings discovery
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/leo-validate/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/leo-validate";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "LEO_VALIDATE_";
}
