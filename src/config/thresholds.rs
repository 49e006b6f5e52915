// src/config/thresholds.rs
//! Per-sensor threshold documents
//!
//! Each document lives under its own top-level section of a YAML file:
//!
//! ```yaml
//! imu:
//!   accel_x: 0.0
//!   accel_y: 0.0
//!   accel_z: 9.81
//!   accel_del: 0.5
//!   gyro_x: 0.0
//!   gyro_y: 0.0
//!   gyro_z: 0.0
//!   gyro_del: 0.05
//!   timeout: 5
//! ```

use crate::config::constants::validation;
use crate::config::loader::ConfigError;
use crate::hal::ImuReading;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A threshold document stored under `SECTION` in its file
pub trait ThresholdDocument: DeserializeOwned {
    /// Top-level key holding the document
    const SECTION: &'static str;

    /// Semantic checks run after parsing
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Closed interval of accepted values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low: f32,
    pub high: f32,
}

impl Band {
    /// `[expected - delta, expected + delta]`
    pub fn around(expected: f32, delta: f32) -> Self {
        Self {
            low: expected - delta,
            high: expected + delta,
        }
    }

    pub fn between(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Inclusive on both ends. NaN is never contained.
    pub fn contains(&self, value: f32) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// The six scalar IMU channels, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImuChannel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl ImuChannel {
    pub const ALL: [ImuChannel; 6] = [
        ImuChannel::AccelX,
        ImuChannel::AccelY,
        ImuChannel::AccelZ,
        ImuChannel::GyroX,
        ImuChannel::GyroY,
        ImuChannel::GyroZ,
    ];

    /// Read this channel out of a reading
    pub fn value(self, reading: &ImuReading) -> f32 {
        match self {
            ImuChannel::AccelX => reading.accel_x,
            ImuChannel::AccelY => reading.accel_y,
            ImuChannel::AccelZ => reading.accel_z,
            ImuChannel::GyroX => reading.gyro_x,
            ImuChannel::GyroY => reading.gyro_y,
            ImuChannel::GyroZ => reading.gyro_z,
        }
    }
}

impl fmt::Display for ImuChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImuChannel::AccelX => "accel_x",
            ImuChannel::AccelY => "accel_y",
            ImuChannel::AccelZ => "accel_z",
            ImuChannel::GyroX => "gyro_x",
            ImuChannel::GyroY => "gyro_y",
            ImuChannel::GyroZ => "gyro_z",
        };
        f.write_str(name)
    }
}

fn default_samples() -> u32 {
    validation::DEFAULT_SAMPLE_QUOTA
}

/// IMU expectations: every accel axis shares `accel_del`, every gyro axis `gyro_del`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuThresholds {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub accel_del: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
    pub gyro_del: f32,
    /// Seconds
    pub timeout: f64,
    #[serde(default = "default_samples")]
    pub samples: u32,
}

impl ImuThresholds {
    pub fn band(&self, channel: ImuChannel) -> Band {
        match channel {
            ImuChannel::AccelX => Band::around(self.accel_x, self.accel_del),
            ImuChannel::AccelY => Band::around(self.accel_y, self.accel_del),
            ImuChannel::AccelZ => Band::around(self.accel_z, self.accel_del),
            ImuChannel::GyroX => Band::around(self.gyro_x, self.gyro_del),
            ImuChannel::GyroY => Band::around(self.gyro_y, self.gyro_del),
            ImuChannel::GyroZ => Band::around(self.gyro_z, self.gyro_del),
        }
    }

    pub fn timeout(&self) -> Duration {
        seconds(self.timeout)
    }
}

impl ThresholdDocument for ImuThresholds {
    const SECTION: &'static str = "imu";

    fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("accel_x", self.accel_x),
            ("accel_y", self.accel_y),
            ("accel_z", self.accel_z),
            ("accel_del", self.accel_del),
            ("gyro_x", self.gyro_x),
            ("gyro_y", self.gyro_y),
            ("gyro_z", self.gyro_z),
            ("gyro_del", self.gyro_del),
        ];
        for (field, value) in values {
            require_finite(Self::SECTION, field, value)?;
        }
        require_non_negative(Self::SECTION, "accel_del", self.accel_del)?;
        require_non_negative(Self::SECTION, "gyro_del", self.gyro_del)?;
        validate_common(Self::SECTION, self.timeout, self.samples)
    }
}

/// Accepted battery voltage window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryThresholds {
    pub voltage_min: f32,
    pub voltage_max: f32,
    /// Seconds
    pub timeout: f64,
    #[serde(default = "default_samples")]
    pub samples: u32,
}

impl BatteryThresholds {
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout)
    }
}

impl ThresholdDocument for BatteryThresholds {
    const SECTION: &'static str = "battery";

    fn validate(&self) -> Result<(), ConfigError> {
        require_finite(Self::SECTION, "voltage_min", self.voltage_min)?;
        require_finite(Self::SECTION, "voltage_max", self.voltage_max)?;
        if self.voltage_min >= self.voltage_max {
            return Err(ConfigError::Invalid {
                component: Self::SECTION.to_string(),
                reason: format!(
                    "voltage_min ({}) must be below voltage_max ({})",
                    self.voltage_min, self.voltage_max
                ),
            });
        }
        validate_common(Self::SECTION, self.timeout, self.samples)
    }
}

/// Motor validation parameters, kept as an open mapping until encoder and
/// torque checks define their criteria
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorValidation {
    #[serde(flatten)]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl ThresholdDocument for MotorValidation {
    const SECTION: &'static str = "motor";

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl fmt::Display for MotorValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.parameters {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            let rendered = serde_yaml::to_string(value).map_err(|_| fmt::Error)?;
            write!(f, "{}: {}", key, rendered.trim_end())?;
        }
        Ok(())
    }
}

fn require_finite(component: &str, field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            component: component.to_string(),
            reason: format!("{} must be a finite number, got {}", field, value),
        })
    }
}

fn require_non_negative(component: &str, field: &str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            component: component.to_string(),
            reason: format!("{} must not be negative, got {}", field, value),
        })
    }
}

/// Saturating seconds to `Duration`; negative and NaN map to zero
fn seconds(value: f64) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn validate_common(component: &str, timeout: f64, samples: u32) -> Result<(), ConfigError> {
    if !timeout.is_finite() || timeout <= 0.0 || timeout > validation::MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid {
            component: component.to_string(),
            reason: format!(
                "timeout must be within (0, {}] seconds, got {}",
                validation::MAX_TIMEOUT_SECS,
                timeout
            ),
        });
    }
    if samples == 0 {
        return Err(ConfigError::Invalid {
            component: component.to_string(),
            reason: "samples must be greater than 0".to_string(),
        });
    }
    Ok(())
}
