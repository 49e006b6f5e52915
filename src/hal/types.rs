// src/hal/types.rs
//! Message and board types exchanged with the firmware bridge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw IMU reading published on `firmware/imu`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImuReading {
    pub stamp: f64,
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

/// Per-wheel state published on `firmware/wheel_states`.
///
/// Arrays are indexed in [`Wheel::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelStates {
    pub stamp: f64,
    pub position: [f32; 4],
    pub velocity: [f32; 4],
    pub torque: [f32; 4],
    pub pwm_duty_cycle: [f32; 4],
}

/// Battery voltage published on `firmware/battery`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryVoltage {
    pub voltage: f32,
}

/// Robot velocity command published on `cmd_vel`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub linear_x: f32,
    pub angular_z: f32,
}

/// Wheel positions on the rover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wheel {
    FrontLeft,
    RearLeft,
    FrontRight,
    RearRight,
}

impl Wheel {
    /// Wheels in firmware array order
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::RearLeft,
        Wheel::FrontRight,
        Wheel::RearRight,
    ];

    /// Short firmware label (`FL`, `RL`, ...)
    pub fn label(self) -> &'static str {
        match self {
            Wheel::FrontLeft => "FL",
            Wheel::RearLeft => "RL",
            Wheel::FrontRight => "FR",
            Wheel::RearRight => "RR",
        }
    }

    /// Topic accepting PWM duty commands for this wheel
    pub fn duty_topic(self) -> String {
        format!("firmware/wheel_{}/cmd_pwm_duty", self.label())
    }

    /// Index into [`WheelStates`] arrays
    pub fn index(self) -> usize {
        match self {
            Wheel::FrontLeft => 0,
            Wheel::RearLeft => 1,
            Wheel::FrontRight => 2,
            Wheel::RearRight => 3,
        }
    }
}

impl fmt::Display for Wheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wheel_{}", self.label())
    }
}

/// Controller board models the firmware can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Core2,
    LeoCore,
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardType::Core2 => write!(f, "Core2ROS"),
            BoardType::LeoCore => write!(f, "LeoCore"),
        }
    }
}

impl FromStr for BoardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "core2" | "core2ros" => Ok(BoardType::Core2),
            "leocore" => Ok(BoardType::LeoCore),
            other => Err(format!("unknown board type '{}'", other)),
        }
    }
}
