// src/hal/traits.rs
//! Contracts for the message bus and the board collaborators

use crate::hal::types::{BatteryVoltage, BoardType, ImuReading, Twist, Wheel, WheelStates};
use thiserror::Error;

/// Callback invoked by the bus runtime for every delivered message
pub type Callback<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Bus level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    #[error("bus master is not reachable")]
    MasterOffline,
    #[error("node '{0}' is not registered on the bus")]
    NodeNotRegistered(String),
    #[error("publishing on '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },
    #[error("subscribing to '{topic}' failed: {reason}")]
    SubscribeFailed { topic: String, reason: String },
}

/// Pub/sub and graph operations of the message bus the firmware bridge lives on
pub trait FirmwareBus: Send + Sync {
    /// Whether the bus master answers
    fn is_master_online(&self) -> bool;

    /// Fully resolved names of all registered nodes
    fn node_names(&self) -> Result<Vec<String>, HalError>;

    /// Resolve a relative node name against the current namespace
    fn resolve_name(&self, name: &str) -> String {
        if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/{}", name)
        }
    }

    /// Register this process on the bus
    fn init_node(&self, name: &str, anonymous: bool) -> Result<(), HalError>;

    fn subscribe_imu(&self, callback: Callback<ImuReading>) -> Result<(), HalError>;

    fn subscribe_wheel_states(&self, callback: Callback<WheelStates>) -> Result<(), HalError>;

    fn subscribe_battery(&self, callback: Callback<BatteryVoltage>) -> Result<(), HalError>;

    fn publish_cmd_vel(&self, command: Twist) -> Result<(), HalError>;

    /// Send a raw PWM duty command to one wheel
    fn publish_wheel_duty(&self, wheel: Wheel, duty: f32) -> Result<(), HalError>;
}

/// Board identification calls served by the firmware bridge
pub trait BoardInspector: Send + Sync {
    /// `None` when the board could not be identified
    fn determine_board(&self) -> Option<BoardType>;

    /// `None` when the firmware did not report a version
    fn firmware_version(&self) -> Option<String>;
}
