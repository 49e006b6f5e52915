// src/hal/mod.rs
//! Firmware bus abstraction

pub mod traits;
pub mod types;
pub mod simulator;

pub use traits::*;
pub use types::*;
pub use simulator::{SimulatedBus, SimulatorConfig, SimulatorProfile};
