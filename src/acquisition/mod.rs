// src/acquisition/mod.rs
//! Sample buffering between bus callbacks and validators

pub mod mailbox;

pub use mailbox::*;

use crate::hal::{BatteryVoltage, FirmwareBus, HalError, ImuReading, WheelStates};
use std::sync::Arc;
use tracing::debug;

/// One mailbox per monitored firmware topic
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    pub imu: Arc<SampleMailbox<ImuReading>>,
    pub wheel_states: Arc<SampleMailbox<WheelStates>>,
    pub battery: Arc<SampleMailbox<BatteryVoltage>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one callback per topic feeding the matching mailbox
    pub fn attach<B: FirmwareBus + ?Sized>(&self, bus: &B) -> Result<(), HalError> {
        let imu = Arc::clone(&self.imu);
        bus.subscribe_imu(Box::new(move |reading| imu.publish(reading)))?;

        let wheel_states = Arc::clone(&self.wheel_states);
        bus.subscribe_wheel_states(Box::new(move |states| wheel_states.publish(states)))?;

        let battery = Arc::clone(&self.battery);
        bus.subscribe_battery(Box::new(move |voltage| battery.publish(voltage)))?;

        debug!("sample buffer attached to firmware topics");
        Ok(())
    }
}
