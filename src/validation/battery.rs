// src/validation/battery.rs
//! Battery voltage check

use crate::acquisition::SampleMailbox;
use crate::config::{BatteryThresholds, ConfigLoader, TimeoutPolicy, ValidationSettings};
use crate::hal::BatteryVoltage;
use crate::validation::{CheckOutcome, FailureReason, SampleCheck, SampleValidator};
use tracing::{error, info};

/// Rejects voltages at or outside the configured window.
///
/// Both limits are exclusive, unlike the closed IMU bands. `voltage_min` and
/// `voltage_max` are cutoff voltages rather than the edges of an accepted
/// band, so a reading equal to `voltage_min` is LOW and one equal to
/// `voltage_max` is HIGH. A NaN reading is LOW.
#[derive(Debug, Clone)]
pub struct BatteryCheck {
    thresholds: BatteryThresholds,
}

impl BatteryCheck {
    pub fn new(thresholds: BatteryThresholds) -> Self {
        Self { thresholds }
    }
}

impl SampleCheck<BatteryVoltage> for BatteryCheck {
    fn inspect(&self, sample: &BatteryVoltage) -> Result<(), FailureReason> {
        let voltage = sample.voltage;
        // both limits are exclusive; NaN reads as low
        if !(voltage > self.thresholds.voltage_min) {
            return Err(FailureReason::LowVoltage {
                voltage,
                min: self.thresholds.voltage_min,
            });
        }
        if voltage >= self.thresholds.voltage_max {
            return Err(FailureReason::HighVoltage {
                voltage,
                max: self.thresholds.voltage_max,
            });
        }
        Ok(())
    }
}

/// Run the battery check against already loaded thresholds
pub fn run_battery_check(
    mailbox: &SampleMailbox<BatteryVoltage>,
    thresholds: &BatteryThresholds,
    policy: TimeoutPolicy,
) -> CheckOutcome {
    let validator = SampleValidator::new(thresholds.samples, thresholds.timeout()).with_policy(policy);
    validator.run(mailbox, &BatteryCheck::new(thresholds.clone()))
}

/// Load battery thresholds and run the check
pub fn check_battery(
    mailbox: &SampleMailbox<BatteryVoltage>,
    settings: &ValidationSettings,
) -> CheckOutcome {
    let path = settings.battery_path();
    let thresholds = match ConfigLoader::load_thresholds::<BatteryThresholds>(&path) {
        Ok(thresholds) => thresholds,
        Err(e) => {
            error!(path = %path.display(), error = %e, "battery thresholds unavailable");
            return CheckOutcome::Failed(e.into());
        }
    };

    info!(
        min = thresholds.voltage_min,
        max = thresholds.voltage_max,
        samples = thresholds.samples,
        "checking battery voltage"
    );
    run_battery_check(mailbox, &thresholds, settings.timeout_policy)
}
