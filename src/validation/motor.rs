// src/validation/motor.rs
//! Encoder, torque and motor load routines
//!
//! Encoder and torque checks have no acceptance criterion yet; they load the
//! motor validation document and report [`CheckOutcome::NotImplemented`].
//! The load test drives a duty ramp on every wheel and leaves the verdict to
//! the operator.

use crate::config::{ConfigLoader, MotorLoadSettings, MotorValidation, ValidationSettings};
use crate::hal::{FirmwareBus, HalError, Wheel};
use crate::validation::{CheckOutcome, Subsystem};
use std::thread;
use tracing::{debug, error, info, warn};

fn motor_stub(subsystem: Subsystem, settings: &ValidationSettings) -> CheckOutcome {
    let path = settings.motor_path();
    match ConfigLoader::load_thresholds::<MotorValidation>(&path) {
        Ok(document) => {
            info!(%subsystem, parameters = %document, "motor validation parameters");
            CheckOutcome::NotImplemented
        }
        Err(e) => {
            error!(%subsystem, path = %path.display(), error = %e, "motor validation parameters unavailable");
            CheckOutcome::Failed(e.into())
        }
    }
}

pub fn check_encoder(settings: &ValidationSettings) -> CheckOutcome {
    motor_stub(Subsystem::Encoder, settings)
}

pub fn check_torque(settings: &ValidationSettings) -> CheckOutcome {
    motor_stub(Subsystem::Torque, settings)
}

/// Ramp the PWM duty of all four wheels from `ramp_start` to `ramp_end`.
///
/// Each step is published to every wheel and held for `step_interval`. A
/// final zero duty stops the wheels, also after a failed publish.
pub fn check_motor_load<B: FirmwareBus + ?Sized>(bus: &B, settings: &MotorLoadSettings) -> CheckOutcome {
    let mut commands_sent = 0u32;
    let mut steps = 0u32;
    info!(
        expected_steps = settings.step_count(),
        ramp_start = settings.ramp_start,
        ramp_end = settings.ramp_end,
        "starting motor load ramp"
    );

    let ramp = (settings.ramp_start..=settings.ramp_end).try_for_each(|duty| {
        for wheel in Wheel::ALL {
            bus.publish_wheel_duty(wheel, duty as f32)?;
            commands_sent += 1;
        }
        steps += 1;
        debug!(duty, "duty step sent");
        thread::sleep(settings.step_interval());
        Ok::<(), HalError>(())
    });

    let stop = Wheel::ALL.into_iter().try_for_each(|wheel| {
        bus.publish_wheel_duty(wheel, 0.0)?;
        commands_sent += 1;
        Ok::<(), HalError>(())
    });

    match ramp.and(stop) {
        Ok(()) => {
            info!(steps, commands_sent, "motor load ramp finished");
            CheckOutcome::ManualInspection { steps, commands_sent }
        }
        Err(e) => {
            warn!(steps, error = %e, "motor load ramp interrupted");
            CheckOutcome::Failed(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::simulator::PublishedCommand;
    use crate::hal::SimulatedBus;
    use crate::validation::{FailureReason, ReasonCode};

    fn fast_ramp(start: u32, end: u32) -> MotorLoadSettings {
        MotorLoadSettings {
            ramp_start: start,
            ramp_end: end,
            step_interval_ms: 1,
        }
    }

    #[test]
    fn test_ramp_reaches_every_wheel() {
        let bus = SimulatedBus::healthy();
        bus.init_node("motor_test", false).unwrap();

        let outcome = check_motor_load(&bus, &fast_ramp(1, 19));
        assert_eq!(
            outcome,
            CheckOutcome::ManualInspection {
                steps: 19,
                commands_sent: 80,
            }
        );

        let duties: Vec<(Wheel, f32)> = bus
            .published_commands()
            .into_iter()
            .filter_map(|command| match command {
                PublishedCommand::WheelDuty { wheel, duty } => Some((wheel, duty)),
                _ => None,
            })
            .collect();
        assert_eq!(duties.len(), 80);
        assert_eq!(duties[0], (Wheel::ALL[0], 1.0));
        assert_eq!(duties[75].1, 19.0);
        assert!(duties[76..].iter().all(|(_, duty)| *duty == 0.0));
    }

    #[test]
    fn test_ramp_without_node_fails() {
        let bus = SimulatedBus::healthy();

        let outcome = check_motor_load(&bus, &fast_ramp(1, 3));
        assert_eq!(outcome.failure().map(FailureReason::code), Some(ReasonCode::Bus));
        assert!(bus.published_commands().is_empty());
    }

    #[test]
    fn test_encoder_and_torque_report_not_implemented() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("motor.yaml"),
            "motor:\n  wheel_speed_limit: 0.05\n  encoder_resolution: 878.4\n",
        )
        .unwrap();
        let settings = ValidationSettings {
            threshold_dir: dir.path().to_path_buf(),
            ..ValidationSettings::default()
        };

        assert_eq!(check_encoder(&settings), CheckOutcome::NotImplemented);
        assert_eq!(check_torque(&settings), CheckOutcome::NotImplemented);
    }

    #[test]
    fn test_missing_motor_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ValidationSettings {
            threshold_dir: dir.path().to_path_buf(),
            ..ValidationSettings::default()
        };

        let outcome = check_encoder(&settings);
        assert_eq!(
            outcome.failure().map(FailureReason::code),
            Some(ReasonCode::InvalidConfig)
        );
    }
}
