// src/validation/imu.rs
//! IMU accelerometer and gyroscope check

use crate::acquisition::SampleMailbox;
use crate::config::{ConfigLoader, ImuChannel, ImuThresholds, TimeoutPolicy, ValidationSettings};
use crate::hal::ImuReading;
use crate::validation::{CheckOutcome, FailureReason, SampleCheck, SampleValidator};
use tracing::{error, info};

/// Rejects a reading when any channel leaves its band
#[derive(Debug, Clone)]
pub struct ImuCheck {
    thresholds: ImuThresholds,
}

impl ImuCheck {
    pub fn new(thresholds: ImuThresholds) -> Self {
        Self { thresholds }
    }
}

impl SampleCheck<ImuReading> for ImuCheck {
    fn inspect(&self, sample: &ImuReading) -> Result<(), FailureReason> {
        for channel in ImuChannel::ALL {
            let band = self.thresholds.band(channel);
            let value = channel.value(sample);
            if !band.contains(value) {
                return Err(FailureReason::OutOfRange {
                    channel,
                    value,
                    band,
                });
            }
        }
        Ok(())
    }
}

pub fn run_imu_check(
    mailbox: &SampleMailbox<ImuReading>,
    thresholds: &ImuThresholds,
    policy: TimeoutPolicy,
) -> CheckOutcome {
    let validator = SampleValidator::new(thresholds.samples, thresholds.timeout()).with_policy(policy);
    validator.run(mailbox, &ImuCheck::new(thresholds.clone()))
}

/// Load IMU thresholds and run the check
pub fn check_imu(mailbox: &SampleMailbox<ImuReading>, settings: &ValidationSettings) -> CheckOutcome {
    let path = settings.imu_path();
    let thresholds = match ConfigLoader::load_thresholds::<ImuThresholds>(&path) {
        Ok(thresholds) => thresholds,
        Err(e) => {
            error!(path = %path.display(), error = %e, "IMU thresholds unavailable");
            return CheckOutcome::Failed(e.into());
        }
    };

    info!(
        accel_del = thresholds.accel_del,
        gyro_del = thresholds.gyro_del,
        samples = thresholds.samples,
        "checking IMU"
    );
    run_imu_check(mailbox, &thresholds, settings.timeout_policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ImuThresholds {
        ImuThresholds {
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 9.81,
            accel_del: 0.5,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            gyro_del: 0.1,
            timeout: 1.0,
            samples: 3,
        }
    }

    fn level() -> ImuReading {
        ImuReading {
            accel_z: 9.81,
            ..ImuReading::default()
        }
    }

    #[test]
    fn test_level_reading_passes() {
        assert!(ImuCheck::new(thresholds()).inspect(&level()).is_ok());
    }

    #[test]
    fn test_band_edges_pass() {
        let reading = ImuReading {
            accel_x: 0.5,
            accel_y: -0.5,
            gyro_z: 0.1,
            ..level()
        };
        assert!(ImuCheck::new(thresholds()).inspect(&reading).is_ok());
    }

    #[test]
    fn test_each_channel_fails_on_its_own() {
        let check = ImuCheck::new(thresholds());
        for channel in ImuChannel::ALL {
            let mut reading = level();
            match channel {
                ImuChannel::AccelX => reading.accel_x = 2.0,
                ImuChannel::AccelY => reading.accel_y = 2.0,
                ImuChannel::AccelZ => reading.accel_z = 2.0,
                ImuChannel::GyroX => reading.gyro_x = 2.0,
                ImuChannel::GyroY => reading.gyro_y = 2.0,
                ImuChannel::GyroZ => reading.gyro_z = 2.0,
            }

            match check.inspect(&reading) {
                Err(FailureReason::OutOfRange { channel: failed, value, .. }) => {
                    assert_eq!(failed, channel);
                    assert_eq!(value, 2.0);
                }
                other => panic!("{} should fail, got {:?}", channel, other),
            }
        }
    }

    #[test]
    fn test_first_failing_channel_is_reported() {
        let reading = ImuReading {
            accel_y: 3.0,
            gyro_x: 3.0,
            ..level()
        };
        let failure = ImuCheck::new(thresholds()).inspect(&reading).unwrap_err();
        assert!(matches!(
            failure,
            FailureReason::OutOfRange {
                channel: ImuChannel::AccelY,
                ..
            }
        ));
    }
}
