// src/validation/mod.rs
//! Sampling validators for the board subsystems
//!
//! Every sampling check follows the same loop: wait for a fresh sample,
//! inspect it against the configured thresholds, stop at the first bad
//! sample, pass once the sample quota is met, fail when the deadline
//! expires first. Waiting blocks on the sample mailbox; nothing spins.

pub mod battery;
pub mod imu;
pub mod motor;

pub use battery::{check_battery, run_battery_check, BatteryCheck};
pub use imu::{check_imu, run_imu_check, ImuCheck};
pub use motor::{check_encoder, check_motor_load, check_torque};

use crate::acquisition::SampleMailbox;
use crate::config::{Band, ConfigError, ImuChannel, TimeoutPolicy};
use crate::hal::HalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Board subsystems covered by the acceptance run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Battery,
    Imu,
    Encoder,
    Torque,
    MotorLoad,
}

impl Subsystem {
    /// Execution order of a full run
    pub const ORDER: [Subsystem; 5] = [
        Subsystem::Battery,
        Subsystem::Imu,
        Subsystem::Encoder,
        Subsystem::Torque,
        Subsystem::MotorLoad,
    ];

    /// Operator-facing step label
    pub fn label(self) -> &'static str {
        match self {
            Subsystem::Battery => "Battery validation",
            Subsystem::Imu => "IMU validation",
            Subsystem::Encoder => "Encoders validation",
            Subsystem::Torque => "Torque sensors validation",
            Subsystem::MotorLoad => "Motor load test",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Battery => "battery",
            Subsystem::Imu => "imu",
            Subsystem::Encoder => "encoder",
            Subsystem::Torque => "torque",
            Subsystem::MotorLoad => "motor_load",
        };
        f.write_str(name)
    }
}

/// Hardware selection accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareSelector {
    HBridge,
    Encoder,
    Torque,
    Imu,
    Battery,
    #[default]
    All,
}

impl HardwareSelector {
    pub const VARIANTS: [&'static str; 6] = ["h_bridge", "encoder", "torque", "imu", "battery", "all"];

    /// Whether `subsystem` runs under this selection.
    ///
    /// The motor load ramp drives the wheels, so it only runs when the
    /// H-bridge is selected explicitly.
    pub fn includes(self, subsystem: Subsystem) -> bool {
        match (self, subsystem) {
            (HardwareSelector::All, Subsystem::MotorLoad) => false,
            (HardwareSelector::All, _) => true,
            (HardwareSelector::HBridge, Subsystem::MotorLoad) => true,
            (HardwareSelector::Encoder, Subsystem::Encoder) => true,
            (HardwareSelector::Torque, Subsystem::Torque) => true,
            (HardwareSelector::Imu, Subsystem::Imu) => true,
            (HardwareSelector::Battery, Subsystem::Battery) => true,
            _ => false,
        }
    }

    /// Selected subsystems in execution order
    pub fn subsystems(self) -> Vec<Subsystem> {
        Subsystem::ORDER
            .into_iter()
            .filter(|subsystem| self.includes(*subsystem))
            .collect()
    }
}

impl fmt::Display for HardwareSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareSelector::HBridge => "h_bridge",
            HardwareSelector::Encoder => "encoder",
            HardwareSelector::Torque => "torque",
            HardwareSelector::Imu => "imu",
            HardwareSelector::Battery => "battery",
            HardwareSelector::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for HardwareSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h_bridge" => Ok(HardwareSelector::HBridge),
            "encoder" => Ok(HardwareSelector::Encoder),
            "torque" => Ok(HardwareSelector::Torque),
            "imu" => Ok(HardwareSelector::Imu),
            "battery" => Ok(HardwareSelector::Battery),
            "all" => Ok(HardwareSelector::All),
            other => Err(format!(
                "invalid hardware '{}', expected one of: {}",
                other,
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

/// Coarse failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    Timeout,
    OutOfRange,
    LowVoltage,
    HighVoltage,
    InvalidConfig,
    Bus,
}

/// Why a check failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    #[error("TIMEOUT ({received}/{required} samples)")]
    Timeout { received: u32, required: u32 },
    #[error("INVALID DATA ({channel} = {value}, expected {band})")]
    OutOfRange {
        channel: ImuChannel,
        value: f32,
        band: Band,
    },
    #[error("LOW VOLTAGE ({voltage} V, minimum {min} V)")]
    LowVoltage { voltage: f32, min: f32 },
    #[error("HIGH VOLTAGE ({voltage} V, maximum {max} V)")]
    HighVoltage { voltage: f32, max: f32 },
    #[error("INVALID CONFIG ({0})")]
    InvalidConfig(#[from] ConfigError),
    #[error("BUS ERROR ({0})")]
    Bus(#[from] HalError),
}

impl FailureReason {
    pub fn code(&self) -> ReasonCode {
        match self {
            FailureReason::Timeout { .. } => ReasonCode::Timeout,
            FailureReason::OutOfRange { .. } => ReasonCode::OutOfRange,
            FailureReason::LowVoltage { .. } => ReasonCode::LowVoltage,
            FailureReason::HighVoltage { .. } => ReasonCode::HighVoltage,
            FailureReason::InvalidConfig(_) => ReasonCode::InvalidConfig,
            FailureReason::Bus(_) => ReasonCode::Bus,
        }
    }
}

/// Verdict of a single subsystem check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Passed { samples: u32 },
    Failed(FailureReason),
    /// The check has no automated criterion yet
    NotImplemented,
    /// Commands were issued; the operator judges the result
    ManualInspection { steps: u32, commands_sent: u32 },
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            CheckOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Passed { .. } => write!(f, "PASSED"),
            CheckOutcome::Failed(reason) => write!(f, "{}", reason),
            CheckOutcome::NotImplemented => write!(f, "NOT IMPLEMENTED"),
            CheckOutcome::ManualInspection { steps, .. } => {
                write!(f, "DONE ({} duty steps sent, inspect wheels manually)", steps)
            }
        }
    }
}

/// Outcome of one subsystem check with timing
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub subsystem: Subsystem,
    pub outcome: CheckOutcome,
    pub elapsed: Duration,
}

/// Per-sample inspection plugged into [`SampleValidator`]
pub trait SampleCheck<T> {
    fn inspect(&self, sample: &T) -> Result<(), FailureReason>;
}

/// Quota and deadline driven sampling loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleValidator {
    quota: u32,
    timeout: Duration,
    policy: TimeoutPolicy,
}

impl SampleValidator {
    pub fn new(quota: u32, timeout: Duration) -> Self {
        Self {
            quota,
            timeout,
            policy: TimeoutPolicy::Overall,
        }
    }

    pub fn with_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Drain samples from `mailbox` through `check` until a verdict is reached.
    ///
    /// A sample pending before the call is discarded. Samples arriving after
    /// the quota is met are never inspected.
    pub fn run<T, C>(&self, mailbox: &SampleMailbox<T>, check: &C) -> CheckOutcome
    where
        T: Clone,
        C: SampleCheck<T> + ?Sized,
    {
        mailbox.discard_pending();
        let start = Instant::now();
        let mut last_sample = start;
        let mut received = 0u32;

        while received < self.quota {
            let reference = match self.policy {
                TimeoutPolicy::Overall => start,
                TimeoutPolicy::SampleGap => last_sample,
            };
            // an unrepresentable deadline means no deadline
            let wait = match reference.checked_add(self.timeout) {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(received, required = self.quota, "sample deadline expired");
                        return CheckOutcome::Failed(FailureReason::Timeout {
                            received,
                            required: self.quota,
                        });
                    }
                    deadline - now
                }
                None => self.timeout,
            };

            let Some(sample) = mailbox.wait_new(wait) else {
                continue;
            };
            last_sample = Instant::now();
            received += 1;

            if let Err(reason) = check.inspect(&sample) {
                debug!(sample = received, %reason, "sample rejected");
                return CheckOutcome::Failed(reason);
            }
        }

        CheckOutcome::Passed { samples: received }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct BelowTen;

    impl SampleCheck<u32> for BelowTen {
        fn inspect(&self, sample: &u32) -> Result<(), FailureReason> {
            if *sample < 10 {
                Ok(())
            } else {
                Err(FailureReason::Timeout {
                    received: *sample,
                    required: 0,
                })
            }
        }
    }

    fn feed(mailbox: &Arc<SampleMailbox<u32>>, values: Vec<u32>, gap: Duration) -> thread::JoinHandle<()> {
        let mailbox = Arc::clone(mailbox);
        thread::spawn(move || {
            for value in values {
                // let the reader consume the previous sample first
                let waiting = Instant::now();
                while mailbox.has_new() && waiting.elapsed() < Duration::from_secs(1) {
                    thread::sleep(Duration::from_millis(1));
                }
                thread::sleep(gap);
                mailbox.publish(value);
            }
        })
    }

    #[test]
    fn test_selector_parsing_round_trip() {
        for name in HardwareSelector::VARIANTS {
            let selector: HardwareSelector = name.parse().unwrap();
            assert_eq!(selector.to_string(), name);
        }
        assert!("wheels".parse::<HardwareSelector>().is_err());
        assert_eq!(HardwareSelector::default(), HardwareSelector::All);
    }

    #[test]
    fn test_selector_subsystems() {
        assert_eq!(
            HardwareSelector::All.subsystems(),
            vec![Subsystem::Battery, Subsystem::Imu, Subsystem::Encoder, Subsystem::Torque]
        );
        assert_eq!(HardwareSelector::HBridge.subsystems(), vec![Subsystem::MotorLoad]);
        assert_eq!(HardwareSelector::Imu.subsystems(), vec![Subsystem::Imu]);
    }

    #[test]
    fn test_no_samples_times_out() {
        let mailbox = SampleMailbox::<u32>::new();
        let validator = SampleValidator::new(5, Duration::from_millis(50));

        let outcome = validator.run(&mailbox, &BelowTen);
        assert_eq!(
            outcome,
            CheckOutcome::Failed(FailureReason::Timeout {
                received: 0,
                required: 5,
            })
        );
    }

    #[test]
    fn test_quota_met_passes() {
        let mailbox = Arc::new(SampleMailbox::new());
        let writer = feed(&mailbox, (0..5).collect(), Duration::from_millis(10));

        let outcome = SampleValidator::new(5, Duration::from_secs(5)).run(&*mailbox, &BelowTen);
        writer.join().unwrap();
        assert_eq!(outcome, CheckOutcome::Passed { samples: 5 });
    }

    #[test]
    fn test_bad_sample_stops_loop() {
        let mailbox = Arc::new(SampleMailbox::new());
        let writer = feed(&mailbox, vec![1, 2, 42, 3], Duration::from_millis(10));

        let outcome = SampleValidator::new(4, Duration::from_secs(5)).run(&*mailbox, &BelowTen);
        writer.join().unwrap();
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_unbounded_timeout_does_not_overflow() {
        let mailbox = Arc::new(SampleMailbox::new());
        // more samples than the quota in case the first one lands before the start
        let writer = feed(&mailbox, (0..6).collect(), Duration::from_millis(10));

        let outcome = SampleValidator::new(3, Duration::MAX).run(&*mailbox, &BelowTen);
        writer.join().unwrap();
        assert_eq!(outcome, CheckOutcome::Passed { samples: 3 });
    }

    #[test]
    fn test_pending_sample_before_start_is_discarded() {
        let mailbox = SampleMailbox::new();
        mailbox.publish(1u32);

        let outcome = SampleValidator::new(1, Duration::from_millis(30)).run(&mailbox, &BelowTen);
        assert_eq!(outcome.failure().map(FailureReason::code), Some(ReasonCode::Timeout));
    }

    #[test]
    fn test_sample_gap_policy_extends_deadline() {
        let mailbox = Arc::new(SampleMailbox::new());
        // 6 samples, 40 ms apart: 240 ms total, each gap well under 150 ms
        let writer = feed(&mailbox, (0..6).collect(), Duration::from_millis(40));

        let outcome = SampleValidator::new(6, Duration::from_millis(150))
            .with_policy(TimeoutPolicy::SampleGap)
            .run(&*mailbox, &BelowTen);
        writer.join().unwrap();
        assert_eq!(outcome, CheckOutcome::Passed { samples: 6 });
    }

    #[test]
    fn test_overall_policy_counts_from_start() {
        let mailbox = Arc::new(SampleMailbox::new());
        let writer = feed(&mailbox, (0..6).collect(), Duration::from_millis(40));

        let outcome = SampleValidator::new(6, Duration::from_millis(150)).run(&*mailbox, &BelowTen);
        writer.join().unwrap();
        assert_eq!(outcome.failure().map(FailureReason::code), Some(ReasonCode::Timeout));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CheckOutcome::Passed { samples: 50 }.to_string(), "PASSED");
        assert_eq!(CheckOutcome::NotImplemented.to_string(), "NOT IMPLEMENTED");
        let timeout = CheckOutcome::Failed(FailureReason::Timeout {
            received: 3,
            required: 50,
        });
        assert!(timeout.to_string().starts_with("TIMEOUT"));
    }
}
