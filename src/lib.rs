//! leo-validate: hardware acceptance checks for the Leo Rover controller board
//!
//! The checker connects to the message bus the firmware bridge publishes on,
//! verifies that the bridge is alive and the board identifies itself, and
//! then samples the board's sensor topics against YAML thresholds:
//!
//! - Battery voltage window
//! - IMU accelerometer and gyroscope bands
//! - Encoder and torque parameter documents (no automated criterion yet)
//! - A PWM duty ramp on all four wheels for manual inspection
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use leo_validate::config::ValidatorSettings;
//! use leo_validate::hal::SimulatedBus;
//! use leo_validate::orchestrator::{AssumeYes, Orchestrator};
//! use leo_validate::validation::HardwareSelector;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = SimulatedBus::healthy();
//!     bus.start_streaming();
//!
//!     let mut orchestrator =
//!         Orchestrator::new(&bus, ValidatorSettings::default(), AssumeYes, std::io::stdout());
//!     let outcome = orchestrator.run(HardwareSelector::Battery)?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod hal;
pub mod orchestrator;
pub mod validation;

// Re-export commonly used types for convenience
pub use acquisition::{SampleBuffer, SampleMailbox};
pub use config::{ConfigError, ConfigLoader, ValidatorSettings};
pub use error::{ErrorContext, ValidateError, ValidateResult};
pub use hal::{BoardInspector, BoardType, FirmwareBus, HalError, SimulatedBus};
pub use orchestrator::{AbortReason, Orchestrator, RunOutcome, RunReport};
pub use validation::{CheckOutcome, FailureReason, HardwareSelector, Subsystem};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
