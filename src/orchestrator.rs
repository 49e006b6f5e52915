// src/orchestrator.rs
//! Acceptance run sequencing
//!
//! A run walks the pre-flight steps (bus master, bridge node, board type,
//! firmware version), registers this process on the bus, asks the operator
//! for confirmation and then runs the selected checks in a fixed order.
//! Every pre-flight step short-circuits the rest of the run on failure.

use crate::acquisition::SampleBuffer;
use crate::config::ValidatorSettings;
use crate::error::{ResultExt, ValidateResult};
use crate::hal::{BoardInspector, BoardType, FirmwareBus, HalError};
use crate::validation::{
    check_battery, check_encoder, check_imu, check_motor_load, check_torque, CheckOutcome,
    HardwareSelector, Subsystem, ValidationResult,
};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{info, warn};

const RESTART_HINT: &str = "Will not be able to validate hardware. Try to restart leo.service or reboot system.";

/// Yes/no confirmation from the operator
pub trait OperatorPrompt {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Answers every question with yes
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl OperatorPrompt for AssumeYes {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Line based yes/no prompt
///
/// Accepts `y`, `ye`, `yes`, `n`, `no` in any case. An empty answer takes the
/// default when one is set; anything else asks again. End of input counts as
/// the default, or as no without one.
pub struct StdinPrompt<R, W> {
    input: R,
    output: W,
    default: Option<bool>,
}

impl StdinPrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process terminal, defaulting to yes
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout()).with_default(Some(true))
    }
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Option<bool>) -> Self {
        self.default = default;
        self
    }

    fn parse(&self, answer: &str) -> Option<bool> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "" => self.default,
            "y" | "ye" | "yes" => Some(true),
            "n" | "no" => Some(false),
            _ => None,
        }
    }
}

impl<R: BufRead, W: Write> OperatorPrompt for StdinPrompt<R, W> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let choices = match self.default {
            Some(true) => "[Y/n]",
            Some(false) => "[y/N]",
            None => "[y/n]",
        };

        loop {
            write!(self.output, "{} {} ", question, choices)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(self.default.unwrap_or(false));
            }
            match self.parse(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please respond with 'yes' or 'no' (or 'y' or 'n').")?,
            }
        }
    }
}

/// Why a run stopped before any check ran
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    MasterOffline,
    BridgeInactive { node: String },
    /// Neither the board type nor the firmware version could be determined
    BoardUndetermined,
    Bus(HalError),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::MasterOffline => write!(f, "ROS Master is not running. {}", RESTART_HINT),
            AbortReason::BridgeInactive { .. } => write!(f, "Rosserial node is not active. {}", RESTART_HINT),
            AbortReason::BoardUndetermined => write!(
                f,
                "Can not determine firmware version or board type. Flash firmware and try to rerun the script"
            ),
            AbortReason::Bus(e) => write!(f, "Bus error: {}. {}", e, RESTART_HINT),
        }
    }
}

/// Results of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub hardware: HardwareSelector,
    pub firmware_version: Option<String>,
    pub board: Option<BoardType>,
    pub results: Vec<ValidationResult>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn outcome(&self, subsystem: Subsystem) -> Option<&CheckOutcome> {
        self.results
            .iter()
            .find(|r| r.subsystem == subsystem)
            .map(|r| &r.outcome)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Aborted(AbortReason),
    /// The operator declined to start the checks
    Declined,
    Completed(RunReport),
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(report) if report.has_failures() => 2,
            RunOutcome::Completed(_) => 0,
            RunOutcome::Aborted(_) | RunOutcome::Declined => 1,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Drives one acceptance run against a bus
pub struct Orchestrator<'a, B: ?Sized, P, W> {
    bus: &'a B,
    settings: ValidatorSettings,
    prompt: P,
    out: W,
}

impl<'a, B, P, W> Orchestrator<'a, B, P, W>
where
    B: FirmwareBus + BoardInspector + ?Sized,
    P: OperatorPrompt,
    W: Write,
{
    pub fn new(bus: &'a B, settings: ValidatorSettings, prompt: P, out: W) -> Self {
        Self {
            bus,
            settings,
            prompt,
            out,
        }
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Consume the orchestrator, returning its output sink
    pub fn into_output(self) -> W {
        self.out
    }

    fn step(&mut self, label: &str) -> io::Result<()> {
        write!(self.out, "--> {}.. ", label)?;
        self.out.flush()
    }

    fn abort(&mut self, reason: AbortReason) -> ValidateResult<RunOutcome> {
        warn!(%reason, "hardware validation aborted");
        writeln!(self.out, "{}", reason).in_context("orchestrator", "abort")?;
        Ok(RunOutcome::Aborted(reason))
    }

    /// Run the pre-flight steps and the checks picked by `hardware`
    pub fn run(&mut self, hardware: HardwareSelector) -> ValidateResult<RunOutcome> {
        info!(%hardware, "starting hardware validation");

        self.step("Checking if ROS Master is online")?;
        if !self.bus.is_master_online() {
            writeln!(self.out, "NO")?;
            return self.abort(AbortReason::MasterOffline);
        }
        writeln!(self.out, "YES")?;

        self.step("Checking if rosserial node is active")?;
        let bridge = self.bus.resolve_name(&self.settings.bus.bridge_node);
        let nodes = match self.bus.node_names() {
            Ok(nodes) => nodes,
            Err(e) => {
                writeln!(self.out, "NO")?;
                return self.abort(AbortReason::Bus(e));
            }
        };
        if !nodes.contains(&bridge) {
            writeln!(self.out, "NO")?;
            return self.abort(AbortReason::BridgeInactive { node: bridge });
        }
        writeln!(self.out, "YES")?;

        self.step("Trying to determine board type")?;
        let board = self.bus.determine_board();
        writeln!(self.out, "{}", if board.is_some() { "SUCCESS" } else { "FAIL" })?;

        self.step("Trying to check the current firmware version")?;
        let firmware_version = self.bus.firmware_version();
        writeln!(self.out, "{}", if firmware_version.is_some() { "SUCCESS" } else { "FAIL" })?;

        if board.is_none() && firmware_version.is_none() {
            return self.abort(AbortReason::BoardUndetermined);
        }
        if board.is_none() {
            warn!("board type unknown, continuing with firmware version only");
        }
        if firmware_version.is_none() {
            warn!("firmware version unknown, continuing with board type only");
        }

        self.step("Initializing ROS node")?;
        let buffer = SampleBuffer::new();
        let registered = self
            .bus
            .init_node(&self.settings.bus.node_name, self.settings.bus.anonymous)
            .and_then(|()| buffer.attach(self.bus));
        if let Err(e) = registered {
            writeln!(self.out, "FAIL")?;
            return self.abort(AbortReason::Bus(e));
        }
        writeln!(self.out, "DONE")?;

        if let Some(version) = &firmware_version {
            writeln!(self.out, "Firmware version: {}", version)?;
        }
        if let Some(board) = board {
            writeln!(self.out, "Board type: {}", board)?;
        }
        info!(board = ?board, firmware = ?firmware_version, "board identified");

        if !self.prompt.confirm("Run test?").in_context("orchestrator", "confirm")? {
            info!("operator declined the run");
            return Ok(RunOutcome::Declined);
        }

        let mut results = Vec::new();
        for subsystem in hardware.subsystems() {
            self.step(subsystem.label())?;
            let started = Instant::now();
            let outcome = self.run_check(subsystem, &buffer);
            let elapsed = started.elapsed();
            writeln!(self.out, "{}", outcome)?;
            info!(%subsystem, %outcome, elapsed_ms = elapsed.as_millis() as u64, "check finished");
            results.push(ValidationResult {
                subsystem,
                outcome,
                elapsed,
            });
        }

        let report = RunReport {
            hardware,
            firmware_version,
            board,
            results,
        };
        self.print_summary(&report)?;
        Ok(RunOutcome::Completed(report))
    }

    fn run_check(&self, subsystem: Subsystem, buffer: &SampleBuffer) -> CheckOutcome {
        let validation = &self.settings.validation;
        match subsystem {
            Subsystem::Battery => check_battery(&buffer.battery, validation),
            Subsystem::Imu => check_imu(&buffer.imu, validation),
            Subsystem::Encoder => check_encoder(validation),
            Subsystem::Torque => check_torque(validation),
            Subsystem::MotorLoad => check_motor_load(self.bus, &self.settings.motor_load),
        }
    }

    fn print_summary(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Summary:")?;
        for result in &report.results {
            writeln!(
                self.out,
                "  {:<26} {} ({:.1}s)",
                result.subsystem.label(),
                result.outcome,
                result.elapsed.as_secs_f32()
            )?;
        }
        writeln!(
            self.out,
            "{} passed, {} failed, {} checks run",
            report.passed(),
            report.failed(),
            report.results.len()
        )
    }
}
