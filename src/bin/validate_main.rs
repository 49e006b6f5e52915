// src/bin/validate_main.rs
//! Command line entry point
//!
//! ```text
//! leo-validate [HARDWARE] [--rosbag] [--yes] [--config PATH]... [--profile NAME]
//! ```
//!
//! Runs against the in-process simulated bus. Exit codes: 0 no check failed,
//! 1 aborted or declined, 2 a check failed, 3 settings or usage error.

use leo_validate::config::ConfigLoader;
use leo_validate::hal::{SimulatedBus, SimulatorProfile};
use leo_validate::orchestrator::{AssumeYes, Orchestrator, RunOutcome, StdinPrompt};
use leo_validate::validation::HardwareSelector;
use leo_validate::{ValidateError, ValidateResult, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: leo-validate [h_bridge|encoder|torque|imu|battery|all] [--rosbag] [--yes] [--config PATH]... [--profile NAME]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    hardware: HardwareSelector,
    rosbag: bool,
    assume_yes: bool,
    config_paths: Vec<PathBuf>,
    profile: Option<SimulatorProfile>,
    help: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> ValidateResult<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut hardware_seen = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--rosbag" => parsed.rosbag = true,
            "-y" | "--yes" => parsed.assume_yes = true,
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| ValidateError::Usage("--config needs a path".to_string()))?;
                parsed.config_paths.push(PathBuf::from(path));
            }
            "--profile" => {
                let name = args
                    .next()
                    .ok_or_else(|| ValidateError::Usage("--profile needs a name".to_string()))?;
                parsed.profile = Some(name.parse().map_err(ValidateError::Usage)?);
            }
            flag if flag.starts_with('-') => {
                return Err(ValidateError::Usage(format!("unknown option '{}'", flag)));
            }
            hardware if !hardware_seen => {
                parsed.hardware = hardware.parse().map_err(ValidateError::Usage)?;
                hardware_seen = true;
            }
            extra => {
                return Err(ValidateError::Usage(format!("unexpected argument '{}'", extra)));
            }
        }
    }

    Ok(parsed)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leo_validate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: CliArgs) -> ValidateResult<RunOutcome> {
    let loader = if args.config_paths.is_empty() {
        ConfigLoader::new()
    } else {
        ConfigLoader::with_paths(args.config_paths)
    };
    let settings = loader.load_settings()?;

    let mut simulator = settings.simulator.clone();
    if let Some(profile) = args.profile {
        simulator = profile.apply(simulator);
    }
    let bus = SimulatedBus::new(simulator);
    bus.start_streaming();

    info!(version = VERSION, hardware = %args.hardware, rosbag = args.rosbag, "leo-validate starting");
    if args.rosbag {
        info!("rosbag recording is not supported yet, flag ignored");
    }

    let stdout = std::io::stdout();
    let outcome = if args.assume_yes {
        Orchestrator::new(&bus, settings, AssumeYes, stdout.lock()).run(args.hardware)?
    } else {
        Orchestrator::new(&bus, settings, StdinPrompt::stdio(), stdout.lock()).run(args.hardware)?
    };

    bus.stop_streaming();
    Ok(outcome)
}

fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::from(3);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(outcome) => ExitCode::from(outcome.exit_code() as u8),
        Err(e) => {
            error!(error = %e, "validation could not run");
            eprintln!("{}", e);
            ExitCode::from(3)
        }
    }
}
