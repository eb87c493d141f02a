//! # F2K CLI
//!
//! Thin command-line driver over `f2k_core`.
//!
//! ```text
//! f2k_cli inspect <file> [--dialect modern|legacy|auto] [--config <path>]
//! f2k_cli normalize <source> <destination> [--dialect ...] [--config <path>]
//! ```
//!
//! `inspect` prints a JSON summary of the tables, units, point tables and
//! warnings of a file. `normalize` parses a file and writes it back out
//! through the same dialect.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use f2k_core::{Dialect, InterchangeConfig, InterchangeError, InterchangeSession};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage:
  f2k_cli inspect <file> [--dialect modern|legacy|auto] [--config <path>]
  f2k_cli normalize <source> <destination> [--dialect modern|legacy|auto] [--config <path>]";

enum Command {
    Inspect { file: PathBuf },
    Normalize { source: PathBuf, destination: PathBuf },
}

struct Args {
    command: Command,
    /// `None` means detect from the file
    dialect: Option<Dialect>,
    config: Option<PathBuf>,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut dialect = None;
    let mut config = None;

    let mut raw = raw.into_iter();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--dialect" => {
                let value = raw.next().ok_or("`--dialect` needs a value")?;
                dialect = match value.as_str() {
                    "auto" => None,
                    other => Some(other.parse::<Dialect>().map_err(|e| e.to_string())?),
                };
            }
            "--config" => {
                let value = raw.next().ok_or("`--config` needs a path")?;
                config = Some(PathBuf::from(value));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown option: {}", other)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("inspect") => Command::Inspect {
            file: positional.next().map(PathBuf::from).ok_or(USAGE)?,
        },
        Some("normalize") => Command::Normalize {
            source: positional.next().map(PathBuf::from).ok_or(USAGE)?,
            destination: positional.next().map(PathBuf::from).ok_or(USAGE)?,
        },
        _ => return Err(USAGE.to_string()),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    Ok(Args {
        command,
        dialect,
        config,
    })
}

/// Load the configuration.
///
/// An explicit `--config` path must load; a discovered file that fails to
/// load falls back to defaults and is reported as the second value.
fn load_configuration(
    override_path: Option<&PathBuf>,
) -> Result<(InterchangeConfig, Option<InterchangeError>), InterchangeError> {
    match override_path {
        Some(path) => InterchangeConfig::from_file(path).map(|config| (config, None)),
        None => match InterchangeConfig::discover() {
            Ok(config) => Ok((config, None)),
            Err(err) => Ok((InterchangeConfig::default(), Some(err))),
        },
    }
}

fn init_logging(config: &InterchangeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stderr keeps stdout clean for JSON output
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn open_session(
    file: &Path,
    dialect: Option<Dialect>,
    config: &InterchangeConfig,
) -> Result<InterchangeSession, InterchangeError> {
    let mut session_config = config.session.clone();
    match dialect {
        Some(dialect) => {
            session_config.dialect = dialect;
            InterchangeSession::open(file, session_config)
        }
        None => InterchangeSession::open_detected(file, session_config),
    }
}

fn run(args: Args, config: &InterchangeConfig) -> Result<(), InterchangeError> {
    match args.command {
        Command::Inspect { file } => {
            let session = open_session(&file, args.dialect, config)?;
            match serde_json::to_string_pretty(&session.summary()) {
                Ok(json) => println!("{}", json),
                Err(err) => error!(error = %err, "failed to encode summary"),
            }
        }
        Command::Normalize { source, destination } => {
            let session = open_session(&source, args.dialect, config)?.with_destination(destination);
            for warning in session.warnings() {
                warn!(code = warning.warning_code(), "{}", warning);
            }
            let written = session.write()?;
            info!(path = %written.display(), "normalized");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    let (config, config_error) = match load_configuration(args.config.as_ref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(2);
        }
    };
    init_logging(&config);
    if let Some(err) = config_error {
        warn!(error = %err, "failed to load configuration; using defaults");
    }

    match run(args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = err.error_code(), "{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
