//! Deterministic record-and-replay harness for generative-AI client test
//! tables.
//!
//! A test table expands into execution cases, each with a replay
//! identifier. In replay mode every client call is matched against the
//! case's recorded session and answered from it; in record mode the calls
//! go to the live backend and are saved as a new session.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod mode;
pub mod ports;
pub mod replay;
pub mod suite;
pub mod table;

pub use config::HarnessConfig;
pub use context::CaseContext;
pub use error::{ReplayError, Result};
pub use mode::{resolve, Backend, CallFailure, Capabilities, Disposition, RunMode};
pub use suite::{CaseDriver, CaseOutcome, CaseReport, DriverFuture, SuiteReport, SuiteRunner};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
