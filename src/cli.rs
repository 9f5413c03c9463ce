//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mode::{Backend, RunMode};

/// Top-level CLI parser for `genai-replay`.
#[derive(Debug, Parser)]
#[command(
    name = "genai-replay",
    version,
    about = "Expand test tables and inspect recorded replay sessions"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the environment-derived harness configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Backend variant (defaults to `GOOGLE_GENAI_BACKEND`, then mldev).
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,
    /// Session root (defaults to `GOOGLE_GENAI_REPLAYS_DIRECTORY`, then `replays`).
    #[arg(long)]
    pub replays_dir: Option<PathBuf>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the cases of a test table with their replay ids and dispositions.
    Expand {
        /// Test table file (JSON or YAML).
        table: PathBuf,
        /// Backend variant to resolve dispositions for.
        #[arg(long, value_enum)]
        backend: Option<Backend>,
        /// Run mode to resolve dispositions for.
        #[arg(long, value_enum)]
        mode: Option<RunMode>,
    },
    /// Check that every runnable case has a loadable recorded session.
    Check {
        /// Test table files.
        #[arg(required = true)]
        tables: Vec<PathBuf>,
        /// Configuration overrides.
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Summarize the interactions of one recorded session.
    Inspect {
        /// Replay identifier, e.g. `models_generate_content/test_text`.
        replay_id: String,
        /// Configuration overrides.
        #[command(flatten)]
        config: ConfigArgs,
    },
}
