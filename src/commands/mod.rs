//! Command dispatch and handlers.

pub mod check;
pub mod expand;
pub mod inspect;

use crate::cli::{Command, ConfigArgs};
use crate::config::HarnessConfig;

/// Dispatch a parsed command to its handler.
///
/// The harness configuration is read from the environment (and `.env`)
/// first; command-line flags override it.
///
/// # Errors
///
/// Returns an error string if the configuration is invalid or the selected
/// command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let base = HarnessConfig::from_env().map_err(|e| e.to_string())?;
    match command {
        Command::Expand { table, backend, mode } => {
            let mut config = base;
            if let Some(backend) = backend {
                config.backend = *backend;
            }
            if let Some(mode) = mode {
                config.mode = *mode;
            }
            expand::run(table, &config)
        }
        Command::Check { tables, config } => check::run(tables, &apply(base, config)),
        Command::Inspect { replay_id, config } => inspect::run(replay_id, &apply(base, config)),
    }
}

fn apply(mut config: HarnessConfig, args: &ConfigArgs) -> HarnessConfig {
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(dir) = &args.replays_dir {
        config.replays_dir.clone_from(dir);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Backend;
    use std::path::PathBuf;

    #[test]
    fn flags_override_environment_values() {
        let base = HarnessConfig::default();
        let args = ConfigArgs { backend: Some(Backend::Vertex), replays_dir: Some(PathBuf::from("r")) };
        let config = apply(base, &args);
        assert_eq!(config.backend, Backend::Vertex);
        assert_eq!(config.replays_dir, PathBuf::from("r"));
    }

    #[test]
    fn absent_flags_keep_environment_values() {
        let base = HarnessConfig::default().with_backend(Backend::Vertex);
        let config = apply(base.clone(), &ConfigArgs::default());
        assert_eq!(config, base);
    }
}
