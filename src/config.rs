//! Harness configuration: run mode, backend and where sessions live.

use std::path::PathBuf;

use crate::error::Result;
use crate::mode::{Backend, Capabilities, RunMode};
use crate::replay::MatchRules;

/// Selects replay, record or live API mode.
pub const MODE_VAR: &str = "GOOGLE_GENAI_CLIENT_MODE";
/// Root directory of recorded sessions.
pub const REPLAYS_DIR_VAR: &str = "GOOGLE_GENAI_REPLAYS_DIRECTORY";
/// Backend variant under test.
pub const BACKEND_VAR: &str = "GOOGLE_GENAI_BACKEND";

/// Default session root, relative to the working directory.
pub const DEFAULT_REPLAYS_DIR: &str = "replays";

/// Everything a run needs to know besides the cases themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// How calls reach the backend.
    pub mode: RunMode,
    /// Backend variant under test.
    pub backend: Backend,
    /// Root directory of recorded sessions.
    pub replays_dir: PathBuf,
    /// Tolerances used when matching replayed requests.
    pub match_rules: MatchRules,
    /// What the driving code can express.
    pub capabilities: Capabilities,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Replay,
            backend: Backend::MlDev,
            replays_dir: PathBuf::from(DEFAULT_REPLAYS_DIR),
            match_rules: MatchRules::default(),
            capabilities: Capabilities::default(),
        }
    }
}

impl HarnessConfig {
    /// Reads the configuration from the process environment, after loading
    /// a `.env` file from the working directory if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Config`] for unrecognized mode or
    /// backend values.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Unset
    /// or blank variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Config`] for unrecognized mode or
    /// backend values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(mode) = var(MODE_VAR) {
            config.mode = mode.parse()?;
        }
        if let Some(backend) = var(BACKEND_VAR) {
            config.backend = backend.parse()?;
        }
        if let Some(dir) = var(REPLAYS_DIR_VAR) {
            config.replays_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Same configuration against another backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Same configuration in another mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same configuration with sessions under `dir`.
    #[must_use]
    pub fn with_replays_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.replays_dir = dir.into();
        self
    }
}
