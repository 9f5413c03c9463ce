//! Backend variants, run modes, and per-case dispositions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::table::ExecutionCase;

/// The two operating modes of the generative-AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Developer API.
    #[value(name = "mldev")]
    MlDev,
    /// Managed/enterprise API.
    Vertex,
}

impl Backend {
    /// Lowercase tag used in session file names and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MlDev => "mldev",
            Self::Vertex => "vertex",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mldev" => Ok(Self::MlDev),
            "vertex" => Ok(Self::Vertex),
            _ => Err(ReplayError::Config(format!("unknown backend `{s}` (mldev|vertex)"))),
        }
    }
}

/// How client calls reach the backend during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Serve every call from a recorded session; no network.
    Replay,
    /// Call the live API and save the exchanges as a new session.
    Record,
    /// Call the live API without recording.
    Api,
}

impl RunMode {
    /// Whether calls in this mode reach the real backend.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Record | Self::Api)
    }

    /// Lowercase tag used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Record => "record",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replay" => Ok(Self::Replay),
            "record" => Ok(Self::Record),
            "api" => Ok(Self::Api),
            _ => Err(ReplayError::Config(format!("unknown client mode `{s}` (replay|record|api)"))),
        }
    }
}

/// What the runner's host language can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether sum-typed parameters can be constructed.
    pub supports_unions: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { supports_unions: true }
    }
}

/// How one case is handled against one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Do not run the case.
    Skip(String),
    /// The call must fail with an error containing this text.
    ExpectException(String),
    /// Run the call and expect success.
    Proceed,
}

/// Decides how `case` is handled for `backend` in `mode`.
///
/// Skips take priority over exception expectations: a case skipped in API
/// mode is skipped even if it also expects an error.
#[must_use]
pub fn resolve(
    case: &ExecutionCase,
    backend: Backend,
    mode: RunMode,
    capabilities: &Capabilities,
) -> Disposition {
    if mode == RunMode::Api {
        if let Some(reason) = &case.skip_in_api_mode {
            return Disposition::Skip(format!("skipped in API mode: {reason}"));
        }
    }
    if case.has_union && !capabilities.supports_unions {
        return Disposition::Skip("parameters use a union type this runner cannot express".into());
    }
    match case.exception.for_backend(backend) {
        Some(text) => Disposition::ExpectException(text.to_string()),
        None => Disposition::Proceed,
    }
}

/// Why a driven call did not return normally.
#[derive(Debug)]
pub enum CallFailure {
    /// The client call raised an error.
    Client(String),
    /// The call returned but its result failed the driver's assertions.
    Assertion(String),
    /// The harness itself failed (session mismatch, exhaustion, ...).
    Harness(ReplayError),
}

impl From<ReplayError> for CallFailure {
    fn from(err: ReplayError) -> Self {
        if err.is_client_error() {
            Self::Client(err.to_string())
        } else {
            Self::Harness(err)
        }
    }
}

impl Disposition {
    /// Judges a call outcome against this disposition.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::UnexpectedException`] when a client error occurs that
    ///   the case did not expect, or whose text does not contain the
    ///   expected substring.
    /// - [`ReplayError::MissingExpectedException`] when an expected error
    ///   never occurred.
    /// - Harness failures are passed through unchanged; they never satisfy
    ///   an expectation.
    pub fn judge<T>(&self, outcome: Result<T, CallFailure>) -> Result<Option<T>, ReplayError> {
        match (self, outcome) {
            (Self::Skip(_), _) => Ok(None),
            (_, Err(CallFailure::Harness(err))) => Err(err),
            (_, Err(CallFailure::Assertion(message))) => Err(ReplayError::AssertionFailed(message)),
            (Self::Proceed, Ok(value)) => Ok(Some(value)),
            (Self::Proceed, Err(CallFailure::Client(message))) => {
                Err(ReplayError::UnexpectedException { expected: None, actual: message })
            }
            (Self::ExpectException(expected), Ok(_)) => {
                Err(ReplayError::MissingExpectedException { expected: expected.clone() })
            }
            (Self::ExpectException(expected), Err(CallFailure::Client(message))) => {
                if message.contains(expected.as_str()) {
                    Ok(None)
                } else {
                    Err(ReplayError::UnexpectedException {
                        expected: Some(expected.clone()),
                        actual: message,
                    })
                }
            }
        }
    }
}
