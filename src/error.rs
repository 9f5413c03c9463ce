//! Error type shared by every harness component.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = ReplayError> = std::result::Result<T, E>;

/// Everything that can go wrong while expanding a table, loading a
/// session, or replaying a case.
///
/// All variants are local to one case: the suite runner records them
/// against the case and moves on.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// No recording exists for the derived identifier.
    #[error("no recorded session `{replay_id}` for backend {backend} (looked in {path})")]
    SessionNotFound {
        /// Identifier that was looked up.
        replay_id: String,
        /// Backend variant the session belongs to.
        backend: String,
        /// Location that was searched.
        path: String,
    },

    /// The outgoing request diverges from the recorded one.
    #[error(
        "request #{index} of session `{replay_id}` does not match the recording: \
         field `{field}` expected {expected}, got {actual}"
    )]
    RequestMismatch {
        /// Session the request was matched against.
        replay_id: String,
        /// Position of the interaction in the session.
        index: usize,
        /// First differing field (e.g. `method`, `headers.x-goog-foo`).
        field: String,
        /// Recorded value.
        expected: String,
        /// Value seen during replay.
        actual: String,
    },

    /// More calls were made than the session recorded.
    #[error("session `{replay_id}` exhausted: all {recorded} recorded interactions were consumed")]
    SessionExhausted {
        /// Exhausted session.
        replay_id: String,
        /// Number of interactions in the recording.
        recorded: usize,
    },

    /// Two table items resolve to the same replay identifier.
    #[error("items `{first}` and `{second}` both resolve to replay id `{replay_id}`")]
    DuplicateReplayIdentifier {
        /// The colliding identifier.
        replay_id: String,
        /// Name of the earlier item.
        first: String,
        /// Name of the later item.
        second: String,
    },

    /// An item uses a parameter key the table never declared.
    #[error("item `{item}` uses parameter `{parameter}` which is not listed in parameterNames")]
    MissingParameterName {
        /// Offending item.
        item: String,
        /// Undeclared parameter key.
        parameter: String,
    },

    /// A replay identifier that cannot be mapped onto the store safely.
    #[error("invalid replay id `{replay_id}`: {reason}")]
    InvalidReplayIdentifier {
        /// Rejected identifier.
        replay_id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A session file that violates the session format invariants.
    #[error("malformed session `{replay_id}`: {reason}")]
    MalformedSession {
        /// Session that failed validation.
        replay_id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The call raised an error the case did not expect.
    #[error("unexpected exception{}: {actual}", expected_suffix(.expected.as_deref()))]
    UnexpectedException {
        /// Expected substring, when an exception was expected at all.
        expected: Option<String>,
        /// Message of the error that was raised.
        actual: String,
    },

    /// The case expected an exception but the call succeeded.
    #[error("expected an exception containing `{expected}` but the call succeeded")]
    MissingExpectedException {
        /// Substring the error should have contained.
        expected: String,
    },

    /// The call returned but its result failed the case's own checks.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// The backend (live or recorded) answered with an error status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The live transport failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// Invalid harness configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem access failed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error in {context}: {source}")]
    Json {
        /// What was being (de)serialized.
        context: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("YAML error in {context}: {source}")]
    Yaml {
        /// What was being parsed.
        context: String,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },
}

fn expected_suffix(expected: Option<&str>) -> String {
    expected.map(|text| format!(" (expected one containing `{text}`)")).unwrap_or_default()
}

impl ReplayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json { context: context.into(), source }
    }

    /// Returns true for errors raised by the client call itself rather than
    /// by the harness. Only these can satisfy an expected exception.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_exception_mentions_expectation_when_present() {
        let err = ReplayError::UnexpectedException {
            expected: Some("quota".into()),
            actual: "permission denied".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected one containing `quota`"));
        assert!(msg.contains("permission denied"));

        let err = ReplayError::UnexpectedException { expected: None, actual: "boom".into() };
        assert_eq!(err.to_string(), "unexpected exception: boom");
    }

    #[test]
    fn only_api_and_transport_errors_are_client_errors() {
        assert!(ReplayError::Api { status: 429, message: "quota".into() }.is_client_error());
        assert!(ReplayError::Transport("reset".into()).is_client_error());
        assert!(!ReplayError::SessionExhausted { replay_id: "a".into(), recorded: 1 }
            .is_client_error());
    }
}
