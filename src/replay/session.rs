//! Positional consumption of a loaded session.

use tracing::{debug, warn};

use super::format::{ReplayFile, ReplayInteraction, ReplayRequest};
use super::matcher::Matcher;
use crate::error::{ReplayError, Result};

/// A loaded session plus the index of the next interaction to serve.
///
/// The recording itself is read-only; only the cursor moves, and only
/// forward. Reload the file to start over.
#[derive(Debug)]
pub struct ReplaySession {
    file: ReplayFile,
    cursor: usize,
}

impl ReplaySession {
    /// Wraps a loaded session with the cursor at the first interaction.
    #[must_use]
    pub fn new(file: ReplayFile) -> Self {
        Self { file, cursor: 0 }
    }

    /// Identifier of the underlying session.
    #[must_use]
    pub fn replay_id(&self) -> &str {
        &self.file.replay_id
    }

    /// Index of the next interaction to be matched.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of recorded interactions not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.file.interactions.len().saturating_sub(self.cursor)
    }

    /// Matches `actual` against the interaction at the cursor and, on
    /// success, advances the cursor and returns that interaction.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::SessionExhausted`] when every interaction was used.
    /// - [`ReplayError::RequestMismatch`] naming the first differing field.
    ///   The cursor does not move on failure.
    pub fn next_match(
        &mut self,
        matcher: &Matcher,
        actual: &ReplayRequest,
    ) -> Result<&ReplayInteraction> {
        let index = self.cursor;
        let Some(interaction) = self.file.interactions.get(index) else {
            warn!(
                replay_id = %self.file.replay_id,
                recorded = self.file.interactions.len(),
                "replay session exhausted"
            );
            return Err(ReplayError::SessionExhausted {
                replay_id: self.file.replay_id.clone(),
                recorded: self.file.interactions.len(),
            });
        };

        if let Err(mismatch) = matcher.check(actual, &interaction.request) {
            warn!(
                replay_id = %self.file.replay_id,
                index,
                field = %mismatch.field,
                "recorded request does not match"
            );
            return Err(ReplayError::RequestMismatch {
                replay_id: self.file.replay_id.clone(),
                index,
                field: mismatch.field,
                expected: mismatch.expected,
                actual: mismatch.actual,
            });
        }

        debug!(replay_id = %self.file.replay_id, index, "matched recorded interaction");
        self.cursor += 1;
        Ok(interaction)
    }
}
