//! Records interactions into a replay session.

use tracing::{debug, info};

use super::format::{ReplayFile, ReplayInteraction, ReplayRequest, ReplayResponse};
use super::matcher::MatchRules;
use super::store::{SessionKey, SessionStore};
use crate::error::Result;

/// Placeholder written in place of credential values.
pub const REDACTED: &str = "[REDACTED]";

/// Collects the interactions of one case in call order and writes them
/// as a session when the case ends.
#[derive(Debug)]
pub struct SessionRecorder {
    key: SessionKey,
    rules: MatchRules,
    interactions: Vec<ReplayInteraction>,
}

impl SessionRecorder {
    /// A recorder for the session stored under `key`.
    #[must_use]
    pub fn new(key: SessionKey) -> Self {
        Self::with_rules(key, MatchRules::default())
    }

    /// A recorder that canonicalizes URLs with `rules`.
    #[must_use]
    pub fn with_rules(key: SessionKey, rules: MatchRules) -> Self {
        Self { key, rules, interactions: Vec::new() }
    }

    /// Key the session will be saved under.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Appends one exchange.
    pub fn record(&mut self, request: ReplayRequest, response: ReplayResponse) {
        debug!(
            replay_id = %self.key.replay_id,
            index = self.interactions.len(),
            method = %request.method,
            status = response.status_code,
            "recorded interaction"
        );
        self.interactions.push(ReplayInteraction { request, response });
    }

    /// The session as it will be written: credentials redacted, URLs in
    /// canonical form.
    #[must_use]
    pub fn to_file(&self) -> ReplayFile {
        let interactions = self
            .interactions
            .iter()
            .map(|interaction| ReplayInteraction {
                request: self.sanitize(&interaction.request),
                response: interaction.response.clone(),
            })
            .collect();
        ReplayFile { replay_id: self.key.replay_id.clone(), interactions }
    }

    /// Writes the session to `store`, replacing any earlier recording.
    /// Recording twice under the same key keeps only the latest run.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot save the session.
    pub fn finish(&self, store: &dyn SessionStore) -> Result<ReplayFile> {
        let file = self.to_file();
        store.save(&self.key, &file)?;
        info!(
            replay_id = %self.key.replay_id,
            backend = %self.key.backend,
            interactions = file.interactions.len(),
            "finished recording"
        );
        Ok(file)
    }

    fn sanitize(&self, request: &ReplayRequest) -> ReplayRequest {
        let headers = request
            .headers
            .iter()
            .map(|(name, value)| {
                let value =
                    if MatchRules::is_credential_header(name) { REDACTED.to_string() } else { value.clone() };
                (name.clone(), value)
            })
            .collect();
        ReplayRequest {
            method: request.method.clone(),
            url: self.rules.canonical_url(&request.url),
            headers,
            body_segments: request.body_segments.clone(),
        }
    }
}
