//! Per-case context wiring the transport for the configured run mode.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::recording::RecordingTransport;
use crate::adapters::replaying::ReplayingTransport;
use crate::config::HarnessConfig;
use crate::error::{ReplayError, Result};
use crate::mode::{Backend, RunMode};
use crate::ports::transport::{SegmentDecoder, Transport};
use crate::replay::{
    play, Matcher, Playback, ReplayRequest, ReplaySession, SessionKey, SessionRecorder,
    SessionStore,
};
use crate::table::ExecutionCase;

enum Wiring {
    Replay(ReplayingTransport),
    Record { transport: RecordingTransport, recorder: Arc<Mutex<SessionRecorder>> },
    Api(Arc<dyn Transport>),
}

/// Everything one case needs to make its calls.
///
/// A context belongs to exactly one case. In replay mode it owns the
/// session cursor; in record mode it owns the recorder, which is written
/// to the store by [`CaseContext::finish`].
pub struct CaseContext {
    case: ExecutionCase,
    key: SessionKey,
    mode: RunMode,
    store: Arc<dyn SessionStore>,
    wiring: Wiring,
}

impl CaseContext {
    /// Opens the context for `case` under `config`.
    ///
    /// # Errors
    ///
    /// In replay mode, returns [`ReplayError::SessionNotFound`] when no
    /// session is recorded for the case, or the load error of a damaged one.
    pub fn open(
        case: &ExecutionCase,
        config: &HarnessConfig,
        store: Arc<dyn SessionStore>,
        live: Arc<dyn Transport>,
        decoder: Arc<dyn SegmentDecoder>,
    ) -> Result<Self> {
        let key = SessionKey::new(case.replay_id.clone(), config.backend);
        let wiring = match config.mode {
            RunMode::Replay => {
                let file = store.load(&key)?;
                let session = ReplaySession::new(file);
                Wiring::Replay(ReplayingTransport::new(
                    session,
                    Matcher::new(config.match_rules.clone()),
                ))
            }
            RunMode::Record => {
                let recorder = Arc::new(Mutex::new(SessionRecorder::with_rules(
                    key.clone(),
                    config.match_rules.clone(),
                )));
                let transport = RecordingTransport::new(live, decoder, Arc::clone(&recorder));
                Wiring::Record { transport, recorder }
            }
            RunMode::Api => Wiring::Api(live),
        };
        info!(
            replay_id = %key.replay_id,
            backend = %key.backend,
            mode = %config.mode,
            "opened case"
        );
        Ok(Self { case: case.clone(), key, mode: config.mode, store, wiring })
    }

    /// The case this context serves.
    #[must_use]
    pub fn case(&self) -> &ExecutionCase {
        &self.case
    }

    /// Replay identifier of the case.
    #[must_use]
    pub fn replay_id(&self) -> &str {
        &self.key.replay_id
    }

    /// Backend under test.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.key.backend
    }

    /// Run mode of this context.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Makes one call through the configured transport.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::Api`] when the (live or recorded) response carries
    ///   an error status, as the client library would raise it.
    /// - Harness errors such as [`ReplayError::RequestMismatch`] or
    ///   [`ReplayError::SessionExhausted`] in replay mode.
    pub async fn send(&self, request: &ReplayRequest) -> Result<Playback> {
        let transport: &dyn Transport = match &self.wiring {
            Wiring::Replay(transport) => transport,
            Wiring::Record { transport, .. } => transport,
            Wiring::Api(transport) => transport.as_ref(),
        };
        let response = transport.send(request).await?;
        if response.is_error() {
            return Err(ReplayError::Api {
                status: response.status_code,
                message: response.error_message(),
            });
        }
        Ok(play(response))
    }

    /// Ends the case: saves the recording in record mode, and reports
    /// unconsumed interactions in replay mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the recording cannot be saved.
    ///
    /// # Panics
    ///
    /// Panics if the recorder lock is poisoned.
    pub fn finish(self) -> Result<()> {
        match self.wiring {
            Wiring::Replay(transport) => {
                let remaining = transport.remaining();
                if remaining > 0 {
                    warn!(
                        replay_id = %self.key.replay_id,
                        backend = %self.key.backend,
                        remaining,
                        "case ended with unconsumed recorded interactions"
                    );
                }
                Ok(())
            }
            Wiring::Record { recorder, .. } => {
                let guard = recorder.lock().expect("recorder lock poisoned");
                guard.finish(self.store.as_ref()).map(|_| ())
            }
            Wiring::Api(_) => Ok(()),
        }
    }
}
