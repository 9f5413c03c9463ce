//! Persistence for recorded sessions.
//!
//! Sessions are partitioned by backend. The directory store lays them out
//! as:
//!
//! ```text
//! <root>/
//!   └── models_generate_content/
//!         ├── test_simple.mldev.json
//!         └── test_simple.vertex.json
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use super::format::ReplayFile;
use crate::error::{ReplayError, Result};
use crate::mode::Backend;
use crate::table::validate_id;

/// Address of one recorded session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Replay identifier of the case.
    pub replay_id: String,
    /// Backend the session was recorded against.
    pub backend: Backend,
}

impl SessionKey {
    /// Key for `replay_id` on `backend`.
    pub fn new(replay_id: impl Into<String>, backend: Backend) -> Self {
        Self { replay_id: replay_id.into(), backend }
    }
}

/// Loads and saves recorded sessions. Pure storage: no matching policy.
pub trait SessionStore: Send + Sync {
    /// Loads the session stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::SessionNotFound`] if nothing is stored under
    /// `key`, or a parse/validation error for a damaged file.
    fn load(&self, key: &SessionKey) -> Result<ReplayFile>;

    /// Stores `file` under `key`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    fn save(&self, key: &SessionKey, file: &ReplayFile) -> Result<()>;

    /// Whether a session is stored under `key`.
    fn exists(&self, key: &SessionKey) -> bool;
}

/// Stores sessions as pretty-printed JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySessionStore {
    root: PathBuf,
}

impl DirectorySessionStore {
    /// A store rooted at `root`. The directory is created lazily on save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the session for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidReplayIdentifier`] for ids that would
    /// escape the root.
    pub fn path_for(&self, key: &SessionKey) -> Result<PathBuf> {
        validate_id(&key.replay_id)?;
        Ok(self.root.join(format!("{}.{}.json", key.replay_id, key.backend)))
    }
}

impl SessionStore for DirectorySessionStore {
    fn load(&self, key: &SessionKey) -> Result<ReplayFile> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(ReplayError::SessionNotFound {
                replay_id: key.replay_id.clone(),
                backend: key.backend.to_string(),
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ReplayError::io(&path, e))?;
        let file: ReplayFile = serde_json::from_str(&content)
            .map_err(|e| ReplayError::json(format!("session {}", path.display()), e))?;
        file.validate()?;
        debug!(
            replay_id = %key.replay_id,
            backend = %key.backend,
            interactions = file.interactions.len(),
            "loaded replay session"
        );
        Ok(file)
    }

    fn save(&self, key: &SessionKey, file: &ReplayFile) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReplayError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(file)
            .map_err(|e| ReplayError::json(format!("session {}", key.replay_id), e))?;
        std::fs::write(&path, content).map_err(|e| ReplayError::io(&path, e))?;
        info!(
            replay_id = %key.replay_id,
            backend = %key.backend,
            interactions = file.interactions.len(),
            path = %path.display(),
            "saved replay session"
        );
        Ok(())
    }

    fn exists(&self, key: &SessionKey) -> bool {
        self.path_for(key).is_ok_and(|path| path.is_file())
    }
}

/// In-process store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, ReplayFile>>,
}

impl MemorySessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store lock poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, key: &SessionKey) -> Result<ReplayFile> {
        validate_id(&key.replay_id)?;
        let sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.get(key).cloned().ok_or_else(|| ReplayError::SessionNotFound {
            replay_id: key.replay_id.clone(),
            backend: key.backend.to_string(),
            path: "<memory>".into(),
        })
    }

    fn save(&self, key: &SessionKey, file: &ReplayFile) -> Result<()> {
        validate_id(&key.replay_id)?;
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.insert(key.clone(), file.clone());
        Ok(())
    }

    fn exists(&self, key: &SessionKey) -> bool {
        self.sessions.lock().expect("session store lock poisoned").contains_key(key)
    }
}
