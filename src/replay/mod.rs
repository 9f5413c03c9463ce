//! Replay session format, storage, recording, matching and playback.

pub mod format;
pub mod matcher;
pub mod player;
pub mod recorder;
pub mod session;
pub mod store;

pub use format::{ReplayFile, ReplayInteraction, ReplayRequest, ReplayResponse};
pub use matcher::{MatchRules, Matcher, Mismatch};
pub use player::{play, PlayedSegment, Playback};
pub use recorder::SessionRecorder;
pub use session::ReplaySession;
pub use store::{DirectorySessionStore, MemorySessionStore, SessionKey, SessionStore};
