// libs/media-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// TRACK AND SESSION MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub uri: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Lifecycle phase of the single playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Playing,
    Paused,
    Seeking,
    TornDown,
}

impl SessionPhase {
    /// True while a resource handle is held.
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            SessionPhase::Playing | SessionPhase::Paused | SessionPhase::Seeking
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading => write!(f, "loading"),
            SessionPhase::Playing => write!(f, "playing"),
            SessionPhase::Paused => write!(f, "paused"),
            SessionPhase::Seeking => write!(f, "seeking"),
            SessionPhase::TornDown => write!(f, "torn_down"),
        }
    }
}

/// Point-in-time view of the session for progress UIs.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub track: Option<Track>,
    pub phase: SessionPhase,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_seeking: bool,
}

/// Tagged events the controller emits to its subscribers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Loaded { track_id: String, duration_ms: u64 },
    PositionUpdate { position_ms: u64, duration_ms: u64 },
    Paused,
    Resumed,
    Seeked { position_ms: u64 },
    Finished { track_id: String },
    TornDown,
    Error(String),
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to load media: {0}")]
    LoadFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Seek failed: {0}")]
    SeekFailed(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("Invalid session phase: {0}")]
    InvalidPhase(SessionPhase),

    #[error("Media backend error: {0}")]
    Backend(String),
}
