// libs/media-cell/src/backend.rs
//
// Seam to the platform's native player. The controller only ever holds one
// live handle; `create` is called after the previous handle is fully
// stopped and unloaded.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::MediaError;

/// Raw status as reported by the native resource. The controller translates
/// this into tagged session events.
#[derive(Debug, Clone, Default)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub did_just_finish: bool,
    pub error: Option<String>,
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Create a playback resource for the given URI. Does not start playback.
    async fn create(&self, uri: &str) -> Result<Arc<dyn MediaHandle>, MediaError>;
}

#[async_trait]
pub trait MediaHandle: Send + Sync {
    async fn play(&self) -> Result<(), MediaError>;
    async fn pause(&self) -> Result<(), MediaError>;
    async fn stop(&self) -> Result<(), MediaError>;
    async fn unload(&self) -> Result<(), MediaError>;
    async fn set_position(&self, position_ms: u64) -> Result<(), MediaError>;
    async fn status(&self) -> Result<PlaybackStatus, MediaError>;
}
