// libs/media-cell/src/services/controller.rs
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::{MediaBackend, MediaHandle};
use crate::models::{MediaError, PlaybackSnapshot, SessionEvent, SessionPhase, Track};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Drives at most one active playback resource through
/// load -> play/pause -> seek -> teardown, publishing position updates to
/// progress UIs.
///
/// Invariants:
/// - no two native handles exist concurrently; the previous session's
///   stop+unload completes (or is attempted) before the next load begins
/// - the polling task is cancelled on every exit path
/// - position updates are suppressed while a seek is in progress
pub struct MediaSessionController {
    backend: Arc<dyn MediaBackend>,
    inner: Arc<SessionInner>,
    // Serializes session transitions so teardown and load never interleave.
    transition: tokio::sync::Mutex<()>,
    poll_interval: Duration,
}

struct SessionInner {
    state: Mutex<SessionState>,
    handle: Mutex<Option<Arc<dyn MediaHandle>>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Clone)]
struct SessionState {
    track: Option<Track>,
    phase: SessionPhase,
    is_playing: bool,
    position_ms: u64,
    duration_ms: u64,
    is_seeking: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            track: None,
            phase: SessionPhase::Idle,
            is_playing: false,
            position_ms: 0,
            duration_ms: 0,
            is_seeking: false,
        }
    }
}

impl MediaSessionController {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self::with_poll_interval(backend, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(backend: Arc<dyn MediaBackend>, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState::default()),
                handle: Mutex::new(None),
                poll_task: Mutex::new(None),
                events,
            }),
            transition: tokio::sync::Mutex::new(()),
            poll_interval,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.inner.state_guard();
        PlaybackSnapshot {
            track: state.track.clone(),
            phase: state.phase,
            is_playing: state.is_playing,
            position_ms: state.position_ms,
            duration_ms: state.duration_ms,
            is_seeking: state.is_seeking,
        }
    }

    /// Play/pause entry point for a track tile. A request for the currently
    /// loaded track toggles playback without re-creating the resource; any
    /// other request tears the previous session down first, then loads.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn toggle(&self, track: Track) -> Result<(), MediaError> {
        let _guard = self.transition.lock().await;

        let same_loaded_track = {
            let state = self.inner.state_guard();
            state.phase.is_loaded()
                && state.track.as_ref().is_some_and(|t| t.id == track.id)
        };

        if same_loaded_track {
            let playing = self.inner.state_guard().is_playing;
            if playing {
                self.pause_locked().await
            } else {
                self.resume_locked().await
            }
        } else {
            self.inner.teardown().await;
            self.load_and_play(track).await
        }
    }

    /// Explicit stop: navigation away, hardware back, screen unmount.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let _guard = self.transition.lock().await;
        self.inner.teardown().await;
    }

    /// App moved to background: pause, never stop, and never auto-resume
    /// when the app returns to the foreground.
    #[instrument(skip(self))]
    pub async fn handle_app_background(&self) {
        let _guard = self.transition.lock().await;
        let playing = {
            let state = self.inner.state_guard();
            state.phase == SessionPhase::Playing
        };
        if playing {
            info!("App backgrounded while playing, pausing session");
            if let Err(e) = self.pause_locked().await {
                warn!("Background pause failed: {}", e);
            }
        }
    }

    pub async fn pause(&self) -> Result<(), MediaError> {
        let _guard = self.transition.lock().await;
        self.pause_locked().await
    }

    pub async fn resume(&self) -> Result<(), MediaError> {
        let _guard = self.transition.lock().await;
        self.resume_locked().await
    }

    /// Enter seeking: position updates from the polling loop stop
    /// overwriting the UI until `commit_seek` lands.
    pub fn begin_seek(&self) -> Result<(), MediaError> {
        let mut state = self.inner.state_guard();
        if !state.phase.is_loaded() {
            return Err(MediaError::NoActiveSession);
        }
        state.is_seeking = true;
        state.phase = SessionPhase::Seeking;
        Ok(())
    }

    /// Apply the dragged position and leave seeking. The session returns to
    /// whichever of playing/paused it was in before the seek.
    #[instrument(skip(self))]
    pub async fn commit_seek(&self, position_ms: u64) -> Result<(), MediaError> {
        let handle = {
            let state = self.inner.state_guard();
            if state.phase != SessionPhase::Seeking {
                return Err(MediaError::InvalidPhase(state.phase));
            }
            self.inner.handle_guard().clone()
        };

        let handle = handle.ok_or(MediaError::NoActiveSession)?;

        if let Err(e) = handle.set_position(position_ms).await {
            error!("Seek failed: {}", e);
            self.inner.emit(SessionEvent::Error(e.to_string()));
            self.inner.teardown().await;
            return Err(MediaError::SeekFailed(e.to_string()));
        }

        {
            let mut state = self.inner.state_guard();
            state.position_ms = position_ms;
            state.is_seeking = false;
            state.phase = if state.is_playing {
                SessionPhase::Playing
            } else {
                SessionPhase::Paused
            };
        }

        self.inner.emit(SessionEvent::Seeked { position_ms });
        Ok(())
    }

    async fn pause_locked(&self) -> Result<(), MediaError> {
        let handle = {
            let state = self.inner.state_guard();
            if state.phase != SessionPhase::Playing {
                return Err(MediaError::InvalidPhase(state.phase));
            }
            self.inner.handle_guard().clone()
        };
        let handle = handle.ok_or(MediaError::NoActiveSession)?;

        // Polling stops before the resource pauses so no stale update lands.
        self.inner.cancel_polling();

        if let Err(e) = handle.pause().await {
            error!("Pause failed, tearing session down: {}", e);
            self.inner.emit(SessionEvent::Error(e.to_string()));
            self.inner.teardown().await;
            return Err(MediaError::PlaybackFailed(e.to_string()));
        }

        {
            let mut state = self.inner.state_guard();
            state.is_playing = false;
            state.phase = SessionPhase::Paused;
        }
        self.inner.emit(SessionEvent::Paused);
        debug!("Session paused");
        Ok(())
    }

    async fn resume_locked(&self) -> Result<(), MediaError> {
        let handle = {
            let state = self.inner.state_guard();
            if state.phase != SessionPhase::Paused {
                return Err(MediaError::InvalidPhase(state.phase));
            }
            self.inner.handle_guard().clone()
        };
        let handle = handle.ok_or(MediaError::NoActiveSession)?;

        if let Err(e) = handle.play().await {
            error!("Resume failed, tearing session down: {}", e);
            self.inner.emit(SessionEvent::Error(e.to_string()));
            self.inner.teardown().await;
            return Err(MediaError::PlaybackFailed(e.to_string()));
        }

        {
            let mut state = self.inner.state_guard();
            state.is_playing = true;
            state.phase = SessionPhase::Playing;
        }
        self.start_polling(handle);
        self.inner.emit(SessionEvent::Resumed);
        debug!("Session resumed");
        Ok(())
    }

    async fn load_and_play(&self, track: Track) -> Result<(), MediaError> {
        info!("Loading {:?} track {}", track.kind, track.id);

        {
            let mut state = self.inner.state_guard();
            state.track = Some(track.clone());
            state.phase = SessionPhase::Loading;
        }

        let handle = match self.backend.create(&track.uri).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create media resource for {}: {}", track.uri, e);
                {
                    let mut state = self.inner.state_guard();
                    *state = SessionState::default();
                }
                self.inner.emit(SessionEvent::Error(e.to_string()));
                return Err(MediaError::LoadFailed(e.to_string()));
            }
        };

        let duration_ms = match handle.status().await {
            Ok(status) => status.duration_ms,
            Err(e) => {
                warn!("Initial status query failed: {}", e);
                0
            }
        };

        *self.inner.handle_guard() = Some(Arc::clone(&handle));

        if let Err(e) = handle.play().await {
            error!("Auto-play after load failed: {}", e);
            self.inner.emit(SessionEvent::Error(e.to_string()));
            self.inner.teardown().await;
            return Err(MediaError::PlaybackFailed(e.to_string()));
        }

        {
            let mut state = self.inner.state_guard();
            state.phase = SessionPhase::Playing;
            state.is_playing = true;
            state.position_ms = 0;
            state.duration_ms = duration_ms;
            state.is_seeking = false;
        }

        self.start_polling(handle);
        self.inner.emit(SessionEvent::Loaded {
            track_id: track.id,
            duration_ms,
        });
        Ok(())
    }

    /// Refresh position/duration on a fixed interval while playing. The
    /// loop also notices natural end-of-track and backend errors; both end
    /// in a full teardown.
    fn start_polling(&self, handle: Arc<dyn MediaHandle>) {
        self.inner.cancel_polling();

        let inner = Arc::clone(&self.inner);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let (seeking, playing) = {
                    let state = inner.state_guard();
                    (state.is_seeking, state.phase == SessionPhase::Playing)
                };

                if seeking {
                    continue;
                }
                if !playing {
                    break;
                }

                match handle.status().await {
                    Ok(status) if status.did_just_finish => {
                        let track_id = inner
                            .state_guard()
                            .track
                            .as_ref()
                            .map(|t| t.id.clone())
                            .unwrap_or_default();
                        info!("Track {} finished", track_id);
                        inner.emit(SessionEvent::Finished { track_id });
                        inner.teardown().await;
                        break;
                    }
                    Ok(status) => {
                        if let Some(message) = status.error {
                            error!("Playback error reported by backend: {}", message);
                            inner.emit(SessionEvent::Error(message));
                            inner.teardown().await;
                            break;
                        }

                        {
                            let mut state = inner.state_guard();
                            // Re-check under the lock; a seek may have
                            // started while the status query was in flight.
                            if state.is_seeking {
                                continue;
                            }
                            state.position_ms = status.position_ms;
                            if status.duration_ms > 0 {
                                state.duration_ms = status.duration_ms;
                            }
                        }
                        let (position_ms, duration_ms) = {
                            let state = inner.state_guard();
                            (state.position_ms, state.duration_ms)
                        };
                        inner.emit(SessionEvent::PositionUpdate {
                            position_ms,
                            duration_ms,
                        });
                    }
                    Err(e) => {
                        error!("Status polling failed: {}", e);
                        inner.emit(SessionEvent::Error(e.to_string()));
                        inner.teardown().await;
                        break;
                    }
                }
            }
        });

        *self.inner.poll_task_guard() = Some(task);
    }
}

impl SessionInner {
    /// Full teardown in strict order: cancel polling bookkeeping, stop the
    /// resource, unload it, clear all session attributes. Failures along the
    /// way are logged and do not halt the remaining steps. No-op when no
    /// session exists.
    async fn teardown(&self) {
        let poll_task = self.poll_task_guard().take();
        let handle = self.handle_guard().take();

        if handle.is_none() && self.state_guard().track.is_none() {
            // Nothing to tear down; still make sure no timer survives.
            if let Some(task) = poll_task {
                task.abort();
            }
            return;
        }

        if let Some(handle) = handle {
            if let Err(e) = handle.stop().await {
                warn!("Stop during teardown failed: {}", e);
            }
            if let Err(e) = handle.unload().await {
                warn!("Unload during teardown failed: {}", e);
            }
        }

        {
            let mut state = self.state_guard();
            *state = SessionState::default();
            state.phase = SessionPhase::TornDown;
        }

        debug!("Session torn down");
        self.emit(SessionEvent::TornDown);

        // Aborting last keeps the cleanup above intact when the polling task
        // itself initiated the teardown.
        if let Some(task) = poll_task {
            task.abort();
        }
    }

    fn cancel_polling(&self) {
        if let Some(task) = self.poll_task_guard().take() {
            task.abort();
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(event);
    }

    fn state_guard(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    fn handle_guard(&self) -> MutexGuard<'_, Option<Arc<dyn MediaHandle>>> {
        lock(&self.handle)
    }

    fn poll_task_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        lock(&self.poll_task)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
