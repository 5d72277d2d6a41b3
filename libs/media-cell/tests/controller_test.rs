use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;

use media_cell::{
    MediaBackend, MediaError, MediaHandle, MediaKind, MediaSessionController, PlaybackStatus,
    SessionEvent, SessionPhase, Track,
};

const POLL: Duration = Duration::from_millis(20);

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Track {}", id),
        uri: format!("https://media.example/{}.mp3", id),
        kind: MediaKind::Audio,
    }
}

/// Scripted stand-in for the native player. Records every call in a shared
/// ordered log and tracks how many handles are live at once.
struct FakeBackend {
    created: AtomicUsize,
    fail_create: AtomicBool,
    live_handles: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    ops: Arc<Mutex<Vec<String>>>,
    last_handle: Mutex<Option<Arc<FakeHandle>>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            created: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            live_handles: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
            ops: Arc::new(Mutex::new(Vec::new())),
            last_handle: Mutex::new(None),
        })
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn handle(&self) -> Arc<FakeHandle> {
        self.last_handle.lock().unwrap().clone().expect("no handle created")
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn create(&self, uri: &str) -> Result<Arc<dyn MediaHandle>, MediaError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("decode error".to_string()));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        let live = self.live_handles.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.ops.lock().unwrap().push(format!("create {}", uri));

        let handle = Arc::new(FakeHandle {
            uri: uri.to_string(),
            live_handles: Arc::clone(&self.live_handles),
            ops: Arc::clone(&self.ops),
            status_calls: AtomicUsize::new(0),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(60_000),
            playing: AtomicBool::new(false),
            finish_next: AtomicBool::new(false),
            fail_pause: AtomicBool::new(false),
            unloaded: AtomicBool::new(false),
        });
        *self.last_handle.lock().unwrap() = Some(Arc::clone(&handle));
        Ok(handle)
    }
}

struct FakeHandle {
    uri: String,
    live_handles: Arc<AtomicUsize>,
    ops: Arc<Mutex<Vec<String>>>,
    status_calls: AtomicUsize,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
    playing: AtomicBool,
    finish_next: AtomicBool,
    fail_pause: AtomicBool,
    unloaded: AtomicBool,
}

impl FakeHandle {
    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHandle for FakeHandle {
    async fn play(&self) -> Result<(), MediaError> {
        self.ops.lock().unwrap().push(format!("play {}", self.uri));
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), MediaError> {
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("pause rejected".to_string()));
        }
        self.ops.lock().unwrap().push(format!("pause {}", self.uri));
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), MediaError> {
        self.ops.lock().unwrap().push(format!("stop {}", self.uri));
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn unload(&self) -> Result<(), MediaError> {
        self.ops.lock().unwrap().push(format!("unload {}", self.uri));
        if !self.unloaded.swap(true, Ordering::SeqCst) {
            self.live_handles.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn set_position(&self, position_ms: u64) -> Result<(), MediaError> {
        self.ops
            .lock()
            .unwrap()
            .push(format!("seek {} {}", self.uri, position_ms));
        self.position_ms.store(position_ms, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus, MediaError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let position = self.position_ms.fetch_add(100, Ordering::SeqCst);
        Ok(PlaybackStatus {
            is_loaded: true,
            is_playing: self.playing.load(Ordering::SeqCst),
            position_ms: position,
            duration_ms: self.duration_ms.load(Ordering::SeqCst),
            did_just_finish: self.finish_next.load(Ordering::SeqCst),
            error: None,
        })
    }
}

fn controller(backend: &Arc<FakeBackend>) -> MediaSessionController {
    let backend: Arc<dyn MediaBackend> = backend.clone();
    MediaSessionController::with_poll_interval(backend, POLL)
}

async fn ticks(n: u32) {
    tokio::time::sleep(POLL * n).await;
}

#[tokio::test]
async fn switching_tracks_never_overlaps_handles() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    ticks(2).await;
    controller.toggle(track("b")).await.unwrap();

    assert_eq!(backend.created(), 2);
    assert_eq!(
        backend.max_live.load(Ordering::SeqCst),
        1,
        "two native handles must never be live at once"
    );

    // Full stop+unload of A precedes B's create.
    let ops = backend.ops();
    let stop_a = ops
        .iter()
        .position(|op| op == "stop https://media.example/a.mp3")
        .expect("a stopped");
    let unload_a = ops
        .iter()
        .position(|op| op == "unload https://media.example/a.mp3")
        .expect("a unloaded");
    let create_b = ops
        .iter()
        .position(|op| op == "create https://media.example/b.mp3")
        .expect("b created");
    assert!(stop_a < unload_a && unload_a < create_b);
}

#[tokio::test]
async fn same_track_toggling_reuses_the_resource() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    assert_eq!(controller.snapshot().phase, SessionPhase::Playing);

    controller.toggle(track("a")).await.unwrap();
    assert_eq!(controller.snapshot().phase, SessionPhase::Paused);
    assert!(!controller.snapshot().is_playing);

    controller.toggle(track("a")).await.unwrap();
    assert_eq!(controller.snapshot().phase, SessionPhase::Playing);

    assert_eq!(backend.created(), 1, "toggling must not recreate the resource");
}

#[tokio::test]
async fn polling_updates_position_while_playing() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    ticks(4).await;

    let snapshot = controller.snapshot();
    assert!(snapshot.position_ms > 0, "position should advance via polling");
    assert_eq!(snapshot.duration_ms, 60_000);
}

#[tokio::test]
async fn seeking_suppresses_polling_overwrites() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    ticks(2).await;

    controller.begin_seek().unwrap();
    let frozen = controller.snapshot().position_ms;
    ticks(4).await;
    assert_eq!(
        controller.snapshot().position_ms,
        frozen,
        "no poll update may land while seeking"
    );

    controller.commit_seek(42_000).await.unwrap();
    assert_eq!(controller.snapshot().position_ms, 42_000);
    assert_eq!(controller.snapshot().phase, SessionPhase::Playing);

    let ops = backend.ops();
    assert!(ops.contains(&"seek https://media.example/a.mp3 42000".to_string()));
}

#[tokio::test]
async fn natural_finish_tears_the_session_down() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);
    let mut events = controller.subscribe();

    controller.toggle(track("a")).await.unwrap();
    backend.handle().finish_next.store(true, Ordering::SeqCst);
    ticks(4).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::TornDown);
    assert_eq!(snapshot.track, None);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.duration_ms, 0);

    let ops = backend.ops();
    assert!(ops.contains(&"unload https://media.example/a.mp3".to_string()));

    let mut saw_finished = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::Finished { ref track_id } if track_id == "a") {
            saw_finished = true;
        }
    }
    assert!(saw_finished, "owning screens close on the Finished event");
}

#[tokio::test]
async fn no_timer_survives_teardown() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    ticks(3).await;
    controller.stop().await;

    let handle = backend.handle();
    let calls_after_stop = handle.status_calls();
    ticks(5).await;
    assert_eq!(
        handle.status_calls(),
        calls_after_stop,
        "polling must stop immediately on teardown"
    );
}

#[tokio::test]
async fn pause_cancels_polling_until_resume() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    ticks(2).await;
    controller.pause().await.unwrap();

    let handle = backend.handle();
    let calls_while_paused = handle.status_calls();
    ticks(4).await;
    assert_eq!(handle.status_calls(), calls_while_paused);

    controller.resume().await.unwrap();
    ticks(3).await;
    assert!(handle.status_calls() > calls_while_paused);
}

#[tokio::test]
async fn backgrounding_pauses_but_keeps_the_session() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    controller.handle_app_background().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.track.as_ref().map(|t| t.id.as_str()), Some("a"));

    // Pause, not stop: the resource stays loaded, and nothing auto-resumes.
    let ops = backend.ops();
    assert!(!ops.iter().any(|op| op.starts_with("stop")));
    ticks(4).await;
    assert_eq!(controller.snapshot().phase, SessionPhase::Paused);

    // Backgrounding while already paused is a no-op.
    controller.handle_app_background().await;
    assert_eq!(controller.snapshot().phase, SessionPhase::Paused);
}

#[tokio::test]
async fn load_failure_surfaces_error_and_returns_to_idle() {
    let backend = FakeBackend::new();
    backend.fail_create.store(true, Ordering::SeqCst);
    let controller = controller(&backend);
    let mut events = controller.subscribe();

    let result = controller.toggle(track("a")).await;
    assert_matches!(result, Err(MediaError::LoadFailed(_)));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.track, None);

    assert_matches!(events.try_recv(), Ok(SessionEvent::Error(_)));
}

#[tokio::test]
async fn pause_failure_tears_the_session_down() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    backend.handle().fail_pause.store(true, Ordering::SeqCst);

    let result = controller.pause().await;
    assert_matches!(result, Err(MediaError::PlaybackFailed(_)));
    assert_eq!(controller.snapshot().phase, SessionPhase::TornDown);
    assert!(backend
        .ops()
        .contains(&"unload https://media.example/a.mp3".to_string()));
}

#[tokio::test]
async fn stop_without_session_is_a_no_op() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);
    let mut events = controller.subscribe();

    controller.stop().await;

    assert_eq!(controller.snapshot().phase, SessionPhase::Idle);
    assert!(events.try_recv().is_err(), "no event for a no-op stop");
}

#[tokio::test]
async fn replaying_after_finish_creates_a_fresh_session() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    controller.toggle(track("a")).await.unwrap();
    backend.handle().finish_next.store(true, Ordering::SeqCst);
    ticks(4).await;
    assert_eq!(controller.snapshot().phase, SessionPhase::TornDown);

    controller.toggle(track("a")).await.unwrap();
    assert_eq!(controller.snapshot().phase, SessionPhase::Playing);
    assert_eq!(backend.created(), 2);
}
