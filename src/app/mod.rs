// SPDX-License-Identifier: GPL-3.0-only

//! Camera session orchestrator
//!
//! Owns the session state and every background task of a live camera
//! session. Frames, user actions, detector output and timers all funnel into
//! [`SessionOrchestrator`], which serializes them into one observable
//! [`SessionState`] plus a stream of one-shot [`SessionEvent`]s.
//!
//! # Architecture
//!
//! - `state`: the session state value and its named transitions
//! - `store`: the single serialized update path for that state
//! - `task_slot`: single-owner cancellable task handles
//! - `frame_guard`: the latest preview frame and copy-on-hand-off access
//! - `popup`: the overlay coordinator
//! - `histogram`, `thumbnail`: frame-derived products
//! - `handlers`: the operations, split by functional domain

mod frame_guard;
mod handlers;
pub mod histogram;
pub mod popup;
pub mod state;
mod store;
mod task_slot;
pub mod thumbnail;

use crate::backends::{Backends, FrameStream};
use crate::config::Config;
use crate::errors::{SessionError, SessionResult};
use frame_guard::FrameGuard;
use futures::StreamExt;
use futures::stream::BoxStream;
use handlers::timelapse::TimelapseBuffer;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use store::SessionStore;
use task_slot::TaskSlot;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use histogram::Histogram;
pub use popup::{PopupKind, PopupState};
pub use state::{
    BlurSummary, CameraMode, FilterType, FocusRequest, PhotoTimerSetting, ProSettings,
    RecordingSnapshot, SessionState, TimelapseSnapshot, TimelapseState,
};
pub use thumbnail::Thumbnail;

/// One-shot notifications for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A still was stored at this URI
    PhotoCaptured(String),
    /// A video or timelapse was stored at this path
    VideoRecorded(String),
    /// The active lens changed
    CameraSwitched,
    /// A collaborator failed; the session keeps running
    Error(String),
}

/// Poison-tolerant lock; a panicked task must not wedge the session
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One slot per kind of background work
struct TaskSlots {
    countdown: TaskSlot,
    capture: TaskSlot,
    flash_clear: TaskSlot,
    focus_request: TaskSlot,
    focus_expiry: TaskSlot,
    timelapse_sampler: TaskSlot,
    timelapse_encode: TaskSlot,
    recording_ticker: TaskSlot,
    frame_loop: TaskSlot,
    histogram: TaskSlot,
    face_events: TaskSlot,
    document_events: TaskSlot,
    night_progress: TaskSlot,
    blur_progress: TaskSlot,
}

impl TaskSlots {
    fn new() -> Self {
        Self {
            countdown: TaskSlot::new("countdown"),
            capture: TaskSlot::new("capture"),
            flash_clear: TaskSlot::new("flash-clear"),
            focus_request: TaskSlot::new("focus-request"),
            focus_expiry: TaskSlot::new("focus-expiry"),
            timelapse_sampler: TaskSlot::new("timelapse-sampler"),
            timelapse_encode: TaskSlot::new("timelapse-encode"),
            recording_ticker: TaskSlot::new("recording-ticker"),
            frame_loop: TaskSlot::new("frame-loop"),
            histogram: TaskSlot::new("histogram"),
            face_events: TaskSlot::new("face-events"),
            document_events: TaskSlot::new("document-events"),
            night_progress: TaskSlot::new("night-progress"),
            blur_progress: TaskSlot::new("blur-progress"),
        }
    }

    fn all(&self) -> [&TaskSlot; 14] {
        [
            &self.countdown,
            &self.capture,
            &self.flash_clear,
            &self.focus_request,
            &self.focus_expiry,
            &self.timelapse_sampler,
            &self.timelapse_encode,
            &self.recording_ticker,
            &self.frame_loop,
            &self.histogram,
            &self.face_events,
            &self.document_events,
            &self.night_progress,
            &self.blur_progress,
        ]
    }
}

struct Inner {
    session_id: Uuid,
    config: Config,
    store: SessionStore,
    events: mpsc::UnboundedSender<SessionEvent>,
    backends: Backends,
    frames: FrameGuard,
    thumbnail: Mutex<Option<Arc<Thumbnail>>>,
    timelapse: Mutex<TimelapseBuffer>,
    tasks: TaskSlots,
    root: CancellationToken,
    runtime: Handle,
    /// Serializes mode transitions
    transition_lock: tokio::sync::Mutex<()>,
    focus_sequence: AtomicU64,
    frames_received: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Handle to a running camera session
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct SessionOrchestrator {
    inner: Arc<Inner>,
}

/// Session reference held by endless background loops
#[derive(Clone)]
struct WeakSession(Weak<Inner>);

impl WeakSession {
    fn upgrade(&self) -> Option<SessionOrchestrator> {
        self.0.upgrade().map(|inner| SessionOrchestrator { inner })
    }
}

impl SessionOrchestrator {
    /// Start a session on the current tokio runtime.
    ///
    /// Subscribes to every detector and processor stream immediately and
    /// returns the receiving end of the event channel.
    pub fn new(
        config: Config,
        backends: Backends,
    ) -> SessionResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let config = config.validated();

        let initial = SessionState {
            photo_timer: config.photo_timer,
            filter: config.filter,
            filter_intensity: config.filter_intensity,
            beauty_level: config.beauty_level,
            histogram_enabled: config.histogram_enabled,
            exposure_compensation: backends.camera.exposure_range().neutral(),
            ..SessionState::default()
        };

        let (events, events_rx) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();
        let orchestrator = Self {
            inner: Arc::new(Inner {
                session_id,
                config,
                store: SessionStore::new(initial),
                events,
                backends,
                frames: FrameGuard::new(),
                thumbnail: Mutex::new(None),
                timelapse: Mutex::new(TimelapseBuffer::default()),
                tasks: TaskSlots::new(),
                root: CancellationToken::new(),
                runtime,
                transition_lock: tokio::sync::Mutex::new(()),
                focus_sequence: AtomicU64::new(0),
                frames_received: AtomicU64::new(0),
            }),
        };

        orchestrator.spawn_subscriptions();
        info!(session = %session_id, "Camera session started");
        Ok((orchestrator, events_rx))
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Receiver that always holds the latest session state
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.store.subscribe()
    }

    /// Snapshot of the current session state
    pub fn state(&self) -> SessionState {
        self.inner.store.snapshot()
    }

    /// Frame pairs delivered so far
    pub fn frames_received(&self) -> u64 {
        self.inner.frames_received.load(Ordering::Relaxed)
    }

    /// Latest gallery thumbnail, if a photo has been taken
    pub fn gallery_thumbnail(&self) -> Option<Arc<Thumbnail>> {
        lock(&self.inner.thumbnail).clone()
    }

    /// Consume `source` on a background task, replacing any previous source
    pub fn attach_frame_source(&self, source: FrameStream) {
        if !self.accepts("attach frame source") {
            return;
        }
        info!("Attaching frame source");
        self.spawn_subscription(&self.inner.tasks.frame_loop, source, |this, pair| {
            this.on_frame(pair)
        });
    }

    /// Cancel every task and release every held buffer.
    ///
    /// Afterwards the state is frozen: operations are ignored and late
    /// background results are dropped.
    pub fn shutdown(&self) {
        info!(session = %self.inner.session_id, "Shutting down camera session");
        self.inner.root.cancel();
        for slot in self.inner.tasks.all() {
            slot.cancel();
        }

        self.inner.backends.face_detector.disable();
        self.inner.backends.document_detector.disable();

        self.inner.frames.close();
        lock(&self.inner.thumbnail).take();
        *lock(&self.inner.timelapse) = TimelapseBuffer::default();

        self.inner.store.close(|state| {
            state.countdown = None;
            state.is_capturing = false;
            state.flash_active = false;
            state.focus = None;
            state.is_focusing = false;
            state.night_progress = None;
            state.blur_progress = None;
            state.timelapse = TimelapseSnapshot::default();
            state.recording = RecordingSnapshot::Idle;
            state.switching_mode = false;
        });
    }

    /// Whether [`SessionOrchestrator::shutdown`] has run
    pub fn is_shut_down(&self) -> bool {
        self.inner.root.is_cancelled()
    }

    // =========================================================================
    // Internal helpers shared by the handlers
    // =========================================================================

    /// False once the session is shut down
    fn accepts(&self, operation: &'static str) -> bool {
        if self.is_shut_down() {
            debug!(operation, "Session shut down, ignoring");
            return false;
        }
        true
    }

    /// Start `make` in `slot`, cancelling whatever ran there before
    fn spawn_task<F, Fut>(&self, slot: &TaskSlot, make: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        slot.replace(&self.inner.runtime, &self.inner.root, make);
    }

    fn downgrade(&self) -> WeakSession {
        WeakSession(Arc::downgrade(&self.inner))
    }

    /// Feed every item of `stream` to `handle` until the stream ends or the
    /// session goes away. Holds only a weak reference between items.
    fn spawn_subscription<T, H>(&self, slot: &TaskSlot, stream: BoxStream<'static, T>, handle: H)
    where
        T: Send + 'static,
        H: Fn(&SessionOrchestrator, T) + Send + 'static,
    {
        let weak = self.downgrade();
        self.spawn_task(slot, move |_| async move {
            let mut stream = stream;
            while let Some(item) = stream.next().await {
                let Some(this) = weak.upgrade() else {
                    break;
                };
                handle(&this, item);
            }
            debug!("Subscription stream ended");
        });
    }

    fn emit(&self, event: SessionEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }

    /// Record a non-fatal failure in state and emit it as an event
    fn report_error(&self, message: String) {
        warn!(error = %message, "Session error");
        let recorded = message.clone();
        self.inner.store.update(|state| state.record_error(recorded));
        self.emit(SessionEvent::Error(message));
    }
}
