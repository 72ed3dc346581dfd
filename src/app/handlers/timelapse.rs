// SPDX-License-Identifier: GPL-3.0-only

//! Timelapse engine
//!
//! A sampler task copies the latest preview frame at a fixed interval while
//! recording. Stopping hands the accumulated frames to the media encoder.
//!
//! Lock order: the sample buffer is always taken before the session store,
//! and every state change that starts or stops frame growth happens with the
//! buffer held, so frames are only ever appended while the snapshot says
//! Recording.

use crate::app::state::{TimelapseSnapshot, TimelapseState};
use crate::app::{CameraMode, SessionEvent, SessionOrchestrator, lock};
use crate::backends::types::CameraFrame;
use crate::config::TimelapseConfig;
use crate::errors::EncodeError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Frames and timing of the timelapse being recorded
#[derive(Debug, Default)]
pub(in crate::app) struct TimelapseBuffer {
    frames: Vec<CameraFrame>,
    config: TimelapseConfig,
    /// Recording time of completed segments
    recorded: Duration,
    /// Start of the running segment, `None` while paused
    segment_started: Option<Instant>,
}

impl TimelapseBuffer {
    fn new(config: TimelapseConfig, now: Instant) -> Self {
        Self {
            frames: Vec::new(),
            config,
            recorded: Duration::ZERO,
            segment_started: Some(now),
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .segment_started
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        self.recorded + running
    }

    fn pause(&mut self, now: Instant) {
        if let Some(start) = self.segment_started.take() {
            self.recorded += now.saturating_duration_since(start);
        }
    }

    fn resume(&mut self, now: Instant) {
        self.segment_started.get_or_insert(now);
    }
}

impl SessionOrchestrator {
    // =========================================================================
    // Timelapse Handlers
    // =========================================================================

    /// Start sampling frames. Only in Timelapse mode and only from Idle.
    pub fn start_timelapse(&self, config: TimelapseConfig) -> bool {
        if !self.accepts("timelapse") {
            return false;
        }
        let config = config.clamped();
        let mut buffer = lock(&self.inner.timelapse);

        let started = self.inner.store.apply(|state| {
            if state.mode != CameraMode::Timelapse
                || state.timelapse.state != TimelapseState::Idle
                || state.switching_mode
            {
                return false;
            }
            state.timelapse = TimelapseSnapshot {
                state: TimelapseState::Recording,
                ..TimelapseSnapshot::default()
            };
            true
        });
        if !started {
            let (mode, current) = self
                .inner
                .store
                .read(|state| (state.mode, state.timelapse.state));
            warn!(?mode, state = ?current, "Cannot start timelapse");
            return false;
        }

        *buffer = TimelapseBuffer::new(config, Instant::now());
        drop(buffer);

        info!(
            interval_ms = config.interval_ms,
            output_fps = config.output_fps,
            "Timelapse started"
        );
        self.spawn_sampler(config.interval());
        true
    }

    pub fn pause_timelapse(&self) -> bool {
        let mut buffer = lock(&self.inner.timelapse);
        let now = Instant::now();

        let paused = self.inner.store.apply(|state| {
            if state.timelapse.state != TimelapseState::Recording {
                return false;
            }
            buffer.pause(now);
            state.timelapse.state = TimelapseState::Paused;
            state.timelapse.elapsed = buffer.elapsed(now);
            true
        });
        drop(buffer);

        if paused {
            self.inner.tasks.timelapse_sampler.cancel();
            info!("Timelapse paused");
        } else {
            debug!("Timelapse not recording, ignoring pause");
        }
        paused
    }

    pub fn resume_timelapse(&self) -> bool {
        let mut buffer = lock(&self.inner.timelapse);
        let now = Instant::now();

        let resumed = self.inner.store.apply(|state| {
            if state.timelapse.state != TimelapseState::Paused {
                return false;
            }
            buffer.resume(now);
            state.timelapse.state = TimelapseState::Recording;
            true
        });
        let interval = buffer.config.interval();
        drop(buffer);

        if resumed {
            info!("Timelapse resumed");
            self.spawn_sampler(interval);
        } else {
            debug!("Timelapse not paused, ignoring resume");
        }
        resumed
    }

    /// Stop sampling and encode what was captured
    pub fn stop_timelapse(&self) -> bool {
        let mut buffer = lock(&self.inner.timelapse);
        let now = Instant::now();

        let stopping = self.inner.store.apply(|state| {
            if !matches!(
                state.timelapse.state,
                TimelapseState::Recording | TimelapseState::Paused
            ) {
                return false;
            }
            buffer.pause(now);
            state.timelapse.state = TimelapseState::Encoding;
            state.timelapse.elapsed = buffer.elapsed(now);
            state.timelapse.encoding_progress = 0.0;
            true
        });
        if !stopping {
            debug!("No timelapse to stop");
            return false;
        }
        let frames = std::mem::take(&mut buffer.frames);
        let output_fps = buffer.config.output_fps;
        drop(buffer);

        self.inner.tasks.timelapse_sampler.cancel();

        if frames.is_empty() {
            warn!("Timelapse stopped before any frame was captured");
            self.inner
                .store
                .update(|state| state.timelapse = TimelapseSnapshot::default());
            self.report_error(format!("Timelapse encoding failed: {}", EncodeError::NoFrames));
            return true;
        }

        info!(frames = frames.len(), output_fps, "Encoding timelapse");
        let this = self.clone();
        self.spawn_task(&self.inner.tasks.timelapse_encode, move |_| async move {
            this.encode_timelapse(frames, output_fps).await;
        });
        true
    }

    /// Discard the capture without encoding
    pub fn cancel_timelapse(&self) -> bool {
        let mut buffer = lock(&self.inner.timelapse);

        let cancelled = self.inner.store.apply(|state| {
            if !matches!(
                state.timelapse.state,
                TimelapseState::Recording | TimelapseState::Paused
            ) {
                return false;
            }
            state.timelapse = TimelapseSnapshot {
                state: TimelapseState::Cancelled,
                ..TimelapseSnapshot::default()
            };
            true
        });
        if !cancelled {
            debug!("No timelapse to cancel");
            return false;
        }

        let discarded = buffer.frames.len();
        *buffer = TimelapseBuffer::default();
        drop(buffer);

        self.inner.tasks.timelapse_sampler.cancel();
        info!(discarded, "Timelapse cancelled");

        self.inner.store.apply(|state| {
            if state.timelapse.state != TimelapseState::Cancelled {
                return false;
            }
            state.timelapse.state = TimelapseState::Idle;
            true
        });
        true
    }

    fn spawn_sampler(&self, interval: Duration) {
        let weak = self.downgrade();
        self.spawn_task(&self.inner.tasks.timelapse_sampler, move |token| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else {
                    break;
                };
                this.sample_timelapse_frame(&token);
            }
        });
    }

    fn sample_timelapse_frame(&self, token: &CancellationToken) {
        let mut buffer = lock(&self.inner.timelapse);
        if token.is_cancelled() {
            return;
        }

        let recording = self
            .inner
            .store
            .read(|state| state.timelapse.state == TimelapseState::Recording);
        if !recording {
            return;
        }

        let Some(frame) = self.inner.frames.copy_latest() else {
            debug!("No preview frame yet, skipping timelapse tick");
            return;
        };
        buffer.frames.push(frame);

        let frames_captured = buffer.frames.len() as u32;
        let elapsed = buffer.elapsed(Instant::now());
        self.inner.store.apply(|state| {
            if state.timelapse.state != TimelapseState::Recording {
                return false;
            }
            state.timelapse.frames_captured = frames_captured;
            state.timelapse.elapsed = elapsed;
            true
        });
        debug!(frames_captured, "Timelapse frame captured");
    }

    async fn encode_timelapse(&self, frames: Vec<CameraFrame>, output_fps: u32) {
        let (progress_tx, mut progress_rx) = watch::channel(0.0f32);
        let encoder = self.inner.backends.encoder.clone();
        let encode = encoder.encode(frames, output_fps, progress_tx);
        tokio::pin!(encode);

        let result = loop {
            tokio::select! {
                result = &mut encode => break result,
                Ok(()) = progress_rx.changed() => {
                    let progress = progress_rx.borrow_and_update().clamp(0.0, 1.0);
                    self.inner.store.apply(|state| {
                        if state.timelapse.state != TimelapseState::Encoding {
                            return false;
                        }
                        state.timelapse.encoding_progress = progress;
                        true
                    });
                }
            }
        };

        match result {
            Ok(path) => {
                info!(path = %path, "Timelapse encoded");
                self.inner
                    .store
                    .update(|state| state.timelapse = TimelapseSnapshot::default());
                self.emit(SessionEvent::VideoRecorded(path));
            }
            Err(err) => {
                error!(error = %err, "Timelapse encoding failed");
                self.inner
                    .store
                    .update(|state| state.timelapse = TimelapseSnapshot::default());
                self.report_error(format!("Timelapse encoding failed: {}", err));
            }
        }
    }
}
