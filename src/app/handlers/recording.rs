// SPDX-License-Identifier: GPL-3.0-only

//! Video recording handlers

use crate::app::state::RecordingSnapshot;
use crate::app::{CameraMode, SessionEvent, SessionOrchestrator};
use crate::constants::RECORDING_TICK;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

impl SessionOrchestrator {
    /// Start or stop recording (Video mode only)
    pub async fn toggle_recording(&self) {
        if !self.accepts("recording") {
            return;
        }
        match self.inner.store.read(|state| state.recording) {
            RecordingSnapshot::Idle => self.start_recording().await,
            RecordingSnapshot::Recording { .. } => {
                self.stop_recording().await;
            }
            RecordingSnapshot::Starting | RecordingSnapshot::Stopping => {
                debug!("Recording transition in progress, ignoring toggle");
            }
        }
    }

    async fn start_recording(&self) {
        let claimed = self.inner.store.apply(|state| {
            if state.mode != CameraMode::Video
                || !state.recording.is_idle()
                || state.is_capturing
                || state.switching_mode
            {
                return false;
            }
            state.recording = RecordingSnapshot::Starting;
            true
        });
        if !claimed {
            debug!("Not in video mode or already recording, ignoring");
            return;
        }

        match self.inner.backends.camera.start_recording().await {
            Ok(()) => {
                // The mode may have changed while the camera was starting
                let committed = self.inner.store.apply(|state| {
                    if state.recording != RecordingSnapshot::Starting
                        || state.mode != CameraMode::Video
                        || state.switching_mode
                    {
                        return false;
                    }
                    state.recording = RecordingSnapshot::Recording { elapsed_secs: 0 };
                    true
                });
                if committed {
                    info!("Recording started");
                    self.spawn_recording_ticker();
                } else {
                    info!("Left video mode while recording started, finalizing");
                    self.inner.store.apply(|state| {
                        if state.recording != RecordingSnapshot::Starting {
                            return false;
                        }
                        state.recording = RecordingSnapshot::Stopping;
                        true
                    });
                    self.finalize_recording().await;
                }
            }
            Err(err) => {
                error!(error = %err, "Failed to start recording");
                self.inner
                    .store
                    .update(|state| state.recording = RecordingSnapshot::Idle);
                self.report_error(format!("Failed to start recording: {}", err));
            }
        }
    }

    /// Finalize a running recording; false when nothing was recording
    pub(in crate::app) async fn stop_recording(&self) -> bool {
        let claimed = self.inner.store.apply(|state| {
            if !state.recording.is_recording() {
                return false;
            }
            state.recording = RecordingSnapshot::Stopping;
            true
        });
        if !claimed {
            return false;
        }
        self.inner.tasks.recording_ticker.cancel();
        self.finalize_recording().await;
        true
    }

    async fn finalize_recording(&self) {
        let result = self.inner.backends.camera.stop_recording().await;
        self.inner
            .store
            .update(|state| state.recording = RecordingSnapshot::Idle);

        match result {
            Ok(path) => {
                info!(path = %path, "Recording saved");
                self.emit(SessionEvent::VideoRecorded(path));
            }
            Err(err) => {
                error!(error = %err, "Failed to finalize recording");
                self.report_error(format!("Failed to finalize recording: {}", err));
            }
        }
    }

    fn spawn_recording_ticker(&self) {
        let weak = self.downgrade();
        self.spawn_task(&self.inner.tasks.recording_ticker, move |_| async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval_at(started + RECORDING_TICK, RECORDING_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else {
                    break;
                };
                let elapsed_secs = started.elapsed().as_secs();
                this.inner.store.apply(|state| match &mut state.recording {
                    RecordingSnapshot::Recording { elapsed_secs: current } => {
                        *current = elapsed_secs;
                        true
                    }
                    _ => false,
                });
            }
        });
    }
}
