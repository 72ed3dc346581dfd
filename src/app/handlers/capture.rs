// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles the self-timer countdown, still capture, the shutter flash
//! overlay, portrait blur and the gallery thumbnail.

use crate::app::state::{BlurSummary, SessionState};
use crate::app::{CameraMode, SessionEvent, SessionOrchestrator, Thumbnail, lock};
use crate::backends::types::{BlurConfig, CameraFrame, CaptureRequest, LensFacing};
use crate::constants::adjustments::PORTRAIT_BLUR_STRENGTH;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Clears the capturing flag when the capture task ends, however it ends
struct CaptureGuard(SessionOrchestrator);

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.0.inner.store.apply(SessionState::finish_capture);
    }
}

impl SessionOrchestrator {
    // =========================================================================
    // Capture Operations Handlers
    // =========================================================================

    /// Shutter pressed: capture now, or start the self-timer first.
    ///
    /// Ignored while a capture or countdown is already running.
    pub fn take_photo(&self) {
        if !self.accepts("take photo") {
            return;
        }
        let timer = self.inner.store.read(|state| state.photo_timer);
        let Some(seconds) = timer.seconds() else {
            self.execute_capture();
            return;
        };

        if !self
            .inner
            .store
            .apply(|state| state.begin_countdown(seconds))
        {
            debug!("Capture or countdown already in progress, ignoring shutter");
            return;
        }
        info!(seconds, "Starting photo countdown");
        self.spawn_countdown(seconds);
    }

    /// Start a countdown of `seconds`, replacing any countdown already running
    pub fn start_countdown(&self, seconds: u32) {
        if !self.accepts("countdown") {
            return;
        }
        if seconds == 0 {
            self.execute_capture();
            return;
        }
        self.inner.tasks.countdown.cancel();
        if !self
            .inner
            .store
            .apply(|state| state.restart_countdown(seconds))
        {
            debug!("Capture in progress, not starting countdown");
            return;
        }
        info!(seconds, "Restarting photo countdown");
        self.spawn_countdown(seconds);
    }

    /// Abort a running countdown without capturing
    pub fn cancel_countdown(&self) -> bool {
        self.inner.tasks.countdown.cancel();
        let cleared = self.inner.store.apply(SessionState::end_countdown);
        if cleared {
            info!("Countdown cancelled");
        }
        cleared
    }

    fn spawn_countdown(&self, seconds: u32) {
        let this = self.clone();
        let tick = self.inner.config.countdown_tick();
        self.spawn_task(&self.inner.tasks.countdown, move |token| async move {
            for remaining in (1..seconds).rev() {
                tokio::time::sleep(tick).await;
                this.inner
                    .store
                    .apply(|state| !token.is_cancelled() && state.tick_countdown(remaining));
                debug!(remaining, "Countdown tick");
            }
            tokio::time::sleep(tick).await;

            // Checked under the store lock: a cancelled countdown never captures
            if this
                .inner
                .store
                .apply(|state| !token.is_cancelled() && state.finish_countdown())
            {
                this.launch_capture();
            }
        });
    }

    /// Take a still immediately (no countdown)
    pub fn execute_capture(&self) {
        if !self.accepts("capture") {
            return;
        }
        if !self.inner.store.apply(SessionState::claim_capture) {
            debug!("Capture already in progress, ignoring");
            return;
        }
        self.launch_capture();
    }

    /// Run the capture for an already claimed pipeline
    fn launch_capture(&self) {
        self.schedule_flash_clear();
        let this = self.clone();
        self.spawn_task(&self.inner.tasks.capture, move |_| async move {
            this.perform_capture().await;
        });
    }

    fn schedule_flash_clear(&self) {
        let this = self.clone();
        let delay = self.inner.config.flash_clear_delay();
        self.spawn_task(&self.inner.tasks.flash_clear, move |_| async move {
            tokio::time::sleep(delay).await;
            this.inner.store.apply(SessionState::clear_flash);
        });
    }

    async fn perform_capture(&self) {
        let _guard = CaptureGuard(self.clone());
        let state = self.inner.store.snapshot();
        info!(mode = ?state.mode, flash = ?state.flash_mode, "Capturing photo");

        let processed_frame = if state.mode == CameraMode::Portrait {
            self.run_portrait_blur(state.lens_facing).await
        } else {
            None
        };

        let request = CaptureRequest {
            mode: state.mode,
            lens_facing: state.lens_facing,
            flash: state.flash_mode,
            hdr: state.hdr_enabled,
            macro_focus: state.macro_enabled,
            aspect_ratio: state.aspect_ratio,
            zoom: state.zoom_level,
            filter: state.filter,
            filter_intensity: state.filter_intensity,
            beauty_level: state.beauty_level,
            mirror: self.inner.config.mirror_preview && state.lens_facing.is_front(),
            processed_frame,
        };

        match self.inner.backends.camera.capture_photo(request).await {
            Ok(uri) => {
                info!(uri = %uri, "Photo captured");
                self.emit(SessionEvent::PhotoCaptured(uri));
                self.refresh_thumbnail().await;
            }
            Err(err) => {
                error!(error = %err, "Photo capture failed");
                self.report_error(format!("Photo capture failed: {}", err));
            }
        }
    }

    /// Blur a copy of the latest preview frame; `None` captures without it
    async fn run_portrait_blur(&self, lens_facing: LensFacing) -> Option<CameraFrame> {
        let Some(frame) = self.inner.frames.copy_latest() else {
            debug!("No preview frame for portrait blur");
            return None;
        };

        let config = BlurConfig {
            strength: PORTRAIT_BLUR_STRENGTH,
            lens_facing,
        };
        let result = self.inner.backends.portrait_blur.process(frame, config).await;

        match result {
            Ok(outcome) => {
                info!(
                    success = outcome.success,
                    has_person = outcome.has_person,
                    timing_ms = outcome.timing_ms,
                    "Portrait blur finished"
                );
                let summary = BlurSummary {
                    success: outcome.success,
                    has_person: outcome.has_person,
                    timing_ms: outcome.timing_ms,
                };
                self.inner.store.update(|state| {
                    state.last_blur = Some(summary);
                    state.blur_progress = None;
                });
                outcome.success.then_some(outcome.frame)
            }
            Err(err) => {
                warn!(error = %err, "Portrait blur failed, capturing without it");
                self.inner.store.update(|state| {
                    state.last_blur = Some(BlurSummary {
                        success: false,
                        has_person: false,
                        timing_ms: 0,
                    });
                    state.blur_progress = None;
                });
                None
            }
        }
    }

    /// Rebuild the gallery thumbnail from the last preview frame (best effort)
    async fn refresh_thumbnail(&self) {
        let Some(frame) = self.inner.frames.copy_latest() else {
            debug!("No preview frame available for thumbnail");
            return;
        };
        let max_dimension = self.inner.config.thumbnail_max_dimension;

        let built =
            tokio::task::spawn_blocking(move || Thumbnail::from_frame(&frame, max_dimension))
                .await;

        match built {
            Ok(Some(thumbnail)) => {
                debug!(
                    width = thumbnail.width(),
                    height = thumbnail.height(),
                    "Gallery thumbnail updated"
                );
                {
                    let mut held = lock(&self.inner.thumbnail);
                    drop(held.take());
                    *held = Some(Arc::new(thumbnail));
                }
                self.inner
                    .store
                    .update(|state| state.thumbnail_generation += 1);
            }
            Ok(None) => warn!("Preview frame too short for a thumbnail"),
            Err(err) => warn!(error = %err, "Thumbnail task failed"),
        }
    }
}
