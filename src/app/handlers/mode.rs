// SPDX-License-Identifier: GPL-3.0-only

//! Mode controller
//!
//! Switching modes tears down what the old mode enabled, applies the new
//! mode's presets and commits the mode last. Camera parameter failures on the
//! way are reported but never stop the transition.

use crate::app::popup::PopupKind;
use crate::app::state::{SessionState, TimelapseState};
use crate::app::{CameraMode, SessionOrchestrator};
use crate::errors::CameraError;
use tracing::{debug, info, warn};

/// Lifts the switching flag if a transition is dropped halfway
struct ModeSwitchGuard<'a>(&'a SessionOrchestrator);

impl Drop for ModeSwitchGuard<'_> {
    fn drop(&mut self) {
        self.0.inner.store.apply(SessionState::end_mode_switch);
    }
}

impl SessionOrchestrator {
    /// Switch to `mode`.
    ///
    /// Reselecting Pro toggles its settings panel; reselecting any other
    /// active mode does nothing. Concurrent calls are serialized, and no
    /// capture, countdown or recording may start until the switch commits.
    pub async fn select_mode(&self, mode: CameraMode) {
        if !self.accepts("select mode") {
            return;
        }
        let _transition = self.inner.transition_lock.lock().await;

        let current = self.inner.store.read(|state| state.mode);
        if current == mode {
            if mode == CameraMode::Pro {
                debug!("Pro mode reselected, toggling pro settings");
                self.inner
                    .store
                    .update(|state| state.popups.toggle(PopupKind::ProSettings));
            } else {
                debug!(?mode, "Mode already active");
            }
            return;
        }

        info!(from = ?current, to = ?mode, "Switching camera mode");
        self.inner.store.update(SessionState::begin_mode_switch);
        let _switching = ModeSwitchGuard(self);
        self.inner.tasks.countdown.cancel();

        self.exit_mode(current).await;
        self.enter_mode(mode).await;

        // Anything mirrored while the old mode was still committed goes too
        self.inner.store.update(|state| {
            state.clear_mode_state(current);
            state.mode = mode;
            state.end_mode_switch();
        });
        info!(?mode, "Camera mode active");
    }

    async fn exit_mode(&self, mode: CameraMode) {
        let backends = &self.inner.backends;
        match mode {
            CameraMode::Portrait => {
                backends.face_detector.disable_tracking_focus();
                backends.face_detector.disable();
            }
            CameraMode::Document => backends.document_detector.disable(),
            CameraMode::Night => {
                let result = backends.camera.set_night_mode(false).await;
                self.camera_result("night mode", result);
                self.apply_exposure(backends.camera.exposure_range().neutral())
                    .await;
                self.apply_hdr(false).await;
            }
            CameraMode::Pro => {
                self.apply_exposure(backends.camera.exposure_range().neutral())
                    .await;
            }
            CameraMode::Video => {
                if self.inner.store.read(|state| state.recording.is_recording()) {
                    info!("Leaving video mode, finalizing recording");
                    self.stop_recording().await;
                }
            }
            CameraMode::Timelapse => {
                match self.inner.store.read(|state| state.timelapse.state) {
                    TimelapseState::Recording | TimelapseState::Paused => {
                        info!("Leaving timelapse mode, discarding capture");
                        self.cancel_timelapse();
                    }
                    TimelapseState::Encoding => {
                        debug!("Leaving timelapse mode while encoding, letting it finish");
                    }
                    TimelapseState::Idle | TimelapseState::Cancelled => {}
                }
            }
            CameraMode::Photo => {}
        }
        self.inner
            .store
            .update(|state| state.clear_mode_state(mode));
    }

    async fn enter_mode(&self, mode: CameraMode) {
        let backends = &self.inner.backends;
        match mode {
            CameraMode::Portrait => {
                backends.face_detector.enable();
                backends.face_detector.enable_tracking_focus();
            }
            CameraMode::Document => backends.document_detector.enable(),
            CameraMode::Night => {
                let result = backends.camera.set_night_mode(true).await;
                self.camera_result("night mode", result);
                let index = backends
                    .camera
                    .exposure_range()
                    .positive_fraction(self.inner.config.night_exposure_ratio);
                debug!(index, "Applying night exposure");
                self.apply_exposure(index).await;
                self.apply_hdr(true).await;
            }
            CameraMode::Pro => {
                let normalized = self.inner.store.read(|state| state.pro.exposure);
                let index = backends
                    .camera
                    .exposure_range()
                    .index_for_normalized(normalized);
                self.apply_exposure(index).await;
            }
            CameraMode::Photo | CameraMode::Video | CameraMode::Timelapse => {}
        }
    }

    /// Set the exposure index on the camera, mirroring it into state on success
    pub(in crate::app) async fn apply_exposure(&self, index: i32) -> bool {
        let index = self.inner.backends.camera.exposure_range().clamp(index);
        let result = self.inner.backends.camera.set_exposure(index).await;
        if self.camera_result("exposure", result).is_none() {
            return false;
        }
        self.inner.store.apply(|state| {
            let changed = state.exposure_compensation != index;
            state.exposure_compensation = index;
            changed
        });
        true
    }

    pub(in crate::app) async fn apply_hdr(&self, enabled: bool) -> bool {
        let result = self.inner.backends.camera.set_hdr(enabled).await;
        if self.camera_result("hdr", result).is_none() {
            return false;
        }
        self.inner.store.apply(|state| {
            let changed = state.hdr_enabled != enabled;
            state.hdr_enabled = enabled;
            changed
        });
        true
    }

    /// Log and report a camera failure; the caller keeps going
    pub(in crate::app) fn camera_result<T>(
        &self,
        control: &'static str,
        result: Result<T, CameraError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(control, error = %err, "Camera parameter change failed");
                self.report_error(format!("Failed to set {}: {}", control, err));
                None
            }
        }
    }
}
