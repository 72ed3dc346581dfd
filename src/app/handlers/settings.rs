// SPDX-License-Identifier: GPL-3.0-only

//! Camera settings handlers
//!
//! Settings backed by the camera are only written to state once the camera
//! accepts them. Local settings (filter, timer, aspect ratio, ...) are
//! clamped and applied directly.

use crate::app::state::{FilterType, ProSettings};
use crate::app::{CameraMode, SessionEvent, SessionOrchestrator};
use crate::backends::types::FlashMode;
use crate::constants::adjustments;
use tracing::{debug, info};

impl SessionOrchestrator {
    // =========================================================================
    // Camera-backed settings
    // =========================================================================

    pub async fn set_flash(&self, mode: FlashMode) {
        if !self.accepts("flash") {
            return;
        }
        let result = self.inner.backends.camera.set_flash(mode).await;
        if self.camera_result("flash", result).is_some() {
            info!(?mode, "Flash mode changed");
            self.inner.store.update(|state| state.flash_mode = mode);
        }
    }

    /// Off -> On -> Auto -> Torch -> Off
    pub async fn cycle_flash(&self) {
        let next = self.inner.store.read(|state| state.flash_mode.next());
        self.set_flash(next).await;
    }

    pub async fn toggle_hdr(&self) {
        if !self.accepts("hdr") {
            return;
        }
        let enabled = !self.inner.store.read(|state| state.hdr_enabled);
        if self.apply_hdr(enabled).await {
            info!(enabled, "HDR toggled");
        }
    }

    /// Zoom factor, clamped to [1, device max]
    pub async fn set_zoom(&self, level: f32) {
        if !self.accepts("zoom") {
            return;
        }
        let max_zoom = self
            .inner
            .backends
            .camera
            .max_zoom()
            .max(adjustments::MIN_ZOOM);
        let level = if level.is_finite() {
            level.clamp(adjustments::MIN_ZOOM, max_zoom)
        } else {
            adjustments::MIN_ZOOM
        };

        let result = self.inner.backends.camera.set_zoom(level).await;
        if self.camera_result("zoom", result).is_some() {
            debug!(level, "Zoom changed");
            self.inner.store.update(|state| state.zoom_level = level);
        }
    }

    /// Exposure compensation step index, clamped to the device range
    pub async fn set_exposure_compensation(&self, index: i32) {
        if !self.accepts("exposure") {
            return;
        }
        if self.apply_exposure(index).await {
            debug!(index, "Exposure compensation changed");
        }
    }

    /// Flip between the front and back lens
    pub async fn switch_camera(&self) {
        if !self.accepts("switch camera") {
            return;
        }
        let target = self.inner.store.read(|state| state.lens_facing.toggled());
        let result = self.inner.backends.camera.set_lens_facing(target).await;
        if self.camera_result("lens facing", result).is_none() || !self.accepts("switch camera") {
            return;
        }

        info!(facing = ?target, "Camera switched");
        self.inner.frames.release();
        self.inner.store.update(|state| {
            state.lens_facing = target;
            state.clear_face_state();
            state.focus = None;
            state.is_focusing = false;
        });
        self.inner.tasks.focus_expiry.cancel();
        self.emit(SessionEvent::CameraSwitched);
    }

    /// Apply `f` to the pro controls; in Pro mode the exposure goes to the camera
    pub async fn update_pro_settings(&self, f: impl FnOnce(&mut ProSettings) + Send) {
        if !self.accepts("pro settings") {
            return;
        }
        let mut settings = self.inner.store.read(|state| state.pro);
        f(&mut settings);
        let settings = settings.clamped();

        let in_pro = self.inner.store.read(|state| state.mode) == CameraMode::Pro;
        self.inner.store.update(|state| state.pro = settings);
        debug!(?settings, "Pro settings updated");

        if in_pro {
            let index = self
                .inner
                .backends
                .camera
                .exposure_range()
                .index_for_normalized(settings.exposure);
            self.apply_exposure(index).await;
        }
    }

    // =========================================================================
    // Local settings
    // =========================================================================

    pub fn toggle_macro(&self) {
        self.inner
            .store
            .update(|state| state.macro_enabled = !state.macro_enabled);
    }

    pub fn cycle_aspect_ratio(&self) {
        self.inner
            .store
            .update(|state| state.aspect_ratio = state.aspect_ratio.next());
    }

    pub fn select_filter(&self, filter: FilterType) {
        debug!(?filter, "Filter selected");
        self.inner.store.update(|state| state.filter = filter);
    }

    /// Clamped to [0, 1]
    pub fn set_filter_intensity(&self, intensity: f32) {
        let intensity = if intensity.is_finite() {
            intensity.clamp(
                adjustments::MIN_FILTER_INTENSITY,
                adjustments::MAX_FILTER_INTENSITY,
            )
        } else {
            adjustments::DEFAULT_FILTER_INTENSITY
        };
        self.inner
            .store
            .update(|state| state.filter_intensity = intensity);
    }

    /// Clamped to 0..=5
    pub fn set_beauty_level(&self, level: u8) {
        let level = level.min(adjustments::MAX_BEAUTY_LEVEL);
        self.inner.store.update(|state| state.beauty_level = level);
    }

    /// Off -> 3 s -> 10 s -> Off
    pub fn cycle_photo_timer(&self) {
        self.inner
            .store
            .update(|state| state.photo_timer = state.photo_timer.next());
    }

    pub fn set_histogram_enabled(&self, enabled: bool) {
        if !enabled {
            self.inner.tasks.histogram.cancel();
        }
        self.inner.store.update(|state| {
            state.histogram_enabled = enabled;
            if !enabled {
                state.histogram = None;
            }
        });
    }
}
