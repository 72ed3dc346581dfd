// SPDX-License-Identifier: GPL-3.0-only

//! Frame routing and detector subscriptions
//!
//! Every delivered frame pair passes through [`SessionOrchestrator::on_frame`],
//! which hands frames to the detectors the current mode needs and stores the
//! processed frame as the session's latest preview. Detector and processor
//! outputs come back as streams and are mirrored into state while their mode
//! is active.

use crate::app::histogram::Histogram;
use crate::app::{CameraMode, SessionOrchestrator};
use crate::backends::types::{CameraFrame, DocumentEvent, FaceEvent, FramePair, ProcessingProgress};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

impl SessionOrchestrator {
    // =========================================================================
    // Frame Dispatch
    // =========================================================================

    /// Route one frame pair. Never blocks on a detector.
    pub fn on_frame(&self, pair: FramePair) {
        if !self.accepts("frame") {
            return;
        }
        self.inner.frames_received.fetch_add(1, Ordering::Relaxed);
        let FramePair { raw, processed } = pair;
        let (mode, lens_facing, histogram_enabled) = self.inner.store.read(|state| {
            (state.mode, state.lens_facing, state.histogram_enabled)
        });

        // The raw frame is ours alone; detectors take ownership of it
        match mode {
            CameraMode::Portrait => {
                let rotation = raw.rotation;
                self.inner.backends.face_detector.process_frame(
                    raw,
                    rotation,
                    lens_facing.is_front(),
                );
            }
            CameraMode::Document => self.inner.backends.document_detector.process_frame(raw),
            _ => {}
        }

        if histogram_enabled {
            self.schedule_histogram(&processed);
        }

        self.inner.frames.store(processed);
    }

    /// Compute a histogram from a copy of `frame` unless one is already running
    fn schedule_histogram(&self, frame: &CameraFrame) {
        let slot = &self.inner.tasks.histogram;
        if slot.is_active() {
            return;
        }

        let copy = frame.copy();
        let stride = self.inner.config.histogram_stride;
        let this = self.clone();
        self.spawn_task(slot, move |_| async move {
            let computed =
                tokio::task::spawn_blocking(move || Histogram::compute(&copy, stride)).await;
            match computed {
                Ok(histogram) => {
                    let histogram = Arc::new(histogram);
                    this.inner.store.apply(|state| {
                        if !state.histogram_enabled {
                            return false;
                        }
                        state.histogram = Some(histogram);
                        true
                    });
                }
                Err(err) => warn!(error = %err, "Histogram task failed"),
            }
        });
    }

    // =========================================================================
    // Detector Subscriptions
    // =========================================================================

    pub(in crate::app) fn spawn_subscriptions(&self) {
        let backends = &self.inner.backends;
        let tasks = &self.inner.tasks;

        self.spawn_subscription(
            &tasks.face_events,
            backends.face_detector.events(),
            |this, event| this.handle_face_event(event),
        );
        self.spawn_subscription(
            &tasks.document_events,
            backends.document_detector.events(),
            |this, event| this.handle_document_event(event),
        );
        self.spawn_subscription(
            &tasks.night_progress,
            backends.night_processor.progress(),
            |this, progress| this.mirror_night_progress(progress),
        );
        self.spawn_subscription(
            &tasks.blur_progress,
            backends.portrait_blur.progress(),
            |this, progress| this.mirror_blur_progress(progress),
        );
        debug!("Detector subscriptions started");
    }

    fn handle_face_event(&self, event: FaceEvent) {
        match event {
            FaceEvent::Faces(faces) => {
                self.inner.store.apply(|state| {
                    if state.mode != CameraMode::Portrait || state.faces == faces {
                        return false;
                    }
                    state.faces = faces;
                    true
                });
            }
            FaceEvent::Tracking(tracking) => {
                let changed = self.inner.store.apply(|state| {
                    if state.mode != CameraMode::Portrait || state.face_tracking == tracking {
                        return false;
                    }
                    state.face_tracking = tracking;
                    true
                });
                if changed {
                    debug!(?tracking, "Face tracking state changed");
                }
            }
            FaceEvent::FocusPoint(point) => {
                if self.inner.store.read(|state| state.mode) == CameraMode::Portrait {
                    debug!(x = point.x, y = point.y, "Face tracking focus");
                    self.on_focus_point(point);
                }
            }
        }
    }

    fn handle_document_event(&self, event: DocumentEvent) {
        match event {
            DocumentEvent::Bounds(bounds) => {
                self.inner.store.apply(|state| {
                    if state.mode != CameraMode::Document || state.document_bounds == bounds {
                        return false;
                    }
                    state.document_bounds = bounds;
                    true
                });
            }
            DocumentEvent::AutoCapture => {
                if self.inner.store.read(|state| state.mode) == CameraMode::Document {
                    info!("Document stable, auto-capturing");
                    self.take_photo();
                }
            }
        }
    }

    fn mirror_night_progress(&self, progress: Option<ProcessingProgress>) {
        self.inner.store.apply(|state| {
            let allowed = progress.is_none() || state.mode == CameraMode::Night;
            if !allowed || state.night_progress == progress {
                return false;
            }
            state.night_progress = progress;
            true
        });
    }

    fn mirror_blur_progress(&self, progress: Option<ProcessingProgress>) {
        self.inner.store.apply(|state| {
            let allowed = progress.is_none() || state.mode == CameraMode::Portrait;
            if !allowed || state.blur_progress == progress {
                return false;
            }
            state.blur_progress = progress;
            true
        });
    }
}
