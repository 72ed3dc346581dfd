// SPDX-License-Identifier: GPL-3.0-only

//! Touch and face-tracking focus

use crate::app::SessionOrchestrator;
use crate::app::state::FocusRequest;
use crate::backends::types::NormalizedPoint;
use std::sync::atomic::Ordering;
use tokio::time::Instant;
use tracing::{debug, warn};

impl SessionOrchestrator {
    /// Focus at a normalized preview point.
    ///
    /// The indicator shows immediately; the camera request runs in the
    /// background and the indicator clears itself after the focus expiry
    /// unless a newer request supersedes it first.
    pub fn on_focus(&self, x: f32, y: f32) {
        if !self.accepts("focus") {
            return;
        }
        let point = NormalizedPoint::clamped(x, y);
        let expires_after = self.inner.config.focus_expiry();

        // Sequence is assigned under the store lock so state order matches it
        let mut sequence = 0;
        self.inner.store.update(|state| {
            sequence = self.inner.focus_sequence.fetch_add(1, Ordering::SeqCst) + 1;
            state.begin_focus(FocusRequest {
                point,
                sequence,
                issued_at: Instant::now(),
                expires_after,
            });
        });
        debug!(x = point.x, y = point.y, sequence, "Focus requested");

        let this = self.clone();
        self.spawn_task(&self.inner.tasks.focus_request, move |_| async move {
            match this.inner.backends.camera.set_focus_at_point(point).await {
                Ok(()) => debug!(sequence, "Focus settled"),
                Err(err) => warn!(error = %err, sequence, "Focus request failed"),
            }
            this.inner
                .store
                .apply(|state| state.focus_settled(sequence));
        });

        let this = self.clone();
        self.spawn_task(&self.inner.tasks.focus_expiry, move |_| async move {
            tokio::time::sleep(expires_after).await;
            if this.inner.store.apply(|state| state.expire_focus(sequence)) {
                debug!(sequence, "Focus indicator expired");
            }
        });
    }

    pub fn on_focus_point(&self, point: NormalizedPoint) {
        self.on_focus(point.x, point.y);
    }
}
