// SPDX-License-Identifier: GPL-3.0-only

//! Latest preview frame holder
//!
//! The session keeps exactly one preview frame alive. Storing a new frame
//! frees the previous one first, and every consumer (histogram, capture,
//! timelapse) gets its own copy so no buffer is ever shared between tasks.

use crate::backends::types::CameraFrame;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Slot {
    frame: Option<CameraFrame>,
    closed: bool,
}

#[derive(Default)]
pub struct FrameGuard {
    latest: Mutex<Slot>,
}

impl FrameGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the held frame, dropping the old buffer before keeping the new one.
    /// Ignored once closed.
    pub fn store(&self, frame: CameraFrame) {
        let mut latest = self.lock();
        if latest.closed {
            return;
        }
        drop(latest.frame.take());
        latest.frame = Some(frame);
    }

    /// Independent copy of the latest frame
    pub fn copy_latest(&self) -> Option<CameraFrame> {
        self.lock().frame.as_ref().map(CameraFrame::copy)
    }

    /// Drop the held frame
    pub fn release(&self) -> bool {
        self.lock().frame.take().is_some()
    }

    /// Drop the held frame and refuse every later one
    pub fn close(&self) -> bool {
        let mut latest = self.lock();
        latest.closed = true;
        latest.frame.take().is_some()
    }
}
