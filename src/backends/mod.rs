// SPDX-License-Identifier: GPL-3.0-only

//! Collaborator interfaces consumed by the session orchestrator
//!
//! The orchestrator never touches hardware, models or encoders directly. It
//! talks to narrow traits:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                SessionOrchestrator                   │
//! └──┬──────────┬──────────┬──────────┬──────────┬──────┘
//!    │          │          │          │          │
//! ┌──┴───┐  ┌───┴────┐ ┌───┴────┐ ┌───┴────┐ ┌───┴─────┐
//! │Camera│  │  Face  │ │Document│ │Portrait│ │  Media  │
//! │ctrls │  │detector│ │detector│ │  blur  │ │ encoder │
//! └──────┘  └────────┘ └────────┘ └────────┘ └─────────┘
//! ```
//!
//! Detectors and processors publish their results as streams; the
//! orchestrator subscribes once at startup.
//!
//! - [`types`]: frames and the values exchanged with collaborators
//! - [`simulated`]: in-process implementations for demos and tests

pub mod simulated;
pub mod types;

use crate::errors::{BlurError, CameraError, EncodeError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::watch;
use types::{
    BlurConfig, BlurOutcome, CameraFrame, CaptureRequest, DocumentEvent, ExposureRange, FaceEvent,
    FlashMode, FramePair, LensFacing, NormalizedPoint, ProcessingProgress, SensorRotation,
};

/// Stream of frame pairs from the camera pipeline
pub type FrameStream = BoxStream<'static, FramePair>;

/// Stream of (stage, progress) updates; `None` means idle
pub type ProgressStream = BoxStream<'static, Option<ProcessingProgress>>;

/// Camera parameter layer and still/video capture
#[async_trait]
pub trait CameraControls: Send + Sync {
    /// Exposure compensation range of the active lens
    fn exposure_range(&self) -> ExposureRange;

    /// Largest zoom factor of the active lens
    fn max_zoom(&self) -> f32;

    async fn set_exposure(&self, index: i32) -> Result<(), CameraError>;

    async fn set_hdr(&self, enabled: bool) -> Result<(), CameraError>;

    async fn set_flash(&self, mode: FlashMode) -> Result<(), CameraError>;

    async fn set_zoom(&self, level: f32) -> Result<(), CameraError>;

    async fn set_focus_at_point(&self, point: NormalizedPoint) -> Result<(), CameraError>;

    async fn set_night_mode(&self, enabled: bool) -> Result<(), CameraError>;

    async fn set_lens_facing(&self, facing: LensFacing) -> Result<(), CameraError>;

    /// Take a still; returns the URI of the stored photo
    async fn capture_photo(&self, request: CaptureRequest) -> Result<String, CameraError>;

    async fn start_recording(&self) -> Result<(), CameraError>;

    /// Finalize the recording; returns the path of the stored video
    async fn stop_recording(&self) -> Result<String, CameraError>;
}

/// Face detection and tracking
///
/// `process_frame` must return immediately; implementations queue or drop
/// frames as their own load dictates.
pub trait FaceDetector: Send + Sync {
    fn process_frame(&self, frame: CameraFrame, rotation: SensorRotation, is_front_facing: bool);

    fn enable(&self);

    fn disable(&self);

    /// Start publishing [`FaceEvent::FocusPoint`] for stable tracked faces
    fn enable_tracking_focus(&self);

    fn disable_tracking_focus(&self);

    /// Face lists, tracking changes and focus points
    fn events(&self) -> BoxStream<'static, FaceEvent>;
}

/// Document boundary detection
pub trait DocumentDetector: Send + Sync {
    fn process_frame(&self, frame: CameraFrame);

    fn enable(&self);

    fn disable(&self);

    /// Bounds updates and auto-capture triggers
    fn events(&self) -> BoxStream<'static, DocumentEvent>;
}

/// Portrait background blur
#[async_trait]
pub trait PortraitBlurEngine: Send + Sync {
    async fn process(
        &self,
        frame: CameraFrame,
        config: BlurConfig,
    ) -> Result<BlurOutcome, BlurError>;

    fn progress(&self) -> ProgressStream;
}

/// Multi-frame night fusion running in the camera pipeline
pub trait NightProcessor: Send + Sync {
    fn progress(&self) -> ProgressStream;
}

/// Timelapse video encoder
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Encode `frames` at `output_fps`, publishing progress in [0, 1].
    /// Returns the path of the written video.
    async fn encode(
        &self,
        frames: Vec<CameraFrame>,
        output_fps: u32,
        progress: watch::Sender<f32>,
    ) -> Result<String, EncodeError>;
}

/// The full set of collaborators a session needs
#[derive(Clone)]
pub struct Backends {
    pub camera: Arc<dyn CameraControls>,
    pub face_detector: Arc<dyn FaceDetector>,
    pub document_detector: Arc<dyn DocumentDetector>,
    pub portrait_blur: Arc<dyn PortraitBlurEngine>,
    pub night_processor: Arc<dyn NightProcessor>,
    pub encoder: Arc<dyn MediaEncoder>,
}
