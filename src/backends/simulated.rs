// SPDX-License-Identifier: GPL-3.0-only

//! Simulated collaborators
//!
//! In-process stand-ins for the camera, detectors, blur engine and encoder.
//! They record what the orchestrator asked of them, can be told to fail, and
//! let callers inject detector output. The demo binary and the test suite
//! both drive sessions through these.

use super::types::{
    BlurConfig, BlurOutcome, CameraFrame, CaptureRequest, DocumentEvent, ExposureRange, FaceEvent,
    FlashMode, FramePair, LensFacing, NormalizedPoint, PixelFormat, ProcessingProgress,
    SensorRotation,
};
use super::{
    Backends, CameraControls, DocumentDetector, FaceDetector, FrameStream, MediaEncoder,
    NightProcessor, PortraitBlurEngine, ProgressStream,
};
use crate::app::CameraMode;
use crate::errors::{BlurError, CameraError, EncodeError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn media_directory(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir).join("camera-session")
}

fn timestamped_name(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, timestamp, &suffix[..8], extension)
}

/// Camera operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraOperation {
    Exposure,
    Hdr,
    Flash,
    Zoom,
    Focus,
    NightMode,
    LensFacing,
    Capture,
    StartRecording,
    StopRecording,
}

impl CameraOperation {
    fn control_name(self) -> &'static str {
        match self {
            CameraOperation::Exposure => "exposure",
            CameraOperation::Hdr => "hdr",
            CameraOperation::Flash => "flash",
            CameraOperation::Zoom => "zoom",
            CameraOperation::Focus => "focus",
            CameraOperation::NightMode => "night mode",
            CameraOperation::LensFacing => "lens facing",
            CameraOperation::Capture => "capture",
            CameraOperation::StartRecording => "start recording",
            CameraOperation::StopRecording => "stop recording",
        }
    }
}

/// A call the orchestrator made on the simulated camera
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    Exposure(i32),
    Hdr(bool),
    Flash(FlashMode),
    Zoom(f32),
    Focus(NormalizedPoint),
    NightMode(bool),
    LensFacing(LensFacing),
    Capture {
        mode: CameraMode,
        flash: FlashMode,
        with_processed_frame: bool,
    },
    StartRecording,
    StopRecording,
}

/// Scripted camera parameter layer
pub struct SimulatedCamera {
    exposure_range: ExposureRange,
    max_zoom: f32,
    capture_delay: Duration,
    focus_delay: Duration,
    /// Latency of parameter and recording calls
    control_delay: Duration,
    photo_dir: PathBuf,
    video_dir: PathBuf,
    calls: Mutex<Vec<CameraCall>>,
    failing: Mutex<HashSet<CameraOperation>>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            exposure_range: ExposureRange::default(),
            max_zoom: 8.0,
            capture_delay: Duration::from_millis(50),
            focus_delay: Duration::from_millis(30),
            control_delay: Duration::ZERO,
            photo_dir: media_directory(dirs::picture_dir()),
            video_dir: media_directory(dirs::video_dir()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_exposure_range(mut self, range: ExposureRange) -> Self {
        self.exposure_range = range;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: f32) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    pub fn with_focus_delay(mut self, delay: Duration) -> Self {
        self.focus_delay = delay;
        self
    }

    pub fn with_control_delay(mut self, delay: Duration) -> Self {
        self.control_delay = delay;
        self
    }

    /// Make every subsequent call of `operation` fail
    pub fn fail(&self, operation: CameraOperation) {
        lock(&self.failing).insert(operation);
    }

    /// Let `operation` succeed again
    pub fn recover(&self, operation: CameraOperation) {
        lock(&self.failing).remove(&operation);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<CameraCall> {
        lock(&self.calls).clone()
    }

    pub fn capture_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, CameraCall::Capture { .. }))
            .count()
    }

    async fn control(&self, call: CameraCall, operation: CameraOperation) -> Result<(), CameraError> {
        if !self.control_delay.is_zero() {
            tokio::time::sleep(self.control_delay).await;
        }
        self.record(call, operation)
    }

    fn record(&self, call: CameraCall, operation: CameraOperation) -> Result<(), CameraError> {
        debug!(?call, "Simulated camera call");
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&operation) {
            return Err(match operation {
                CameraOperation::Capture => {
                    CameraError::CaptureFailed("simulated sensor timeout".to_string())
                }
                CameraOperation::StartRecording | CameraOperation::StopRecording => {
                    CameraError::RecordingFailed("simulated muxer failure".to_string())
                }
                other => CameraError::ParameterRejected {
                    control: other.control_name(),
                    reason: "simulated failure".to_string(),
                },
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CameraControls for SimulatedCamera {
    fn exposure_range(&self) -> ExposureRange {
        self.exposure_range
    }

    fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    async fn set_exposure(&self, index: i32) -> Result<(), CameraError> {
        self.control(CameraCall::Exposure(index), CameraOperation::Exposure).await
    }

    async fn set_hdr(&self, enabled: bool) -> Result<(), CameraError> {
        self.control(CameraCall::Hdr(enabled), CameraOperation::Hdr).await
    }

    async fn set_flash(&self, mode: FlashMode) -> Result<(), CameraError> {
        self.control(CameraCall::Flash(mode), CameraOperation::Flash).await
    }

    async fn set_zoom(&self, level: f32) -> Result<(), CameraError> {
        self.control(CameraCall::Zoom(level), CameraOperation::Zoom).await
    }

    async fn set_focus_at_point(&self, point: NormalizedPoint) -> Result<(), CameraError> {
        tokio::time::sleep(self.focus_delay).await;
        self.record(CameraCall::Focus(point), CameraOperation::Focus)
    }

    async fn set_night_mode(&self, enabled: bool) -> Result<(), CameraError> {
        self.control(CameraCall::NightMode(enabled), CameraOperation::NightMode).await
    }

    async fn set_lens_facing(&self, facing: LensFacing) -> Result<(), CameraError> {
        self.control(CameraCall::LensFacing(facing), CameraOperation::LensFacing).await
    }

    async fn capture_photo(&self, request: CaptureRequest) -> Result<String, CameraError> {
        tokio::time::sleep(self.capture_delay).await;
        self.record(
            CameraCall::Capture {
                mode: request.mode,
                flash: request.flash,
                with_processed_frame: request.processed_frame.is_some(),
            },
            CameraOperation::Capture,
        )?;
        // Nothing is written; the URI only names where a real pipeline would store it
        let uri = self.photo_dir.join(timestamped_name("IMG", "jpg"));
        Ok(format!("file://{}", uri.display()))
    }

    async fn start_recording(&self) -> Result<(), CameraError> {
        self.control(CameraCall::StartRecording, CameraOperation::StartRecording).await
    }

    async fn stop_recording(&self) -> Result<String, CameraError> {
        self.control(CameraCall::StopRecording, CameraOperation::StopRecording).await?;
        Ok(self
            .video_dir
            .join(timestamped_name("VID", "mp4"))
            .display()
            .to_string())
    }
}

fn broadcast_stream<T: Clone + Send + 'static>(
    mut rx: broadcast::Receiver<T>,
) -> BoxStream<'static, T> {
    Box::pin(async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Detector event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn watch_stream(mut rx: watch::Receiver<Option<ProcessingProgress>>) -> ProgressStream {
    Box::pin(async_stream::stream! {
        loop {
            let current = rx.borrow_and_update().clone();
            yield current;
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Face detector whose output is injected with [`SimulatedFaceDetector::emit`]
pub struct SimulatedFaceDetector {
    enabled: AtomicBool,
    tracking_focus: AtomicBool,
    last_front_facing: AtomicBool,
    frames_processed: AtomicUsize,
    events: broadcast::Sender<FaceEvent>,
}

impl Default for SimulatedFaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedFaceDetector {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            enabled: AtomicBool::new(false),
            tracking_focus: AtomicBool::new(false),
            last_front_facing: AtomicBool::new(false),
            frames_processed: AtomicUsize::new(0),
            events,
        }
    }

    /// Publish a detector event; returns false when nobody is subscribed
    pub fn emit(&self, event: FaceEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_tracking_focus(&self) -> bool {
        self.tracking_focus.load(Ordering::SeqCst)
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::SeqCst)
    }

    pub fn last_front_facing(&self) -> bool {
        self.last_front_facing.load(Ordering::SeqCst)
    }
}

impl FaceDetector for SimulatedFaceDetector {
    fn process_frame(&self, frame: CameraFrame, rotation: SensorRotation, is_front_facing: bool) {
        if !self.is_enabled() {
            return;
        }
        self.frames_processed.fetch_add(1, Ordering::SeqCst);
        self.last_front_facing
            .store(is_front_facing, Ordering::SeqCst);
        debug!(
            sequence = frame.sequence,
            rotation = rotation.degrees(),
            "Simulated face detection"
        );
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn enable_tracking_focus(&self) {
        self.tracking_focus.store(true, Ordering::SeqCst);
    }

    fn disable_tracking_focus(&self) {
        self.tracking_focus.store(false, Ordering::SeqCst);
    }

    fn events(&self) -> BoxStream<'static, FaceEvent> {
        broadcast_stream(self.events.subscribe())
    }
}

/// Document detector whose output is injected with [`SimulatedDocumentDetector::emit`]
pub struct SimulatedDocumentDetector {
    enabled: AtomicBool,
    frames_processed: AtomicUsize,
    events: broadcast::Sender<DocumentEvent>,
}

impl Default for SimulatedDocumentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDocumentDetector {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            enabled: AtomicBool::new(false),
            frames_processed: AtomicUsize::new(0),
            events,
        }
    }

    pub fn emit(&self, event: DocumentEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::SeqCst)
    }
}

impl DocumentDetector for SimulatedDocumentDetector {
    fn process_frame(&self, _frame: CameraFrame) {
        if self.is_enabled() {
            self.frames_processed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn events(&self) -> BoxStream<'static, DocumentEvent> {
        broadcast_stream(self.events.subscribe())
    }
}

/// Blur engine that walks through its stages and returns the input frame
pub struct SimulatedBlurEngine {
    stage_delay: Duration,
    has_person: AtomicBool,
    failing: AtomicBool,
    processed: AtomicUsize,
    progress: watch::Sender<Option<ProcessingProgress>>,
}

impl Default for SimulatedBlurEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBlurEngine {
    const STAGES: [&'static str; 3] = ["segmenting", "blurring", "compositing"];

    pub fn new() -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            stage_delay: Duration::from_millis(20),
            has_person: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            processed: AtomicUsize::new(0),
            progress,
        }
    }

    pub fn set_has_person(&self, has_person: bool) {
        self.has_person.store(has_person, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PortraitBlurEngine for SimulatedBlurEngine {
    async fn process(
        &self,
        frame: CameraFrame,
        config: BlurConfig,
    ) -> Result<BlurOutcome, BlurError> {
        let started = tokio::time::Instant::now();
        for (index, stage) in Self::STAGES.iter().enumerate() {
            let progress = index as f32 / Self::STAGES.len() as f32;
            self.progress
                .send_replace(Some(ProcessingProgress::new(*stage, progress)));
            tokio::time::sleep(self.stage_delay).await;
        }
        self.progress.send_replace(None);

        if self.failing.load(Ordering::SeqCst) {
            return Err(BlurError::Failed("simulated segmentation failure".to_string()));
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
        debug!(strength = config.strength, "Simulated portrait blur complete");
        Ok(BlurOutcome {
            frame,
            success: true,
            has_person: self.has_person.load(Ordering::SeqCst),
            timing_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn progress(&self) -> ProgressStream {
        watch_stream(self.progress.subscribe())
    }
}

/// Night fusion progress source driven with [`SimulatedNightProcessor::publish`]
pub struct SimulatedNightProcessor {
    progress: watch::Sender<Option<ProcessingProgress>>,
}

impl Default for SimulatedNightProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedNightProcessor {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(None);
        Self { progress }
    }

    pub fn publish(&self, progress: Option<ProcessingProgress>) {
        self.progress.send_replace(progress);
    }
}

impl NightProcessor for SimulatedNightProcessor {
    fn progress(&self) -> ProgressStream {
        watch_stream(self.progress.subscribe())
    }
}

/// Encoder that reports progress in steps and returns a configured result
pub struct SimulatedEncoder {
    steps: u32,
    step_delay: Duration,
    outcome: Mutex<Result<Option<String>, EncodeError>>,
    encoded: Mutex<Vec<(usize, u32)>>,
}

impl Default for SimulatedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEncoder {
    pub fn new() -> Self {
        Self {
            steps: 4,
            step_delay: Duration::from_millis(25),
            outcome: Mutex::new(Ok(None)),
            encoded: Mutex::new(Vec::new()),
        }
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Always return `path` on success
    pub fn succeed_with(&self, path: impl Into<String>) {
        *lock(&self.outcome) = Ok(Some(path.into()));
    }

    /// Fail every subsequent encode
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.outcome) = Err(EncodeError::Failed(message.into()));
    }

    /// (frame count, output fps) of every encode call
    pub fn encoded(&self) -> Vec<(usize, u32)> {
        lock(&self.encoded).clone()
    }
}

#[async_trait]
impl MediaEncoder for SimulatedEncoder {
    async fn encode(
        &self,
        frames: Vec<CameraFrame>,
        output_fps: u32,
        progress: watch::Sender<f32>,
    ) -> Result<String, EncodeError> {
        lock(&self.encoded).push((frames.len(), output_fps));
        if frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }

        for step in 1..=self.steps {
            tokio::time::sleep(self.step_delay).await;
            progress.send_replace(step as f32 / self.steps as f32);
        }

        let outcome = lock(&self.outcome).clone();
        match outcome {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Ok(media_directory(dirs::video_dir())
                .join(timestamped_name("TL", "mp4"))
                .display()
                .to_string()),
            Err(err) => Err(err),
        }
    }
}

/// Every simulated collaborator, kept typed so callers can script them
#[derive(Clone)]
pub struct SimulatedRig {
    pub camera: Arc<SimulatedCamera>,
    pub face_detector: Arc<SimulatedFaceDetector>,
    pub document_detector: Arc<SimulatedDocumentDetector>,
    pub portrait_blur: Arc<SimulatedBlurEngine>,
    pub night_processor: Arc<SimulatedNightProcessor>,
    pub encoder: Arc<SimulatedEncoder>,
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRig {
    pub fn new() -> Self {
        Self::with_camera(SimulatedCamera::new())
    }

    pub fn with_camera(camera: SimulatedCamera) -> Self {
        Self {
            camera: Arc::new(camera),
            face_detector: Arc::new(SimulatedFaceDetector::new()),
            document_detector: Arc::new(SimulatedDocumentDetector::new()),
            portrait_blur: Arc::new(SimulatedBlurEngine::new()),
            night_processor: Arc::new(SimulatedNightProcessor::new()),
            encoder: Arc::new(SimulatedEncoder::new()),
        }
    }

    /// Type-erased view for the orchestrator
    pub fn backends(&self) -> Backends {
        Backends {
            camera: self.camera.clone(),
            face_detector: self.face_detector.clone(),
            document_detector: self.document_detector.clone(),
            portrait_blur: self.portrait_blur.clone(),
            night_processor: self.night_processor.clone(),
            encoder: self.encoder.clone(),
        }
    }
}

/// Synthetic gradient frame whose brightness drifts with `sequence`
pub fn synthetic_frame(width: u32, height: u32, sequence: u64) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let shift = (sequence % 256) as u32;
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255 / width.max(1)) + shift) % 256;
            let g = ((y * 255 / height.max(1)) + shift) % 256;
            let b = (shift * 3) % 256;
            data.extend_from_slice(&[r as u8, g as u8, b as u8, 255]);
        }
    }
    CameraFrame::new(width, height, width * 4, PixelFormat::Rgba, data).with_sequence(sequence)
}

/// Frame source producing synthetic pairs at `fps`, forever or `limit` times
pub fn synthetic_frames(width: u32, height: u32, fps: u32, limit: Option<u64>) -> FrameStream {
    let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    info!(width, height, fps, "Starting synthetic frame source");
    Box::pin(async_stream::stream! {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sequence = 0u64;
        loop {
            if limit.is_some_and(|limit| sequence >= limit) {
                break;
            }
            ticker.tick().await;
            yield FramePair::unfiltered(synthetic_frame(width, height, sequence));
            sequence += 1;
        }
    })
}
