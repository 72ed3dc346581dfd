// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types exchanged with the camera collaborators
//!
//! Frames, normalized geometry, detector outputs and the capture request.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pixel layout of frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit R, G, B, A
    #[default]
    Rgba,
    /// 8-bit B, G, R, A (common on Android-style preview surfaces)
    Bgra,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Byte offsets of the red, green and blue channels within a pixel
    pub fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Rgba => (0, 1, 2),
            PixelFormat::Bgra => (2, 1, 0),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Forwarded to the face detector so it can orient its model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

impl LensFacing {
    pub fn is_front(self) -> bool {
        self == LensFacing::Front
    }

    /// The other lens
    pub fn toggled(self) -> Self {
        match self {
            LensFacing::Back => LensFacing::Front,
            LensFacing::Front => LensFacing::Back,
        }
    }
}

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash LED is off
    #[default]
    Off,
    /// Flash fires during photo capture
    On,
    /// Device decides based on scene brightness
    Auto,
    /// Torch / flashlight mode (LED stays on continuously)
    Torch,
}

impl FlashMode {
    /// Cycle to the next mode: Off -> On -> Auto -> Torch -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Torch,
            FlashMode::Torch => FlashMode::Off,
        }
    }
}

/// Photo aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Ratio4x3,
    Ratio16x9,
    Square,
    /// Full sensor, no crop
    Full,
}

impl AspectRatio {
    pub fn next(self) -> Self {
        match self {
            AspectRatio::Ratio4x3 => AspectRatio::Ratio16x9,
            AspectRatio::Ratio16x9 => AspectRatio::Square,
            AspectRatio::Square => AspectRatio::Full,
            AspectRatio::Full => AspectRatio::Ratio4x3,
        }
    }
}

/// Exposure compensation range reported by the device, in step indices
///
/// `step_ev` is the exposure value covered by one index step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureRange {
    pub min: i32,
    pub max: i32,
    pub step_ev: f32,
}

impl Default for ExposureRange {
    fn default() -> Self {
        Self {
            min: -12,
            max: 12,
            step_ev: 1.0 / 6.0,
        }
    }
}

impl ExposureRange {
    pub fn new(min: i32, max: i32, step_ev: f32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            step_ev,
        }
    }

    /// Clamp a step index into the device range
    pub fn clamp(&self, index: i32) -> i32 {
        index.clamp(self.min, self.max)
    }

    /// Neutral exposure (0 when the range contains it)
    pub fn neutral(&self) -> i32 {
        self.clamp(0)
    }

    /// Step index for a fraction of the positive range, truncated toward zero
    pub fn positive_fraction(&self, ratio: f32) -> i32 {
        let ratio = ratio.clamp(0.0, 1.0);
        self.clamp((self.max.max(0) as f32 * ratio) as i32)
    }

    /// Map a normalized compensation in [-1, 1] to a step index.
    ///
    /// Linear scale against the positive or negative half of the range,
    /// truncated toward zero. Devices with non-uniform step tables may not
    /// land on the exact EV the user picked.
    pub fn index_for_normalized(&self, value: f32) -> i32 {
        let value = if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let half = if value >= 0.0 {
            self.max.max(0)
        } else {
            -(self.min.min(0))
        };
        self.clamp((value * half as f32) as i32)
    }

    /// Exposure value in EV for a step index
    pub fn ev_for_index(&self, index: i32) -> f32 {
        self.clamp(index) as f32 * self.step_ev
    }
}

/// A point in normalized preview coordinates ([0, 1] on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// Build a point, clamping each axis into [0, 1]
    pub fn clamped(x: f32, y: f32) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            x: axis(x),
            y: axis(y),
        }
    }
}

/// Axis-aligned rectangle in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn center(&self) -> NormalizedPoint {
        NormalizedPoint::clamped(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A face reported by the face detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    pub bounds: NormalizedRect,
    /// Stable id while the detector keeps tracking the same face
    pub tracking_id: Option<u32>,
    pub confidence: f32,
}

/// Lifecycle of the face the detector is following
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceTrackingState {
    #[default]
    Idle,
    Tracking,
    Lost,
}

/// Document quadrilateral, corners clockwise from top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentBounds {
    pub corners: [NormalizedPoint; 4],
    pub confidence: f32,
}

/// Stage/progress pair published by long-running processors
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingProgress {
    pub stage: String,
    /// Fraction complete in [0, 1]
    pub progress: f32,
}

impl ProcessingProgress {
    pub fn new(stage: impl Into<String>, progress: f32) -> Self {
        Self {
            stage: stage.into(),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

/// Output of the face detector stream
#[derive(Debug, Clone, PartialEq)]
pub enum FaceEvent {
    /// Latest face list (empty when nothing is detected)
    Faces(Vec<DetectedFace>),
    /// Tracking lifecycle change
    Tracking(FaceTrackingState),
    /// A face has been stable long enough to focus on it
    FocusPoint(NormalizedPoint),
}

/// Output of the document detector stream
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// Latest bounds, `None` when the document left the frame
    Bounds(Option<DocumentBounds>),
    /// Bounds have been stable long enough to capture automatically
    AutoCapture,
}

/// Portrait blur settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurConfig {
    /// Background blur strength in [0, 1]
    pub strength: f32,
    pub lens_facing: LensFacing,
}

/// Result of one portrait blur pass
#[derive(Debug)]
pub struct BlurOutcome {
    pub frame: CameraFrame,
    pub success: bool,
    pub has_person: bool,
    pub timing_ms: u64,
}

/// Everything the camera layer needs to take a still
#[derive(Debug)]
pub struct CaptureRequest {
    pub mode: crate::app::CameraMode,
    pub lens_facing: LensFacing,
    pub flash: FlashMode,
    pub hdr: bool,
    pub macro_focus: bool,
    pub aspect_ratio: AspectRatio,
    pub zoom: f32,
    pub filter: crate::app::FilterType,
    pub filter_intensity: f32,
    pub beauty_level: u8,
    pub mirror: bool,
    /// Pre-processed frame (portrait blur result) to encode instead of a fresh still
    pub processed_frame: Option<CameraFrame>,
}

/// A single video frame
///
/// Not `Clone`: a second buffer can only be obtained with [`CameraFrame::copy`],
/// which always allocates. Frames handed to other tasks are either moved or
/// copied, never shared.
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    pub format: PixelFormat,
    /// Monotonic frame counter assigned by the source
    pub sequence: u64,
    pub rotation: SensorRotation,
    /// When the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
    data: Box<[u8]>,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, stride: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride,
            format,
            sequence: 0,
            rotation: SensorRotation::None,
            captured_at: Instant::now(),
            data: data.into_boxed_slice(),
        }
    }

    /// Tightly packed frame filled with one RGBA color
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self::new(width, height, width * 4, PixelFormat::Rgba, data)
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_rotation(mut self, rotation: SensorRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Deep copy into a freshly allocated buffer
    pub fn copy(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
            sequence: self.sequence,
            rotation: self.rotation,
            captured_at: self.captured_at,
            data: self.data.clone(),
        }
    }

    /// Pixel rows without stride padding, converted to RGBA order
    pub fn packed_rgba(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;
        let row_bytes = width * self.format.bytes_per_pixel();

        let mut result = Vec::with_capacity(row_bytes * height);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + row_bytes;
            if row_end > self.data.len() {
                break;
            }
            let row = &self.data[row_start..row_end];
            match self.format {
                PixelFormat::Rgba => result.extend_from_slice(row),
                PixelFormat::Bgra => {
                    for px in row.chunks_exact(4) {
                        result.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            }
        }
        result
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// One delivery from the frame source
#[derive(Debug)]
pub struct FramePair {
    /// Sensor frame as delivered by the camera
    pub raw: CameraFrame,
    /// Filtered preview frame, what the user sees
    pub processed: CameraFrame,
}

impl FramePair {
    pub fn new(raw: CameraFrame, processed: CameraFrame) -> Self {
        Self { raw, processed }
    }

    /// Pair where no filter is applied (processed is a copy of raw)
    pub fn unfiltered(frame: CameraFrame) -> Self {
        let processed = frame.copy();
        Self {
            raw: frame,
            processed,
        }
    }
}
