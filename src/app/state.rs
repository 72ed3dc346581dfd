// SPDX-License-Identifier: GPL-3.0-only

//! Session state
//!
//! [`SessionState`] is the one value the UI observes. It is only ever changed
//! through the transition methods below, each applied atomically by the
//! session store, so observers never see half of a transition.

use crate::app::histogram::Histogram;
use crate::app::popup::PopupState;
use crate::backends::types::{
    AspectRatio, DetectedFace, DocumentBounds, FaceTrackingState, FlashMode, LensFacing,
    NormalizedPoint, ProcessingProgress,
};
use crate::constants::{adjustments, pro};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Camera operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Photo,
    Video,
    Portrait,
    Document,
    Pro,
    Night,
    Timelapse,
}

impl CameraMode {
    pub const ALL: [CameraMode; 7] = [
        CameraMode::Photo,
        CameraMode::Video,
        CameraMode::Portrait,
        CameraMode::Document,
        CameraMode::Pro,
        CameraMode::Night,
        CameraMode::Timelapse,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            CameraMode::Photo => "Photo",
            CameraMode::Video => "Video",
            CameraMode::Portrait => "Portrait",
            CameraMode::Document => "Document",
            CameraMode::Pro => "Pro",
            CameraMode::Night => "Night",
            CameraMode::Timelapse => "Timelapse",
        }
    }
}

impl FromStr for CameraMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CameraMode::ALL
            .into_iter()
            .find(|mode| mode.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode '{}'", s))
    }
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Preview/capture filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// No filter applied
    #[default]
    Original,
    /// Skin smoothing
    Beauty,
    /// Warm faded film look
    Nashville,
    /// Sepia tone filter (warm brownish tint)
    Sepia,
    /// Black & white
    Mono,
    /// Boosted saturation and contrast
    Vivid,
    /// Blue color temperature shift
    Cool,
    /// Orange/amber color temperature
    Warm,
}

/// Self-timer delay before a photo is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoTimerSetting {
    #[default]
    Off,
    Seconds3,
    Seconds10,
}

impl PhotoTimerSetting {
    /// Countdown length, `None` when the timer is off
    pub fn seconds(self) -> Option<u32> {
        match self {
            PhotoTimerSetting::Off => None,
            PhotoTimerSetting::Seconds3 => Some(3),
            PhotoTimerSetting::Seconds10 => Some(10),
        }
    }

    pub fn next(self) -> Self {
        match self {
            PhotoTimerSetting::Off => PhotoTimerSetting::Seconds3,
            PhotoTimerSetting::Seconds3 => PhotoTimerSetting::Seconds10,
            PhotoTimerSetting::Seconds10 => PhotoTimerSetting::Off,
        }
    }
}

/// Manual controls for Pro mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProSettings {
    /// Exposure compensation normalized to [-1, 1]
    pub exposure: f32,
    pub iso: u32,
    pub shutter_us: u32,
    pub white_balance_k: u32,
    /// Manual focus distance in [0, 1]; `None` keeps autofocus
    pub manual_focus: Option<f32>,
}

impl Default for ProSettings {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            iso: pro::DEFAULT_ISO,
            shutter_us: pro::DEFAULT_SHUTTER_US,
            white_balance_k: pro::DEFAULT_WHITE_BALANCE_K,
            manual_focus: None,
        }
    }
}

impl ProSettings {
    /// Every field pulled into its valid range
    pub fn clamped(self) -> Self {
        let unit = |v: f32, lo: f32, default: f32| {
            if v.is_finite() { v.clamp(lo, 1.0) } else { default }
        };
        Self {
            exposure: unit(self.exposure, -1.0, 0.0),
            iso: self.iso.clamp(pro::MIN_ISO, pro::MAX_ISO),
            shutter_us: self.shutter_us.clamp(pro::MIN_SHUTTER_US, pro::MAX_SHUTTER_US),
            white_balance_k: self
                .white_balance_k
                .clamp(pro::MIN_WHITE_BALANCE_K, pro::MAX_WHITE_BALANCE_K),
            manual_focus: self.manual_focus.map(|d| unit(d, 0.0, 0.0)),
        }
    }
}

/// A touch or face-tracking focus request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRequest {
    pub point: NormalizedPoint,
    /// Strictly increasing per session
    pub sequence: u64,
    pub issued_at: Instant,
    pub expires_after: Duration,
}

/// Timelapse lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelapseState {
    #[default]
    Idle,
    Recording,
    Paused,
    Encoding,
    Cancelled,
}

/// Observable part of the timelapse session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimelapseSnapshot {
    pub state: TimelapseState,
    pub frames_captured: u32,
    /// Time spent recording, pauses excluded
    pub elapsed: Duration,
    /// Encoder progress in [0, 1]
    pub encoding_progress: f32,
}

impl TimelapseSnapshot {
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            TimelapseState::Recording | TimelapseState::Paused | TimelapseState::Encoding
        )
    }
}

/// Video recording status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingSnapshot {
    #[default]
    Idle,
    /// Waiting for the camera to confirm the recording started
    Starting,
    Recording {
        elapsed_secs: u64,
    },
    /// Waiting for the camera to finalize the file
    Stopping,
}

impl RecordingSnapshot {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingSnapshot::Recording { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RecordingSnapshot::Idle)
    }
}

/// Summary of the last portrait blur pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurSummary {
    pub success: bool,
    pub has_person: bool,
    pub timing_ms: u64,
}

/// Everything the UI renders, as one value
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub mode: CameraMode,
    pub lens_facing: LensFacing,
    pub flash_mode: FlashMode,
    pub hdr_enabled: bool,
    pub macro_enabled: bool,
    pub aspect_ratio: AspectRatio,
    pub zoom_level: f32,
    /// Exposure compensation as a device step index
    pub exposure_compensation: i32,
    pub photo_timer: PhotoTimerSetting,
    pub is_capturing: bool,
    /// White shutter-flash overlay is up
    pub flash_active: bool,
    /// Remaining countdown seconds while the self-timer runs
    pub countdown: Option<u32>,
    pub focus: Option<FocusRequest>,
    pub is_focusing: bool,
    pub filter: FilterType,
    pub filter_intensity: f32,
    pub beauty_level: u8,
    pub pro: ProSettings,
    pub popups: PopupState,
    pub night_progress: Option<ProcessingProgress>,
    pub blur_progress: Option<ProcessingProgress>,
    pub last_blur: Option<BlurSummary>,
    pub timelapse: TimelapseSnapshot,
    pub recording: RecordingSnapshot,
    pub face_tracking: FaceTrackingState,
    pub faces: Vec<DetectedFace>,
    pub document_bounds: Option<DocumentBounds>,
    pub histogram_enabled: bool,
    pub histogram: Option<Arc<Histogram>>,
    /// Bumped whenever a new gallery thumbnail is available
    pub thumbnail_generation: u64,
    /// A mode transition is in flight; new captures and recordings wait
    pub switching_mode: bool,
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: CameraMode::default(),
            lens_facing: LensFacing::default(),
            flash_mode: FlashMode::default(),
            hdr_enabled: false,
            macro_enabled: false,
            aspect_ratio: AspectRatio::default(),
            zoom_level: adjustments::MIN_ZOOM,
            exposure_compensation: 0,
            photo_timer: PhotoTimerSetting::default(),
            is_capturing: false,
            flash_active: false,
            countdown: None,
            focus: None,
            is_focusing: false,
            filter: FilterType::default(),
            filter_intensity: adjustments::DEFAULT_FILTER_INTENSITY,
            beauty_level: adjustments::DEFAULT_BEAUTY_LEVEL,
            pro: ProSettings::default(),
            popups: PopupState::default(),
            night_progress: None,
            blur_progress: None,
            last_blur: None,
            timelapse: TimelapseSnapshot::default(),
            recording: RecordingSnapshot::default(),
            face_tracking: FaceTrackingState::default(),
            faces: Vec::new(),
            document_bounds: None,
            histogram_enabled: false,
            histogram: None,
            thumbnail_generation: 0,
            switching_mode: false,
            last_error: None,
        }
    }
}

impl SessionState {
    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    /// Night fusion is running
    pub fn is_night_processing(&self) -> bool {
        self.night_progress.is_some()
    }

    // =========================================================================
    // Capture transitions
    // =========================================================================

    /// Claim the capture pipeline.
    ///
    /// Pre: not capturing, no countdown, no mode switch. Post: capturing, shutter flash up,
    /// popups dismissed. Returns false (and changes nothing) otherwise.
    pub fn claim_capture(&mut self) -> bool {
        if self.is_capturing || self.is_counting_down() || self.switching_mode {
            return false;
        }
        self.popups.hide();
        self.is_capturing = true;
        self.flash_active = true;
        true
    }

    /// Post: not capturing. Always succeeds.
    pub fn finish_capture(&mut self) -> bool {
        let changed = self.is_capturing;
        self.is_capturing = false;
        changed
    }

    pub fn clear_flash(&mut self) -> bool {
        std::mem::replace(&mut self.flash_active, false)
    }

    /// Start a self-timer countdown from idle.
    ///
    /// Pre: not capturing, no countdown. Post: countdown shows `seconds`.
    pub fn begin_countdown(&mut self, seconds: u32) -> bool {
        if self.is_capturing || self.is_counting_down() || self.switching_mode {
            return false;
        }
        self.countdown = Some(seconds);
        true
    }

    /// Start a countdown, replacing one that may already run.
    ///
    /// Pre: not capturing. Post: countdown shows `seconds`.
    pub fn restart_countdown(&mut self, seconds: u32) -> bool {
        if self.is_capturing || self.switching_mode {
            return false;
        }
        self.countdown = Some(seconds);
        true
    }

    /// Only applies while a countdown is shown
    pub fn tick_countdown(&mut self, remaining: u32) -> bool {
        match self.countdown {
            Some(current) if current != remaining => {
                self.countdown = Some(remaining);
                true
            }
            _ => false,
        }
    }

    /// Remove the countdown; returns whether one was running
    pub fn end_countdown(&mut self) -> bool {
        self.countdown.take().is_some()
    }

    /// Countdown reached zero: drop it and claim the capture in one step.
    ///
    /// Pre: countdown shown. Post: as [`SessionState::claim_capture`].
    pub fn finish_countdown(&mut self) -> bool {
        if self.countdown.take().is_none() {
            return false;
        }
        self.claim_capture()
    }

    /// Enter a mode transition: the countdown and popups go away and
    /// nothing new may start until [`SessionState::end_mode_switch`].
    pub fn begin_mode_switch(&mut self) {
        self.switching_mode = true;
        self.countdown = None;
        self.popups.hide();
    }

    pub fn end_mode_switch(&mut self) -> bool {
        std::mem::replace(&mut self.switching_mode, false)
    }

    // =========================================================================
    // Focus transitions
    // =========================================================================

    /// Post: indicator at the request's point, focusing, popups dismissed
    pub fn begin_focus(&mut self, request: FocusRequest) {
        self.popups.hide();
        self.focus = Some(request);
        self.is_focusing = true;
    }

    /// The camera finished (or failed) focusing for `sequence`
    pub fn focus_settled(&mut self, sequence: u64) -> bool {
        let current = self.focus.map(|f| f.sequence);
        if current == Some(sequence) && self.is_focusing {
            self.is_focusing = false;
            return true;
        }
        false
    }

    /// Clear the indicator if `sequence` is still the live request
    pub fn expire_focus(&mut self, sequence: u64) -> bool {
        if self.focus.map(|f| f.sequence) != Some(sequence) {
            return false;
        }
        self.focus = None;
        self.is_focusing = false;
        true
    }

    // =========================================================================
    // Mode-derived state
    // =========================================================================

    pub fn clear_face_state(&mut self) {
        self.faces.clear();
        self.face_tracking = FaceTrackingState::Idle;
    }

    /// Drop everything derived while `mode` was active
    pub fn clear_mode_state(&mut self, mode: CameraMode) {
        match mode {
            CameraMode::Portrait => {
                self.clear_face_state();
                self.blur_progress = None;
                self.last_blur = None;
            }
            CameraMode::Document => {
                self.document_bounds = None;
            }
            CameraMode::Night => {
                self.night_progress = None;
            }
            CameraMode::Photo
            | CameraMode::Video
            | CameraMode::Pro
            | CameraMode::Timelapse => {}
        }
    }

    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }
}
