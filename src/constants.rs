// SPDX-License-Identifier: GPL-3.0-only

//! Session-wide constants
//!
//! Timing defaults, validation bounds and the mode presets shared by the
//! orchestrator, the configuration layer and the simulated backends.

use std::time::Duration;

/// Countdown tick period (remaining seconds decrement once per tick)
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// How long the white shutter-flash overlay stays up after capture starts
pub const FLASH_CLEAR_DELAY: Duration = Duration::from_millis(100);

/// Focus indicator lifetime when no newer focus request supersedes it
pub const FOCUS_EXPIRY: Duration = Duration::from_secs(3);

/// Elapsed-time ticker for video recording
pub const RECORDING_TICK: Duration = Duration::from_secs(1);

/// Fraction of the device's positive exposure range applied in Night mode
pub const NIGHT_EXPOSURE_RATIO: f32 = 0.7;

/// Timelapse sampling bounds
pub mod timelapse {
    /// Default sampling interval
    pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
    /// Shortest sampling interval accepted; shorter requests are clamped
    pub const MIN_INTERVAL_MS: u64 = 100;
    /// Longest sampling interval accepted (one hour)
    pub const MAX_INTERVAL_MS: u64 = 3_600_000;
    /// Default output frame rate handed to the encoder
    pub const DEFAULT_OUTPUT_FPS: u32 = 30;
    /// Output frame rate bounds
    pub const MIN_OUTPUT_FPS: u32 = 1;
    pub const MAX_OUTPUT_FPS: u32 = 60;
}

/// Image adjustment bounds
pub mod adjustments {
    /// Filter intensity is normalized to [0, 1]
    pub const MIN_FILTER_INTENSITY: f32 = 0.0;
    pub const MAX_FILTER_INTENSITY: f32 = 1.0;
    pub const DEFAULT_FILTER_INTENSITY: f32 = 1.0;
    /// Skin smoothing levels (0 disables beautify)
    pub const MAX_BEAUTY_LEVEL: u8 = 5;
    pub const DEFAULT_BEAUTY_LEVEL: u8 = 5;
    /// Digital zoom never goes below 1x
    pub const MIN_ZOOM: f32 = 1.0;
    /// Background blur strength for portrait captures
    pub const PORTRAIT_BLUR_STRENGTH: f32 = 0.75;
}

/// Pro mode manual control bounds
pub mod pro {
    pub const MIN_ISO: u32 = 100;
    pub const MAX_ISO: u32 = 3200;
    pub const DEFAULT_ISO: u32 = 400;
    /// Shutter speed in microseconds (1/8000 s to 1 s)
    pub const MIN_SHUTTER_US: u32 = 125;
    pub const MAX_SHUTTER_US: u32 = 1_000_000;
    pub const DEFAULT_SHUTTER_US: u32 = 16_666;
    /// White balance in Kelvin
    pub const MIN_WHITE_BALANCE_K: u32 = 2_000;
    pub const MAX_WHITE_BALANCE_K: u32 = 8_000;
    pub const DEFAULT_WHITE_BALANCE_K: u32 = 5_500;
}

/// Analysis defaults
pub mod analysis {
    /// Number of luma bins in the preview histogram
    pub const HISTOGRAM_BINS: usize = 256;
    /// Sample every Nth pixel on both axes
    pub const DEFAULT_HISTOGRAM_STRIDE: u32 = 4;
    /// Gallery thumbnail longest edge
    pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 256;
}
