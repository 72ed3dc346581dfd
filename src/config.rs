// SPDX-License-Identifier: GPL-3.0-only

//! Persisted session settings

use crate::app::{FilterType, PhotoTimerSetting};
use crate::constants::{self, adjustments, analysis, timelapse};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const APP_DIR: &str = "camera-session";
const CONFIG_FILE: &str = "config.json";

/// Timelapse capture settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelapseConfig {
    /// Time between sampled frames
    pub interval_ms: u64,
    /// Frame rate of the encoded video
    pub output_fps: u32,
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            interval_ms: timelapse::DEFAULT_INTERVAL_MS,
            output_fps: timelapse::DEFAULT_OUTPUT_FPS,
        }
    }
}

impl TimelapseConfig {
    pub fn new(interval_ms: u64, output_fps: u32) -> Self {
        Self {
            interval_ms,
            output_fps,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            interval_ms: self
                .interval_ms
                .clamp(timelapse::MIN_INTERVAL_MS, timelapse::MAX_INTERVAL_MS),
            output_fps: self
                .output_fps
                .clamp(timelapse::MIN_OUTPUT_FPS, timelapse::MAX_OUTPUT_FPS),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Self-timer used by take-photo
    pub photo_timer: PhotoTimerSetting,
    /// How long a focus indicator stays up
    pub focus_expiry_ms: u64,
    /// How long the shutter flash overlay stays up
    pub flash_clear_ms: u64,
    /// Length of one countdown step
    pub countdown_tick_ms: u64,
    /// Fraction of the positive exposure range used by Night mode
    pub night_exposure_ratio: f32,
    pub histogram_enabled: bool,
    /// Sample every Nth pixel on both axes
    pub histogram_stride: u32,
    pub thumbnail_max_dimension: u32,
    pub filter: FilterType,
    pub filter_intensity: f32,
    pub beauty_level: u8,
    pub timelapse: TimelapseConfig,
    /// Mirror front camera captures like the preview
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photo_timer: PhotoTimerSetting::Off,
            focus_expiry_ms: constants::FOCUS_EXPIRY.as_millis() as u64,
            flash_clear_ms: constants::FLASH_CLEAR_DELAY.as_millis() as u64,
            countdown_tick_ms: constants::COUNTDOWN_TICK.as_millis() as u64,
            night_exposure_ratio: constants::NIGHT_EXPOSURE_RATIO,
            histogram_enabled: false,
            histogram_stride: analysis::DEFAULT_HISTOGRAM_STRIDE,
            thumbnail_max_dimension: analysis::DEFAULT_THUMBNAIL_MAX_DIMENSION,
            filter: FilterType::Original,
            filter_intensity: adjustments::DEFAULT_FILTER_INTENSITY,
            beauty_level: adjustments::DEFAULT_BEAUTY_LEVEL,
            timelapse: TimelapseConfig::default(),
            mirror_preview: true,
        }
    }
}

impl Config {
    /// `<config dir>/camera-session/config.json`
    pub fn path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let loaded = Self::path().and_then(|path| {
            if path.exists() {
                Self::load_from(&path)
            } else {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
        });
        match loaded {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config.validated())
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Copy with every field pulled into its valid range
    pub fn validated(mut self) -> Self {
        self.focus_expiry_ms = self.focus_expiry_ms.max(1);
        self.flash_clear_ms = self.flash_clear_ms.max(1);
        self.countdown_tick_ms = self.countdown_tick_ms.max(1);
        self.night_exposure_ratio = if self.night_exposure_ratio.is_finite() {
            self.night_exposure_ratio.clamp(0.0, 1.0)
        } else {
            constants::NIGHT_EXPOSURE_RATIO
        };
        self.histogram_stride = self.histogram_stride.max(1);
        self.thumbnail_max_dimension = self.thumbnail_max_dimension.max(1);
        self.filter_intensity = if self.filter_intensity.is_finite() {
            self.filter_intensity.clamp(
                adjustments::MIN_FILTER_INTENSITY,
                adjustments::MAX_FILTER_INTENSITY,
            )
        } else {
            adjustments::DEFAULT_FILTER_INTENSITY
        };
        self.beauty_level = self.beauty_level.min(adjustments::MAX_BEAUTY_LEVEL);
        self.timelapse = self.timelapse.clamped();
        self
    }

    pub fn focus_expiry(&self) -> Duration {
        Duration::from_millis(self.focus_expiry_ms)
    }

    pub fn flash_clear_delay(&self) -> Duration {
        Duration::from_millis(self.flash_clear_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}
