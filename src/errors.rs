// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera session
//!
//! Collaborator failures are typed here so the orchestrator can log them with
//! context before turning them into one-shot `Error` events. None of these
//! ever terminate a session.

use thiserror::Error;

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

/// Main session error type
#[derive(Debug, Error)]
pub enum SessionError {
    /// Camera parameter layer errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Timelapse / media encoder errors
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
    /// Portrait blur engine errors
    #[error("Portrait blur error: {0}")]
    Blur(#[from] BlurError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The orchestrator was created outside of a tokio runtime
    #[error("No tokio runtime available to drive the session")]
    NoRuntime,
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    /// The device refused a parameter change
    #[error("{control} rejected: {reason}")]
    ParameterRejected {
        control: &'static str,
        reason: String,
    },
    /// Still capture failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// Video recording could not be started or finalized
    #[error("Recording failed: {0}")]
    RecordingFailed(String),
}

/// Media encoder errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// Nothing was sampled before stop
    #[error("No frames to encode")]
    NoFrames,
    /// Encoder failed
    #[error("Encoding failed: {0}")]
    Failed(String),
}

/// Portrait blur engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlurError {
    /// Processing failed
    #[error("Processing failed: {0}")]
    Failed(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No per-user config directory on this platform
    #[error("No configuration directory available")]
    NoConfigDir,
    /// Reading or writing the config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for this version
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
