// SPDX-License-Identifier: GPL-3.0-only

//! Camera session orchestrator
//!
//! The coordination core of a live camera application: the current mode,
//! frame-derived analyses, capture workflows, timelapse and overlays, all
//! serialized into one observable session state.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The session orchestrator, its state and operation handlers
//! - [`backends`]: Collaborator traits (camera, detectors, blur, encoder) and
//!   simulated implementations
//! - [`config`]: Persisted session settings
//! - [`constants`]: Timing defaults and validation bounds
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use camera_session::backends::simulated::{SimulatedRig, synthetic_frames};
//! use camera_session::{Config, SessionOrchestrator};
//!
//! # async fn run() -> camera_session::errors::SessionResult<()> {
//! let rig = SimulatedRig::new();
//! let (session, mut events) = SessionOrchestrator::new(Config::default(), rig.backends())?;
//! session.attach_frame_source(synthetic_frames(640, 480, 30, None));
//! session.take_photo();
//! if let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! session.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use app::{CameraMode, SessionEvent, SessionOrchestrator, SessionState};
pub use config::Config;
