// SPDX-License-Identifier: GPL-3.0-only

//! Session operation handlers
//!
//! Each module adds one functional domain's operations to
//! `SessionOrchestrator`, keeping related functionality together.

pub mod capture;
pub mod dispatch;
pub mod focus;
pub mod mode;
pub mod popups;
pub mod recording;
pub mod settings;
pub mod timelapse;
