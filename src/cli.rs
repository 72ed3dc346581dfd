// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running a scripted session against the simulated backends
//! - Showing the effective configuration

use camera_session::app::{PhotoTimerSetting, SessionState, TimelapseState};
use camera_session::backends::simulated::{SimulatedRig, synthetic_frames};
use camera_session::config::TimelapseConfig;
use camera_session::{CameraMode, Config, SessionEvent, SessionOrchestrator};
use chrono::Local;
use std::time::Duration;
use tokio::sync::watch;

/// Longest the demo waits for any single step
const STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval used for the demo timelapse so it finishes quickly
const DEMO_TIMELAPSE_INTERVAL_MS: u64 = 200;

/// Run a scripted session: optional countdown, one photo, optional timelapse
pub fn run_demo(
    timer: u32,
    timelapse_frames: u32,
    mode: CameraMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let photo_timer = match timer {
        0 => PhotoTimerSetting::Off,
        3 => PhotoTimerSetting::Seconds3,
        10 => PhotoTimerSetting::Seconds10,
        other => return Err(format!("unsupported timer {}s (use 0, 3 or 10)", other).into()),
    };

    let config = Config {
        photo_timer,
        ..Config::load()
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let rig = SimulatedRig::new();
        let (session, mut events) = SessionOrchestrator::new(config, rig.backends())?;
        println!("Session {}", session.session_id());

        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        });

        session.attach_frame_source(synthetic_frames(320, 240, 30, None));
        let mut state = session.subscribe();

        // Let a few frames arrive so there is something to capture
        while session.frames_received() < 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        if mode != CameraMode::Photo {
            println!("Switching to {} mode", mode);
            session.select_mode(mode).await;
        }

        println!("Taking photo...");
        let (start_generation, start_error) = {
            let current = state.borrow_and_update();
            (current.thumbnail_generation, current.last_error.clone())
        };
        session.take_photo();
        let mut last_countdown = None;
        wait_until(&mut state, |s| {
            if s.countdown != last_countdown {
                if let Some(seconds) = s.countdown {
                    println!("  {}...", seconds);
                }
                last_countdown = s.countdown;
            }
            let finished =
                s.thumbnail_generation > start_generation || s.last_error != start_error;
            finished && !s.is_capturing && s.countdown.is_none()
        })
        .await?;

        if timelapse_frames > 0 {
            println!("Recording timelapse of {} frames...", timelapse_frames);
            session.select_mode(CameraMode::Timelapse).await;
            let timelapse = TimelapseConfig::new(
                DEMO_TIMELAPSE_INTERVAL_MS,
                session.config().timelapse.output_fps,
            );
            if !session.start_timelapse(timelapse) {
                return Err("timelapse did not start".into());
            }
            wait_until(&mut state, |s| {
                s.timelapse.frames_captured >= timelapse_frames
            })
            .await?;
            session.stop_timelapse();
            println!("Encoding...");
            wait_until(&mut state, |s| s.timelapse.state == TimelapseState::Idle).await?;
        }

        println!("Frames received: {}", session.frames_received());
        session.shutdown();
        drop(session);
        // Give the printer a moment to drain anything still queued
        let _ = tokio::time::timeout(Duration::from_millis(100), printer).await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

/// Print the configuration file path and the effective values
pub fn show_config() -> Result<(), Box<dyn std::error::Error>> {
    match Config::path() {
        Ok(path) => {
            let status = if path.exists() { "" } else { " (not created yet)" };
            println!("Config file: {}{}", path.display(), status);
        }
        Err(err) => println!("Config file: unavailable ({})", err),
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&Config::load())?);
    Ok(())
}

fn print_event(event: &SessionEvent) {
    let now = Local::now().format("%H:%M:%S%.3f");
    match event {
        SessionEvent::PhotoCaptured(uri) => println!("[{}] Photo saved: {}", now, uri),
        SessionEvent::VideoRecorded(path) => println!("[{}] Video saved: {}", now, path),
        SessionEvent::CameraSwitched => println!("[{}] Camera switched", now),
        SessionEvent::Error(message) => println!("[{}] Error: {}", now, message),
    }
}

async fn wait_until(
    state: &mut watch::Receiver<SessionState>,
    mut done: impl FnMut(&SessionState) -> bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::time::timeout(STEP_TIMEOUT, async {
        loop {
            if done(&state.borrow_and_update()) {
                return Ok(());
            }
            if state.changed().await.is_err() {
                return Err("session closed");
            }
        }
    })
    .await
    .map_err(|_| "timed out waiting for the session")??;
    Ok(())
}
