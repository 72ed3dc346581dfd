// SPDX-License-Identifier: GPL-3.0-only

//! Shared harness for session integration tests

#![allow(dead_code)]

use camera_session::backends::simulated::{SimulatedCamera, SimulatedRig, synthetic_frame};
use camera_session::backends::types::FramePair;
use camera_session::{Config, SessionEvent, SessionOrchestrator, SessionState};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Longest any test waits for a state change
const WAIT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Harness {
    pub rig: SimulatedRig,
    pub session: SessionOrchestrator,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub state: watch::Receiver<SessionState>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_rig(config, SimulatedRig::new())
    }

    pub fn with_camera(camera: SimulatedCamera) -> Self {
        Self::with_rig(Config::default(), SimulatedRig::with_camera(camera))
    }

    pub fn with_rig(config: Config, rig: SimulatedRig) -> Self {
        let (session, events) =
            SessionOrchestrator::new(config, rig.backends()).expect("session should start");
        let state = session.subscribe();
        Self {
            rig,
            session,
            events,
            state,
        }
    }

    /// Deliver one synthetic frame pair
    pub fn feed_frame(&self, sequence: u64) {
        self.session
            .on_frame(FramePair::unfiltered(synthetic_frame(16, 12, sequence)));
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.state()
    }

    /// Wait until `done` holds for the session state
    pub async fn wait_for(&mut self, mut done: impl FnMut(&SessionState) -> bool) -> SessionState {
        let state = &mut self.state;
        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                {
                    let current = state.borrow_and_update();
                    if done(&current) {
                        return current.clone();
                    }
                }
                state.changed().await.expect("session state closed");
            }
        })
        .await
        .expect("timed out waiting for session state")
    }

    /// Every event emitted so far
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::time::timeout(WAIT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed")
    }
}

pub async fn sleep_ms(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
