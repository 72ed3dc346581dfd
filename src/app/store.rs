// SPDX-License-Identifier: GPL-3.0-only

//! Serialized access to [`SessionState`]
//!
//! All writers go through one `watch` channel. `send_modify` and
//! `send_if_modified` hold the channel lock for the whole closure, so each
//! transition is atomic with respect to every other task and observers only
//! ever see complete states.
//!
//! Closing the store applies one last update and turns every later write
//! into a no-op, so late tasks cannot resurrect a shut down session.

use super::state::SessionState;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

pub struct SessionStore {
    tx: watch::Sender<SessionState>,
    /// Only read or written under the channel lock
    closed: AtomicBool,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Read a projection without cloning the whole state
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Apply a transition; observers are notified only when it returns true
    pub fn apply(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.tx
            .send_if_modified(|state| !self.is_closed() && f(state))
    }

    /// Apply an unconditional update and notify observers
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_if_modified(|state| {
            if self.is_closed() {
                return false;
            }
            f(state);
            true
        });
    }

    /// Apply `f` as the final update; every later write is ignored
    pub fn close(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_if_modified(|state| {
            if self.closed.swap(true, Ordering::Relaxed) {
                return false;
            }
            f(state);
            true
        });
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
