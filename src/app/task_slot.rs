// SPDX-License-Identifier: GPL-3.0-only

//! Single-owner background task handles
//!
//! Each kind of delayed or long-running work (countdown, focus expiry,
//! timelapse sampler, ...) lives in its own [`TaskSlot`]. Starting a new task
//! in a slot cancels the one already there, so at most one task per kind is
//! ever running. Tasks are children of the session's root token and stop when
//! the session shuts down.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct TaskSlot {
    name: &'static str,
    running: Mutex<Option<Running>>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel whatever runs in this slot and start `make(token)` in its place.
    ///
    /// The future is raced against its token, so cancellation takes effect
    /// at the next await point even if the future never checks the token.
    pub fn replace<F, Fut>(&self, runtime: &Handle, parent: &CancellationToken, make: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.lock();
        if let Some(previous) = running.take() {
            debug!(slot = self.name, "Cancelling previous task");
            previous.token.cancel();
        }
        if parent.is_cancelled() {
            return;
        }

        let token = parent.child_token();
        let future = make(token.clone());
        let guard = token.clone();
        let handle = runtime.spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = future => {}
            }
        });
        *running = Some(Running { token, handle });
    }

    /// Cancel the running task; returns whether one was still running
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(previous) => {
                let was_running = !previous.handle.is_finished();
                previous.token.cancel();
                if was_running {
                    debug!(slot = self.name, "Task cancelled");
                }
                was_running
            }
            None => false,
        }
    }

    /// A task was started and has neither finished nor been cancelled
    pub fn is_active(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|r| !r.token.is_cancelled() && !r.handle.is_finished())
    }
}
