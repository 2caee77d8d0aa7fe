//! Continue gate: a per-step delay before the user may act.
//!
//! Every step change re-arms the gate: it closes immediately and a one-shot
//! timer reopens it after the configured delay. Re-arming cancels the
//! previous timer, and the reopen check happens under the same lock as the
//! cancel, so a timer belonging to a step the user already left can never
//! open the gate for the new step.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Reference delay between entering a step and being allowed to continue.
pub const DEFAULT_GATE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug)]
struct GateInner {
    delay: Duration,
    timer: Mutex<Option<CancellationToken>>,
    open: watch::Sender<bool>,
}

/// Cancelable timer handle owned by the sequencer.
///
/// Arming spawns onto the current Tokio runtime, so [`ContinueGate::rearm`]
/// must be called from within one.
#[derive(Debug)]
pub struct ContinueGate {
    inner: Arc<GateInner>,
}

impl ContinueGate {
    /// Create a closed, unarmed gate.
    pub fn new(delay: Duration) -> Self {
        let (open, _) = watch::channel(false);
        Self {
            inner: Arc::new(GateInner {
                delay,
                timer: Mutex::new(None),
                open,
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        *self.inner.open.borrow()
    }

    /// Close the gate and start a fresh timer, superseding any pending one.
    pub fn rearm(&self) {
        let token = CancellationToken::new();
        {
            let mut timer = lock(&self.inner.timer);
            if let Some(previous) = timer.replace(token.clone()) {
                previous.cancel();
            }
            self.inner.open.send_replace(false);
        }

        // Deadline is fixed now, not when the task is first polled.
        let deadline = tokio::time::Instant::now() + self.inner.delay;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    let _timer = lock(&inner.timer);
                    if !token.is_cancelled() {
                        inner.open.send_replace(true);
                    }
                }
            }
        });
    }

    /// Cancel the pending timer, if any, leaving the gate as it is.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.inner.timer).take() {
            token.cancel();
        }
    }

    /// Resolve once the gate is open.
    pub async fn wait_open(&self) {
        let mut rx = self.inner.open.subscribe();
        // The sender lives as long as `self`, so this cannot fail while borrowed.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Drop for ContinueGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
