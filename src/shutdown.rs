//! Operator-initiated cancellation shared by the scheduler and the retry loop

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

/// Sending half; flips the flag once.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Receivers may all be gone already; nothing left to notify then.
        let _ = self.tx.send(true);
    }
}

/// Receiving half handed to anything that waits.
///
/// Only waits are interrupted. Requests already on the wire run to
/// completion, so a booking is either fully submitted or never started.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A receiver that never fires, for one-off runs and tests.
    pub fn never() -> Shutdown {
        let (_, rx) = watch::channel(false);
        Shutdown { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleeps for `duration` unless shutdown is triggered first.
    ///
    /// Returns `true` if the wait was cut short by shutdown.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }

        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return false,
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        // Sender dropped: nobody can trigger anymore.
                        sleep_until(deadline).await;
                        return false;
                    }
                    if *self.rx.borrow() {
                        return true;
                    }
                }
            }
        }
    }
}

/// Spawns a task that triggers shutdown on Ctrl-C.
pub fn listen_for_ctrl_c(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, finishing the current request and stopping");
                trigger.trigger();
            }
            Err(e) => warn!("Could not listen for Ctrl-C: {e}"),
        }
    });
}
