//! Shutdown coordination for the gateway.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Holds two latches: the trigger (stop accepting, start draining) and the
/// completion signal (the server has stopped). Both stay set once set, so a
/// task that subscribes late still observes them.
#[derive(Debug)]
pub struct Shutdown {
    /// Trigger latch.
    trigger: watch::Sender<bool>,
    /// Completion latch.
    complete: watch::Sender<bool>,
}

/// A subscription to the shutdown trigger.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered.
    pub async fn recv(&mut self) {
        // Err only if the coordinator is gone, which also means shut down.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (trigger, _) = watch::channel(false);
        let (complete, _) = watch::channel(false);
        Self { trigger, complete }
    }

    /// Subscribe to the shutdown trigger.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.trigger.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.trigger.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.trigger.borrow()
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.trigger.receiver_count()
    }

    /// Raise the shutdown-complete signal. Returns `true` only for the call
    /// that actually raised it.
    pub fn mark_complete(&self) -> bool {
        self.complete.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        })
    }

    pub fn is_complete(&self) -> bool {
        *self.complete.borrow()
    }

    /// Resolve once the shutdown-complete signal has been raised.
    pub async fn wait_complete(&self) {
        let mut rx = self.complete.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
