//! Cancellation broadcast for every concurrent actor.
//!
//! `Shutdown` is held by the owner; each worker, the retry scheduler and every
//! pending retry waiter hold a `ShutdownSignal`. Triggering is one-way.

use tokio::sync::watch;

#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Broadcast cancellation. Idempotent.
    pub fn trigger(&self) {
        // send_replace stores the value even with no live receivers
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been triggered (or its owner dropped).
    ///
    /// Cancel safe, so it can sit in a `select!` arm.
    pub async fn cancelled(&mut self) {
        // Err means the owner is gone, which is as good as cancelled.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}
