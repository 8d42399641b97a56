//! Process-wide readiness signal.
//!
//! Set once by the gateway listener after its identity handshake, or
//! force-set on terminal connection failure so waiters never deadlock.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct Readiness {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Readiness {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Latch the signal. Idempotent; never unset.
    pub fn set(&self) {
        let _ = self.tx.send(true);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal is set. Returns immediately if already set.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}
