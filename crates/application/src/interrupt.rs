//! External interruption of long-running operations
//!
//! Long-running operations poll or await an [`InterruptSignal`] and run
//! their declared exit path (restore, commit or rollback) before returning.

use tokio::sync::watch;

/// Receiving side of an interruption request
#[derive(Debug, Clone)]
pub struct InterruptSignal {
    receiver: watch::Receiver<bool>,
}

/// Sending side of an interruption request
#[derive(Debug)]
pub struct InterruptHandle {
    sender: watch::Sender<bool>,
}

impl InterruptSignal {
    /// Create a connected handle/signal pair
    #[must_use]
    pub fn new() -> (InterruptHandle, Self) {
        let (sender, receiver) = watch::channel(false);
        (InterruptHandle { sender }, Self { receiver })
    }

    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        let (_handle, signal) = Self::new();
        signal
    }

    /// Whether an interruption has been requested
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once an interruption has been requested
    ///
    /// Never resolves if the handle was dropped without interrupting.
    pub async fn interrupted(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|interrupted| *interrupted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl InterruptHandle {
    /// Request interruption
    pub fn interrupt(&self) {
        self.sender.send_replace(true);
    }

    /// Another signal connected to this handle
    #[must_use]
    pub fn signal(&self) -> InterruptSignal {
        InterruptSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Sleep for `duration`, returning `true` if interrupted first
pub(crate) async fn sleep_or_interrupt(
    duration: std::time::Duration,
    signal: &InterruptSignal,
) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        () = signal.interrupted() => true,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_uninterrupted() {
        let (_handle, signal) = InterruptSignal::new();
        assert!(!signal.is_interrupted());
    }

    #[test]
    fn interrupt_is_visible_to_all_signals() {
        let (handle, signal) = InterruptSignal::new();
        let other = handle.signal();
        handle.interrupt();
        assert!(signal.is_interrupted());
        assert!(other.is_interrupted());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_interrupt() {
        let signal = InterruptSignal::never();
        assert!(!sleep_or_interrupt(Duration::from_secs(5), &signal).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_cut_short_by_interrupt() {
        let (handle, signal) = InterruptSignal::new();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.interrupt();
        });
        let start = tokio::time::Instant::now();
        assert!(sleep_or_interrupt(Duration::from_secs(60), &signal).await);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn already_interrupted_resolves_immediately() {
        let (handle, signal) = InterruptSignal::new();
        handle.interrupt();
        signal.interrupted().await;
    }
}
