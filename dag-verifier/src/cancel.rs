//! Run cancellation
//!
//! A [`CancelSignal`] fires when its handle is triggered or when the run
//! deadline passes, whichever comes first. Clones observe the same signal.

use tokio::sync::watch;
use tokio::time::Instant;

/// Triggers cancellation for every clone of the paired signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Run-scoped cancellation observed by walks and fetches
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Create a connected handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelSignal {
            rx: Some(rx),
            deadline: None,
        },
    )
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        Self::default()
    }

    /// Also fire once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the signal fires
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let triggered = async move {
            if let Some(rx) = rx.as_mut() {
                if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                    return;
                }
            }
            // handle dropped without cancelling
            std::future::pending::<()>().await
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = triggered => {}
            _ = expired => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handle_cancels_all_clones() {
        let (handle, signal) = cancel_pair();
        let other = signal.clone();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn(async move { other.cancelled().await });
        handle.cancel();
        waiter.await.unwrap();

        assert!(signal.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let start = Instant::now();
        let signal = CancelSignal::never().with_deadline(start + Duration::from_secs(3));

        assert!(!signal.is_cancelled());
        signal.cancelled().await;
        assert!(Instant::now() - start >= Duration::from_secs(3));
        assert!(signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earliest_deadline_wins() {
        let start = Instant::now();
        let signal = CancelSignal::never()
            .with_deadline(start + Duration::from_secs(10))
            .with_deadline(start + Duration::from_secs(2));
        assert_eq!(signal.deadline(), Some(start + Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_fire() {
        let signal = CancelSignal::never();
        let fired = tokio::time::timeout(Duration::from_secs(60), signal.cancelled()).await;
        assert!(fired.is_err());
    }
}
