//! Single-flight biometric gate in front of `Gallery::unlock`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rollcall_core::{Authenticator, GalleryError};

pub struct Gate {
    authenticator: Arc<dyn Authenticator>,
    reason: String,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag once the check itself has finished.
///
/// Owned by the blocking closure, so a caller that stops waiting does not
/// free the slot while the prompt is still open.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Gate {
    pub fn new(authenticator: Arc<dyn Authenticator>, reason: impl Into<String>) -> Self {
        Self {
            authenticator,
            reason: reason.into(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run the biometric check. At most one check runs at a time.
    pub async fn authenticate(&self) -> Result<(), GalleryError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(GalleryError::UnlockInProgress);
        }
        let guard = InFlight(Arc::clone(&self.in_flight));

        let authenticator = Arc::clone(&self.authenticator);
        let reason = self.reason.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            authenticator.can_evaluate()?;
            authenticator.evaluate(&reason)
        })
        .await
        .map_err(|e| GalleryError::AuthenticationFailed(Some(format!("check aborted: {e}"))))?;

        match &result {
            Ok(()) => tracing::info!("biometric check passed"),
            Err(e) => tracing::warn!(error = %e, detail = ?e, "biometric check failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;

    /// Scripted authenticator for tests.
    enum FakeAuth {
        Pass,
        Reject,
        Unavailable,
        /// Passes once a message arrives on the channel.
        Blocking(Mutex<mpsc::Receiver<()>>),
    }

    impl Authenticator for FakeAuth {
        fn can_evaluate(&self) -> Result<(), GalleryError> {
            match self {
                Self::Unavailable => Err(GalleryError::BiometryUnavailable("no sensor".into())),
                _ => Ok(()),
            }
        }

        fn evaluate(&self, reason: &str) -> Result<(), GalleryError> {
            assert_eq!(reason, rollcall_core::DEFAULT_REASON);
            match self {
                Self::Pass => Ok(()),
                Self::Reject => Err(GalleryError::AuthenticationFailed(None)),
                Self::Unavailable => unreachable!("evaluate after failed can_evaluate"),
                Self::Blocking(rx) => {
                    rx.lock().unwrap().recv().unwrap();
                    Ok(())
                }
            }
        }
    }

    fn gate(auth: FakeAuth) -> Gate {
        Gate::new(Arc::new(auth), rollcall_core::DEFAULT_REASON)
    }

    #[tokio::test]
    async fn test_pass() {
        let g = gate(FakeAuth::Pass);
        g.authenticate().await.unwrap();
        assert!(!g.is_in_flight());
    }

    #[tokio::test]
    async fn test_reject() {
        let g = gate(FakeAuth::Reject);
        assert!(matches!(
            g.authenticate().await,
            Err(GalleryError::AuthenticationFailed(_))
        ));
        assert!(!g.is_in_flight());
    }

    #[tokio::test]
    async fn test_unavailable_skips_evaluate() {
        let g = gate(FakeAuth::Unavailable);
        assert!(matches!(
            g.authenticate().await,
            Err(GalleryError::BiometryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let (tx, rx) = mpsc::channel();
        let g = Arc::new(gate(FakeAuth::Blocking(Mutex::new(rx))));

        let first = tokio::spawn({
            let g = Arc::clone(&g);
            async move { g.authenticate().await }
        });
        while !g.is_in_flight() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            g.authenticate().await,
            Err(GalleryError::UnlockInProgress)
        ));

        tx.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert!(!g.is_in_flight());
    }

    #[tokio::test]
    async fn test_abandoned_wait_keeps_prompt_in_flight() {
        let (tx, rx) = mpsc::channel();
        let g = Arc::new(gate(FakeAuth::Blocking(Mutex::new(rx))));

        let first = tokio::spawn({
            let g = Arc::clone(&g);
            async move { g.authenticate().await }
        });
        while !g.is_in_flight() {
            tokio::task::yield_now().await;
        }

        // The caller goes away; the check on the blocking pool does not.
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());
        assert!(g.is_in_flight());
        assert!(matches!(
            g.authenticate().await,
            Err(GalleryError::UnlockInProgress)
        ));

        tx.send(()).unwrap();
        for _ in 0..200 {
            if !g.is_in_flight() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!g.is_in_flight());
    }
}
