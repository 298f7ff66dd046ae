//! Biometric backend: the Visage face-authentication daemon on the system bus.

use std::time::Duration;

use rollcall_core::{Authenticator, GalleryError};

// `#[zbus::proxy]` generates both `VisageProxy` (async) and
// `VisageProxyBlocking`. Checks run on the blocking pool, so only the
// blocking variant is used.
#[zbus::proxy(
    interface = "org.freedesktop.Visage1",
    default_service = "org.freedesktop.Visage1",
    default_path = "/org/freedesktop/Visage1"
)]
trait Visage {
    async fn verify(&self, user: &str) -> zbus::Result<bool>;
    async fn status(&self) -> zbus::Result<String>;
}

/// Verifies the configured user's face through `visaged`.
pub struct VisageAuthenticator {
    user: String,
    timeout: Duration,
}

impl VisageAuthenticator {
    pub fn new(user: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user: user.into(),
            timeout,
        }
    }

    fn proxy(&self) -> zbus::Result<VisageProxyBlocking<'static>> {
        let conn = zbus::blocking::connection::Builder::system()?
            .method_timeout(self.timeout)
            .build()?;
        VisageProxyBlocking::new(&conn)
    }
}

impl Authenticator for VisageAuthenticator {
    fn can_evaluate(&self) -> Result<(), GalleryError> {
        let proxy = self
            .proxy()
            .map_err(|e| GalleryError::BiometryUnavailable(format!("system bus: {e}")))?;
        let status = proxy
            .status()
            .map_err(|e| GalleryError::BiometryUnavailable(format!("visaged: {e}")))?;
        tracing::debug!(status = %status, "visaged reachable");
        Ok(())
    }

    fn evaluate(&self, reason: &str) -> Result<(), GalleryError> {
        tracing::info!(user = %self.user, reason, "requesting face verification");
        let proxy = self
            .proxy()
            .map_err(|e| GalleryError::BiometryUnavailable(format!("system bus: {e}")))?;
        match proxy.verify(&self.user) {
            Ok(true) => Ok(()),
            Ok(false) => Err(GalleryError::AuthenticationFailed(None)),
            Err(e) => Err(GalleryError::AuthenticationFailed(Some(e.to_string()))),
        }
    }
}
