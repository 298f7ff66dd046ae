use crate::error::GalleryError;

/// Prompt shown alongside the biometric check.
pub const DEFAULT_REASON: &str = "Identify yourself!";

/// Platform biometric check.
///
/// Both calls may block (hardware, IPC); async callers should run them on a
/// blocking pool.
pub trait Authenticator: Send + Sync {
    /// Whether biometric authentication can be attempted at all.
    ///
    /// Returns [`GalleryError::BiometryUnavailable`] when no backend is
    /// configured or reachable.
    fn can_evaluate(&self) -> Result<(), GalleryError>;

    /// Run the check. `Ok(())` means the user was verified; a rejected
    /// attempt is [`GalleryError::AuthenticationFailed`].
    fn evaluate(&self, reason: &str) -> Result<(), GalleryError>;
}
