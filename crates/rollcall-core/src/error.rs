use thiserror::Error;

/// A failed user action.
///
/// Every variant is shown to the user as an alert: [`title`](Self::title)
/// is the heading, `Display` is the body.
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Unlock first")]
    Locked,
    #[error("No person at position {0}")]
    NoSuchPerson(usize),
    #[error("Camera not found.")]
    CameraUnavailable(String),
    #[error("Your device is not configured for biometric authentication.")]
    BiometryUnavailable(String),
    #[error("You could not be verified, please try again")]
    AuthenticationFailed(Option<String>),
    #[error("An unlock prompt is already open")]
    UnlockInProgress,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl GalleryError {
    /// Alert heading for this failure.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Locked => "Not allowed",
            Self::NoSuchPerson(_) => "Not found",
            Self::CameraUnavailable(_) => "Camera",
            Self::BiometryUnavailable(_) => "Biometry unavailable",
            Self::AuthenticationFailed(_) => "Authentication failed",
            Self::UnlockInProgress => "Busy",
            Self::Image(_) => "Image",
            Self::Io(_) => "Storage",
        }
    }

    /// `"<title>: <message>"`, the form sent over the bus.
    pub fn alert(&self) -> String {
        format!("{}: {self}", self.title())
    }
}
