use image::RgbImage;
use rollcall_hw::{Camera, CameraError, FrameError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("camera thread exited")]
    ChannelClosed,
}

impl EngineError {
    /// Whether the failure means there is no usable camera at all, as
    /// opposed to a capture that went wrong on a working device.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Camera(
                CameraError::DeviceNotFound(_)
                    | CameraError::DeviceBusy
                    | CameraError::StreamingNotSupported
                    | CameraError::FormatNegotiationFailed(_)
            )
        )
    }
}

/// Messages sent from D-Bus handlers to the camera thread.
enum EngineRequest {
    Capture {
        reply: oneshot::Sender<Result<RgbImage, EngineError>>,
    },
}

/// Clone-safe handle to the camera thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Take one photo with the configured camera.
    pub async fn capture(&self) -> Result<RgbImage, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Capture { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the camera thread.
///
/// The device is opened per request and released afterwards, so a camera
/// plugged in after startup is picked up and other applications can use it
/// in between.
pub fn spawn_engine(
    camera_device: String,
    warmup_frames: usize,
    capture_attempts: usize,
) -> std::io::Result<EngineHandle> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("rollcall-camera".into())
        .spawn(move || {
            tracing::info!(device = %camera_device, "camera thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Capture { reply } => {
                        let result = run_capture(&camera_device, warmup_frames, capture_attempts);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("camera thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

fn run_capture(
    device: &str,
    warmup_frames: usize,
    capture_attempts: usize,
) -> Result<RgbImage, EngineError> {
    let camera = Camera::open(device)?;
    let frame = camera.capture_rgb(warmup_frames, capture_attempts)?;
    tracing::info!(
        device,
        width = frame.width,
        height = frame.height,
        seq = frame.sequence,
        "captured photo"
    );
    Ok(frame.into_image()?)
}
